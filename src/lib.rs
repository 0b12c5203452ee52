pub mod cli;
pub mod dataset;
pub mod error;
pub mod io_utils;
pub mod loader;
pub mod model;
pub mod preview;
pub mod profile;
pub mod schema;
pub mod store;
pub mod table;
pub mod version;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, ProfileArgs, SchemaArgs, ValidateArgs, VersionArgs},
    profile::{ColumnProfile, Profile, ProfileOptions},
    schema::Schema,
    store::{AllowAll, ModelStore},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("data_studio", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Profile(args) => handle_profile(&args),
        Commands::Schema(args) => handle_schema(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Version(args) => handle_version(&args),
        Commands::Validate(args) => handle_validate(&args),
    }
}

fn handle_profile(args: &ProfileArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let dataset = loader::load_dataset(
        &args.input,
        args.format.map(Into::into),
        args.delimiter,
        encoding,
    )?;

    let options = ProfileOptions {
        top_values: args.top,
        round_digits: args.round,
    };
    let profile = profile::infer_profile(&dataset, &options);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        print_profile_table(&profile);
    }
    info!(
        "Profiled {} row(s) across {} column(s) from {:?}",
        profile.row_count, profile.column_count, args.input
    );
    Ok(())
}

fn print_profile_table(profile: &Profile) {
    let headers = [
        "column",
        "type",
        "nullable",
        "missing",
        "unique",
        "min",
        "max",
        "mean",
        "complete%",
        "unique%",
        "top values",
    ]
    .map(String::from)
    .to_vec();
    let rows = profile
        .columns
        .iter()
        .map(|column| {
            vec![
                column.name.clone(),
                column.data_type.to_string(),
                column.nullable.to_string(),
                column.missing_count.to_string(),
                column.unique_values.to_string(),
                column.min.clone().unwrap_or_default(),
                column.max.clone().unwrap_or_default(),
                column.mean.map(format_metric).unwrap_or_default(),
                format!("{:.1}", column.completeness),
                format!("{:.1}", column.uniqueness),
                render_top_values(column),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
}

fn format_metric(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

fn render_top_values(column: &ColumnProfile) -> String {
    column
        .top_values
        .iter()
        .map(|tv| format!("{}({})", tv.value, tv.count))
        .collect::<Vec<_>>()
        .join(" ")
}

fn handle_schema(args: &SchemaArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let dataset = loader::load_dataset(
        &args.input,
        args.format.map(Into::into),
        args.delimiter,
        encoding,
    )?;

    let schema = Schema {
        columns: profile::infer_schema(&dataset),
    };
    schema
        .save(&args.output)
        .with_context(|| format!("Writing schema to {:?}", args.output))?;
    info!(
        "Inferred schema for {} column(s) written to {:?}",
        schema.columns.len(),
        args.output
    );
    Ok(())
}

fn handle_version(args: &VersionArgs) -> Result<()> {
    let mut store = ModelStore::load(&args.store)
        .with_context(|| format!("Loading model store from {:?}", args.store))?;
    let requester = match args.user {
        Some(user) => user,
        None => store.model(args.model)?.owner_id,
    };
    let new_id = version::clone_model_version(&mut store, args.model, requester, &AllowAll)?;
    store
        .save(&args.store)
        .with_context(|| format!("Writing model store to {:?}", args.store))?;

    let new_model = store.model(new_id)?;
    println!(
        "{new_id} {}",
        new_model.version.as_deref().unwrap_or_default()
    );
    info!(
        "Created version {:?} of model {} as {new_id}",
        new_model.version, args.model
    );
    Ok(())
}

fn handle_validate(args: &ValidateArgs) -> Result<()> {
    let store = ModelStore::load(&args.store)
        .with_context(|| format!("Loading model store from {:?}", args.store))?;
    store.validate()?;
    println!("ok: {} model(s)", store.models.len());
    info!("Validated model store {:?}", args.store);
    Ok(())
}
