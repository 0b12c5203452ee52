use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::loader::SourceFormat;

#[derive(Debug, Parser)]
#[command(author, version, about = "Profile datasets and manage versioned data models", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Profile a dataset: per-column types, completeness, and statistics
    Profile(ProfileArgs),
    /// Infer a dataset's column schema and write it to a schema file
    Schema(SchemaArgs),
    /// Preview the first few rows of a dataset in a formatted table
    Preview(PreviewArgs),
    /// Create a new version of a data model inside a store file
    Version(VersionArgs),
    /// Check a model store file for graph integrity violations
    Validate(ValidateArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum FormatArg {
    Csv,
    Json,
    Xlsx,
    Xls,
}

impl From<FormatArg> for SourceFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => SourceFormat::Csv,
            FormatArg::Json => SourceFormat::Json,
            FormatArg::Xlsx => SourceFormat::Xlsx,
            FormatArg::Xls => SourceFormat::Xls,
        }
    }
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Input dataset file ('-' reads CSV from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Source format (defaults to extension detection)
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Most frequent values kept per VARCHAR column
    #[arg(long, default_value_t = 5)]
    pub top: usize,
    /// Decimal digits on completeness/uniqueness percentages
    #[arg(long, default_value_t = 1)]
    pub round: u32,
    /// Emit the profile as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Input dataset file ('-' reads CSV from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination schema file path
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Source format (defaults to extension detection)
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input dataset file ('-' reads CSV from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Source format (defaults to extension detection)
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct VersionArgs {
    /// Model store file (JSON)
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
    /// Identity of the model to version
    #[arg(short = 'm', long = "model")]
    pub model: Uuid,
    /// Requesting user (defaults to the model's owner)
    #[arg(short = 'u', long = "user")]
    pub user: Option<Uuid>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Model store file (JSON)
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
