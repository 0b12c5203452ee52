mod common;

use common::{TestWorkspace, fixture_path};
use encoding_rs::UTF_8;

use data_studio::{
    error::StudioError,
    loader::{SourceFormat, load_dataset},
    profile::{ProfileOptions, infer_profile, infer_schema},
    schema::ColumnType,
};

#[test]
fn orders_fixture_profiles_every_column_type() {
    let dataset = load_dataset(&fixture_path("orders.csv"), None, None, UTF_8).expect("load");
    let profile = infer_profile(&dataset, &ProfileOptions::default());

    assert_eq!(profile.row_count, 5);
    assert_eq!(profile.column_count, 4);
    assert!(profile.fingerprint.is_some());

    let order_id = profile.column("order_id").expect("order_id");
    assert_eq!(order_id.data_type, ColumnType::Integer);
    assert!(!order_id.nullable);
    assert_eq!(order_id.unique_values, 5);
    assert_eq!(order_id.min.as_deref(), Some("1"));
    assert_eq!(order_id.max.as_deref(), Some("5"));
    assert_eq!(order_id.completeness, 100.0);
    assert_eq!(order_id.uniqueness, 100.0);

    let amount = profile.column("amount").expect("amount");
    assert_eq!(amount.data_type, ColumnType::Float);
    assert!(amount.nullable);
    assert_eq!(amount.missing_count, 1);
    assert_eq!(amount.min.as_deref(), Some("8"));
    assert_eq!(amount.max.as_deref(), Some("23.75"));
    let mean = amount.mean.expect("mean");
    assert!((mean - 14.8125).abs() < 1e-9);
    assert_eq!(amount.completeness, 80.0);

    let ordered_at = profile.column("ordered_at").expect("ordered_at");
    assert_eq!(ordered_at.data_type, ColumnType::Timestamp);
    assert!(ordered_at.nullable);
    assert_eq!(ordered_at.min.as_deref(), Some("2024-01-05T10:30:00"));
    assert_eq!(ordered_at.max.as_deref(), Some("2024-01-07T09:45:00"));
    assert_eq!(ordered_at.mean, None);

    let status = profile.column("status").expect("status");
    assert_eq!(status.data_type, ColumnType::Varchar);
    assert_eq!(status.unique_values, 3);
    assert_eq!(status.min, None);
    assert_eq!(status.mean, None);
    let top: Vec<(&str, u64)> = status
        .top_values
        .iter()
        .map(|tv| (tv.value.as_str(), tv.count))
        .collect();
    assert_eq!(top, vec![("shipped", 3), ("pending", 1), ("processing", 1)]);
}

#[test]
fn profiling_is_deterministic_across_runs() {
    let dataset = load_dataset(&fixture_path("orders.csv"), None, None, UTF_8).expect("load");
    let options = ProfileOptions::default();
    let first = infer_profile(&dataset, &options);
    let second = infer_profile(&dataset, &options);
    assert_eq!(first, second);

    let first_json = serde_json::to_string(&first).expect("serialize");
    let second_json = serde_json::to_string(&second).expect("serialize");
    assert_eq!(first_json, second_json);
}

#[test]
fn json_records_union_columns_in_first_encountered_order() {
    let dataset = load_dataset(&fixture_path("players.json"), None, None, UTF_8).expect("load");
    assert_eq!(
        dataset.column_names(),
        vec!["name", "goals", "rating", "club"]
    );

    let profile = infer_profile(&dataset, &ProfileOptions::default());
    assert_eq!(profile.row_count, 3);

    let goals = profile.column("goals").expect("goals");
    assert_eq!(goals.data_type, ColumnType::Integer);
    assert!(goals.nullable);
    assert_eq!(goals.missing_count, 1);
    assert_eq!(goals.max.as_deref(), Some("10"));

    let rating = profile.column("rating").expect("rating");
    assert_eq!(rating.data_type, ColumnType::Float);
    assert!(!rating.nullable);

    // `club` only appears in the last record; earlier rows backfill missing.
    let club = profile.column("club").expect("club");
    assert_eq!(club.data_type, ColumnType::Varchar);
    assert_eq!(club.missing_count, 2);
    assert_eq!(club.unique_values, 1);
}

#[test]
fn header_only_csv_loads_as_zero_rows_with_vacuous_stats() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("empty.csv", "a,b\n");
    let dataset = load_dataset(&path, None, None, UTF_8).expect("load");
    let profile = infer_profile(&dataset, &ProfileOptions::default());

    assert_eq!(profile.row_count, 0);
    assert_eq!(profile.column_count, 2);
    for column in &profile.columns {
        assert_eq!(column.data_type, ColumnType::Varchar);
        assert!(!column.nullable);
        assert_eq!(column.completeness, 100.0);
        assert_eq!(column.uniqueness, 100.0);
        assert_eq!(column.mean, None);
    }
}

#[test]
fn ragged_csv_rows_surface_a_load_error() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("ragged.csv", "a,b\n1,2\n3\n");
    let err = load_dataset(&path, None, None, UTF_8).unwrap_err();
    assert!(matches!(err, StudioError::Load { .. }));
}

#[test]
fn malformed_json_surfaces_a_load_error() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("broken.json", "{\"not\": \"an array\"}");
    let err = load_dataset(&path, None, None, UTF_8).unwrap_err();
    assert!(matches!(err, StudioError::Load { .. }));

    let nested = workspace.write("nested.json", "[{\"a\": [1, 2]}]");
    let err = load_dataset(&nested, None, None, UTF_8).unwrap_err();
    assert!(matches!(err, StudioError::Load { .. }));
}

#[test]
fn excel_formats_are_rejected_as_unsupported() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("book.xlsx", "");
    let err = load_dataset(&path, Some(SourceFormat::Xlsx), None, UTF_8).unwrap_err();
    assert!(matches!(err, StudioError::UnsupportedFormat(_)));
}

#[test]
fn schema_records_carry_the_persisted_shape() {
    let dataset = load_dataset(&fixture_path("orders.csv"), None, None, UTF_8).expect("load");
    let records = infer_schema(&dataset);
    assert_eq!(records.len(), 4);

    let amount = records
        .iter()
        .find(|record| record.name == "amount")
        .expect("amount record");
    assert_eq!(amount.data_type, ColumnType::Float);
    assert!(amount.nullable);
    assert_eq!(amount.unique_values, 4);
    assert_eq!(amount.missing_count, 1);
    assert_eq!(amount.min_value.as_deref(), Some("8"));
    assert_eq!(amount.max_value.as_deref(), Some("23.75"));
    assert!(amount.avg_value.is_some());

    let status = records
        .iter()
        .find(|record| record.name == "status")
        .expect("status record");
    assert_eq!(status.min_value, None);
    assert_eq!(status.avg_value, None);
}
