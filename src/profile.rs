//! Dataset profiling: the canonical statistics pass.
//!
//! One algorithm serves both the on-demand profile view and the import
//! path's persisted column-schema records. Each column is classified once
//! via [`TypeCandidate`], then a single statistics function for that type
//! runs over the cells; values are never re-inspected per row.
//!
//! Missing-value semantics: a cell is missing when it is the explicit
//! marker or a float NaN. `missing_count + non_missing == row_count` holds
//! for every column, and completeness/uniqueness are vacuously 100 for a
//! zero-row dataset.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    dataset::{DataColumn, Dataset, RawValue},
    schema::{ColumnSchema, ColumnType, TIMESTAMP_OUTPUT_FORMAT, TypeCandidate, parse_timestamp},
};

pub const DEFAULT_TOP_VALUES: usize = 5;
pub const DEFAULT_ROUND_DIGITS: u32 = 1;

/// Knobs for the profiling pass. Callers construct one explicitly; there is
/// no ambient configuration.
#[derive(Debug, Clone)]
pub struct ProfileOptions {
    /// How many most-frequent values to keep for VARCHAR columns.
    pub top_values: usize,
    /// Decimal digits kept on completeness/uniqueness percentages.
    pub round_digits: u32,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            top_values: DEFAULT_TOP_VALUES,
            round_digits: DEFAULT_ROUND_DIGITS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopValue {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub data_type: ColumnType,
    pub nullable: bool,
    pub unique_values: u64,
    pub missing_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    pub completeness: f64,
    pub uniqueness: f64,
    /// Most frequent values, count-descending, ties in first-encountered
    /// row order. Populated for VARCHAR columns only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_values: Vec<TopValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub row_count: u64,
    pub column_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    pub columns: Vec<ColumnProfile>,
}

impl Profile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|column| column.name == name)
    }
}

pub fn infer_profile(dataset: &Dataset, options: &ProfileOptions) -> Profile {
    let row_count = dataset.row_count();
    Profile {
        row_count: row_count as u64,
        column_count: dataset.column_count() as u64,
        fingerprint: dataset.fingerprint.clone(),
        columns: dataset
            .columns
            .iter()
            .map(|column| profile_column(column, row_count, options))
            .collect(),
    }
}

/// The import path: same statistics pass, persisted record shape.
pub fn infer_schema(dataset: &Dataset) -> Vec<ColumnSchema> {
    let options = ProfileOptions::default();
    let row_count = dataset.row_count();
    dataset
        .columns
        .iter()
        .map(|column| {
            let profile = profile_column(column, row_count, &options);
            ColumnSchema {
                name: profile.name,
                data_type: profile.data_type,
                nullable: profile.nullable,
                unique_values: profile.unique_values,
                min_value: profile.min,
                max_value: profile.max,
                avg_value: profile.mean,
                missing_count: profile.missing_count,
            }
        })
        .collect()
}

pub fn profile_column(
    column: &DataColumn,
    row_count: usize,
    options: &ProfileOptions,
) -> ColumnProfile {
    let mut candidate = TypeCandidate::new();
    for value in column.present_cells() {
        candidate.observe(value);
    }
    let present = candidate.non_missing();
    let missing = row_count.saturating_sub(present);
    let data_type = candidate.decide();

    let stats = match data_type {
        ColumnType::Integer => integer_stats(column),
        ColumnType::Float => float_stats(column),
        ColumnType::Timestamp => timestamp_stats(column),
        ColumnType::Varchar => varchar_stats(column, options.top_values),
    };

    ColumnProfile {
        name: column.name.clone(),
        data_type,
        nullable: missing > 0,
        unique_values: stats.unique,
        missing_count: missing as u64,
        min: stats.min,
        max: stats.max,
        mean: stats.mean,
        completeness: percentage(present, row_count, options.round_digits),
        uniqueness: percentage(stats.unique as usize, row_count, options.round_digits),
        top_values: stats.top_values,
    }
}

struct TypedStats {
    unique: u64,
    min: Option<String>,
    max: Option<String>,
    mean: Option<f64>,
    top_values: Vec<TopValue>,
}

impl TypedStats {
    fn empty() -> Self {
        Self {
            unique: 0,
            min: None,
            max: None,
            mean: None,
            top_values: Vec::new(),
        }
    }
}

fn integer_stats(column: &DataColumn) -> TypedStats {
    let mut distinct = HashSet::new();
    let mut min: Option<i64> = None;
    let mut max: Option<i64> = None;
    let values = column
        .present_cells()
        .filter_map(cell_as_i64)
        .inspect(|value| {
            distinct.insert(*value);
            min = Some(min.map_or(*value, |current| current.min(*value)));
            max = Some(max.map_or(*value, |current| current.max(*value)));
        })
        .map(|value| value as f64);
    let mean = compensated_mean(values);
    TypedStats {
        unique: distinct.len() as u64,
        min: min.map(|value| value.to_string()),
        max: max.map(|value| value.to_string()),
        mean,
        top_values: Vec::new(),
    }
}

fn float_stats(column: &DataColumn) -> TypedStats {
    let mut distinct = HashSet::new();
    let mut min: Option<f64> = None;
    let mut max: Option<f64> = None;
    let values = column
        .present_cells()
        .filter_map(cell_as_f64)
        .inspect(|value| {
            distinct.insert(value.to_bits());
            min = Some(min.map_or(*value, |current| current.min(*value)));
            max = Some(max.map_or(*value, |current| current.max(*value)));
        });
    let mean = compensated_mean(values);
    TypedStats {
        unique: distinct.len() as u64,
        min: min.map(format_float),
        max: max.map(format_float),
        mean,
        top_values: Vec::new(),
    }
}

fn timestamp_stats(column: &DataColumn) -> TypedStats {
    let mut distinct: HashSet<NaiveDateTime> = HashSet::new();
    let mut min: Option<NaiveDateTime> = None;
    let mut max: Option<NaiveDateTime> = None;
    for value in column.present_cells().filter_map(cell_as_timestamp) {
        distinct.insert(value);
        min = Some(min.map_or(value, |current| current.min(value)));
        max = Some(max.map_or(value, |current| current.max(value)));
    }
    let render = |ts: NaiveDateTime| ts.format(TIMESTAMP_OUTPUT_FORMAT).to_string();
    TypedStats {
        unique: distinct.len() as u64,
        min: min.map(render),
        max: max.map(render),
        mean: None,
        top_values: Vec::new(),
    }
}

fn varchar_stats(column: &DataColumn, top: usize) -> TypedStats {
    if column.present_cells().next().is_none() {
        return TypedStats::empty();
    }
    // value -> (count, first row index); the index keeps tie order stable.
    let mut counts: HashMap<String, (u64, usize)> = HashMap::new();
    let mut row = 0usize;
    for value in column.present_cells() {
        let entry = counts.entry(value.as_display()).or_insert((0, row));
        entry.0 += 1;
        row += 1;
    }
    let unique = counts.len() as u64;
    let top_values = counts
        .into_iter()
        .sorted_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_b.cmp(count_a).then(first_a.cmp(first_b))
        })
        .take(top)
        .map(|(value, (count, _))| TopValue { value, count })
        .collect();
    TypedStats {
        unique,
        min: None,
        max: None,
        mean: None,
        top_values,
    }
}

fn cell_as_i64(value: &RawValue) -> Option<i64> {
    match value {
        RawValue::Integer(i) => Some(*i),
        RawValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn cell_as_f64(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Integer(i) => Some(*i as f64),
        RawValue::Float(f) => Some(*f),
        RawValue::Text(s) => s.trim().parse().ok(),
        RawValue::Bool(_) => None,
    }
}

fn cell_as_timestamp(value: &RawValue) -> Option<NaiveDateTime> {
    match value {
        RawValue::Text(s) => parse_timestamp(s),
        _ => None,
    }
}

fn format_float(value: f64) -> String {
    value.to_string()
}

/// Neumaier-compensated running sum; reproducible across platforms even
/// for large columns.
fn compensated_mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0f64;
    let mut compensation = 0.0f64;
    let mut count = 0u64;
    for value in values {
        count += 1;
        let total = sum + value;
        if sum.abs() >= value.abs() {
            compensation += (sum - total) + value;
        } else {
            compensation += (value - total) + sum;
        }
        sum = total;
    }
    (count > 0).then(|| (sum + compensation) / count as f64)
}

fn percentage(part: usize, total: usize, digits: u32) -> f64 {
    if total == 0 {
        return 100.0;
    }
    round_to(100.0 * part as f64 / total as f64, digits)
}

fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Cell;

    fn int(value: i64) -> Cell {
        Some(RawValue::Integer(value))
    }

    fn text(value: &str) -> Cell {
        Some(RawValue::Text(value.to_string()))
    }

    fn column(name: &str, cells: Vec<Cell>) -> DataColumn {
        DataColumn::with_cells(name, cells)
    }

    #[test]
    fn integer_column_with_one_missing_cell() {
        let col = column("n", vec![int(1), int(2), int(2), None]);
        let profile = profile_column(&col, 4, &ProfileOptions::default());
        assert_eq!(profile.data_type, ColumnType::Integer);
        assert!(profile.nullable);
        assert_eq!(profile.missing_count, 1);
        assert_eq!(profile.unique_values, 2);
        assert_eq!(profile.min.as_deref(), Some("1"));
        assert_eq!(profile.max.as_deref(), Some("2"));
        let mean = profile.mean.expect("numeric mean");
        assert!((mean - 5.0 / 3.0).abs() < 1e-12);
        assert_eq!(profile.completeness, 75.0);
        assert_eq!(profile.uniqueness, 50.0);
        assert!(profile.top_values.is_empty());
    }

    #[test]
    fn all_missing_column_is_varchar_with_null_stats() {
        let col = column("gap", vec![None, None, Some(RawValue::Float(f64::NAN))]);
        let profile = profile_column(&col, 3, &ProfileOptions::default());
        assert_eq!(profile.data_type, ColumnType::Varchar);
        assert!(profile.nullable);
        assert_eq!(profile.missing_count, 3);
        assert_eq!(profile.unique_values, 0);
        assert_eq!(profile.min, None);
        assert_eq!(profile.max, None);
        assert_eq!(profile.mean, None);
        assert_eq!(profile.completeness, 0.0);
        assert_eq!(profile.uniqueness, 0.0);
    }

    #[test]
    fn varchar_top_values_break_ties_by_first_occurrence() {
        let col = column(
            "s",
            vec![text("a"), text("b"), text("a"), text("c"), text("a")],
        );
        let profile = profile_column(&col, 5, &ProfileOptions::default());
        assert_eq!(profile.data_type, ColumnType::Varchar);
        assert_eq!(profile.unique_values, 3);
        let rendered: Vec<(&str, u64)> = profile
            .top_values
            .iter()
            .map(|tv| (tv.value.as_str(), tv.count))
            .collect();
        assert_eq!(rendered, vec![("a", 3), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn top_values_truncate_to_configured_cutoff() {
        let cells = ["u", "v", "w", "x", "y", "z", "z"]
            .iter()
            .map(|s| text(s))
            .collect();
        let options = ProfileOptions {
            top_values: 5,
            round_digits: 1,
        };
        let profile = profile_column(&column("s", cells), 7, &options);
        assert_eq!(profile.top_values.len(), 5);
        assert_eq!(profile.top_values[0].value, "z");
        // Remaining slots fill in first-encountered order.
        assert_eq!(profile.top_values[1].value, "u");
        assert_eq!(profile.top_values[4].value, "x");
    }

    #[test]
    fn timestamp_column_serializes_iso_extrema() {
        let col = column(
            "ts",
            vec![text("2024-05-06 14:30:00"), text("2024-05-04"), None],
        );
        let profile = profile_column(&col, 3, &ProfileOptions::default());
        assert_eq!(profile.data_type, ColumnType::Timestamp);
        assert_eq!(profile.min.as_deref(), Some("2024-05-04T00:00:00"));
        assert_eq!(profile.max.as_deref(), Some("2024-05-06T14:30:00"));
        assert_eq!(profile.mean, None);
        assert_eq!(profile.unique_values, 2);
    }

    #[test]
    fn empty_dataset_profiles_vacuously() {
        let dataset = Dataset::from_columns(vec![column("a", Vec::new())]);
        let profile = infer_profile(&dataset, &ProfileOptions::default());
        assert_eq!(profile.row_count, 0);
        assert_eq!(profile.column_count, 1);
        let col = &profile.columns[0];
        assert_eq!(col.completeness, 100.0);
        assert_eq!(col.uniqueness, 100.0);
        assert_eq!(col.data_type, ColumnType::Varchar);
        assert!(!col.nullable);
        assert_eq!(col.mean, None);
    }

    #[test]
    fn float_column_mixing_integers_keeps_float_type() {
        let col = column("f", vec![int(1), text("2.5"), None]);
        let profile = profile_column(&col, 3, &ProfileOptions::default());
        assert_eq!(profile.data_type, ColumnType::Float);
        assert_eq!(profile.min.as_deref(), Some("1"));
        assert_eq!(profile.max.as_deref(), Some("2.5"));
        let mean = profile.mean.expect("numeric mean");
        assert!((mean - 1.75).abs() < 1e-12);
    }

    #[test]
    fn schema_records_mirror_profile_statistics() {
        let dataset = Dataset::from_columns(vec![
            column("n", vec![int(1), int(2)]),
            column("s", vec![text("x"), None]),
        ]);
        let records = infer_schema(&dataset);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].data_type, ColumnType::Integer);
        assert!(!records[0].nullable);
        assert_eq!(records[0].min_value.as_deref(), Some("1"));
        assert_eq!(records[0].max_value.as_deref(), Some("2"));
        assert_eq!(records[0].avg_value, Some(1.5));
        assert_eq!(records[1].data_type, ColumnType::Varchar);
        assert!(records[1].nullable);
        assert_eq!(records[1].avg_value, None);
        assert_eq!(records[1].missing_count, 1);
    }

    #[test]
    fn compensated_mean_matches_plain_mean_on_small_inputs() {
        let mean = compensated_mean([1.0, 2.0, 3.0, 4.0].into_iter()).expect("mean");
        assert!((mean - 2.5).abs() < 1e-12);
        assert_eq!(compensated_mean(std::iter::empty()), None);
    }
}
