//! Column types, type inference, and schema persistence.
//!
//! This module owns the [`ColumnType`] enum (the four types the studio
//! stores), the per-column inference candidate that classifies a column from
//! its raw cells, the persisted [`ColumnSchema`] record shape, and YAML
//! schema loading and saving.
//!
//! Inference is total: any column resolves to a type, with `Varchar` as the
//! terminal fallback. A column with zero non-missing cells is classified
//! `Varchar` rather than guessing a type from absence of evidence.

use std::{fmt, fs::File, io::BufReader, path::Path, str::FromStr};

use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
    dataset::RawValue,
    error::{Result, StudioError},
};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Serialization format for timestamp extrema.
pub const TIMESTAMP_OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Integer,
    Float,
    Timestamp,
    Varchar,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "FLOAT",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Varchar => "VARCHAR",
        }
    }

}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "INTEGER" | "INT" | "BIGINT" => Ok(ColumnType::Integer),
            "FLOAT" | "DOUBLE" | "REAL" => Ok(ColumnType::Float),
            "TIMESTAMP" | "DATETIME" | "DATE" => Ok(ColumnType::Timestamp),
            "VARCHAR" | "STRING" | "TEXT" => Ok(ColumnType::Varchar),
            other => Err(anyhow!("Unknown column type '{other}'")),
        }
    }
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(parsed);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Per-column classification state. One candidate observes every
/// non-missing cell of a column, then [`TypeCandidate::decide`] applies the
/// inference ladder: all-integer, else all-numeric, else all-timestamp,
/// else `Varchar`.
#[derive(Debug, Clone, Default)]
pub struct TypeCandidate {
    non_missing: usize,
    integer_matches: usize,
    float_matches: usize,
    timestamp_matches: usize,
}

impl TypeCandidate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, value: &RawValue) {
        if value.is_nan() {
            return;
        }
        self.non_missing += 1;
        match value {
            RawValue::Integer(_) => {
                self.integer_matches += 1;
                self.float_matches += 1;
            }
            RawValue::Float(_) => {
                self.float_matches += 1;
            }
            RawValue::Bool(_) => {}
            RawValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.parse::<i64>().is_ok() {
                    self.integer_matches += 1;
                    self.float_matches += 1;
                } else if trimmed.parse::<f64>().is_ok() {
                    self.float_matches += 1;
                } else if parse_timestamp(trimmed).is_some() {
                    self.timestamp_matches += 1;
                }
            }
        }
    }

    pub fn non_missing(&self) -> usize {
        self.non_missing
    }

    pub fn decide(&self) -> ColumnType {
        if self.non_missing == 0 {
            return ColumnType::Varchar;
        }
        if self.integer_matches == self.non_missing {
            ColumnType::Integer
        } else if self.float_matches == self.non_missing {
            ColumnType::Float
        } else if self.timestamp_matches == self.non_missing {
            ColumnType::Timestamp
        } else {
            ColumnType::Varchar
        }
    }
}

/// Persisted per-column record, stored alongside an imported dataset.
/// Extrema are kept as strings for cross-type uniformity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: ColumnType,
    pub nullable: bool,
    pub unique_values: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_value: Option<f64>,
    pub missing_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Schema {
    pub columns: Vec<ColumnSchema>,
}

impl Schema {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_yaml::to_writer(file, self).map_err(StudioError::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).map_err(StudioError::from)
    }
}
