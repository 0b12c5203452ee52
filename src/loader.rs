//! Tabular loaders: turn source files into in-memory [`Dataset`]s.
//!
//! Loading is the only fallible phase of profiling. A malformed source
//! surfaces a load error and nothing else; an empty source is not an error
//! and loads as a zero-row dataset.

use std::{fmt, fs, path::Path, str::FromStr};

use anyhow::anyhow;
use encoding_rs::Encoding;
use log::debug;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::{
    dataset::{Cell, DataColumn, Dataset, RawValue},
    error::{Result, StudioError},
    io_utils,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
    Xlsx,
    Xls,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Json => "json",
            SourceFormat::Xlsx => "xlsx",
            SourceFormat::Xls => "xls",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" => Some(SourceFormat::Csv),
            "json" => Some(SourceFormat::Json),
            "xlsx" => Some(SourceFormat::Xlsx),
            "xls" => Some(SourceFormat::Xls),
            _ => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" | "tsv" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::Json),
            "xlsx" => Ok(SourceFormat::Xlsx),
            "xls" => Ok(SourceFormat::Xls),
            other => Err(anyhow!("Unknown source format '{other}'")),
        }
    }
}

/// Loads a tabular source into a dataset. `format` falls back to extension
/// detection; `delimiter` and `encoding` apply to CSV sources only.
pub fn load_dataset(
    path: &Path,
    format: Option<SourceFormat>,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<Dataset> {
    let format = match format.or_else(|| SourceFormat::from_path(path)) {
        Some(format) => format,
        None => return Err(StudioError::UnknownFormat(path.to_path_buf())),
    };
    debug!("loading {path:?} as {format}");
    match format {
        SourceFormat::Csv => load_csv(path, delimiter, encoding),
        SourceFormat::Json => load_json(path),
        SourceFormat::Xlsx | SourceFormat::Xls => {
            Err(StudioError::UnsupportedFormat(format.as_str().to_string()))
        }
    }
}

fn load_error(path: &Path, format: SourceFormat, reason: impl fmt::Display) -> StudioError {
    StudioError::Load {
        path: path.to_path_buf(),
        format: format.as_str().to_string(),
        reason: reason.to_string(),
    }
}

fn load_csv(path: &Path, delimiter: Option<u8>, encoding: &'static Encoding) -> Result<Dataset> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter, true)
        .map_err(|err| load_error(path, SourceFormat::Csv, err))?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .map_err(|err| load_error(path, SourceFormat::Csv, err))?;

    let mut dataset = Dataset::new(headers.iter().cloned());
    let mut record = csv::ByteRecord::new();
    let mut hasher = Sha256::new();
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => return Err(load_error(path, SourceFormat::Csv, err)),
        }
        hasher.update(record.as_slice());
        let mut row: Vec<Cell> = Vec::with_capacity(headers.len());
        for field in record.iter().take(headers.len()) {
            let decoded = io_utils::decode_bytes(field, encoding)
                .map_err(|err| load_error(path, SourceFormat::Csv, err))?;
            row.push(csv_cell(&decoded));
        }
        dataset.push_row(row);
    }
    dataset.fingerprint = Some(format!("{:x}", hasher.finalize()));
    Ok(dataset)
}

/// CSV fields are untyped; empty and placeholder tokens decode to missing,
/// everything else stays text for the inference pass to classify.
fn csv_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_missing_token(trimmed) {
        None
    } else {
        Some(RawValue::Text(trimmed.to_string()))
    }
}

fn is_missing_token(trimmed: &str) -> bool {
    let lowered = trimmed.to_ascii_lowercase();
    matches!(
        lowered.as_str(),
        "na" | "n/a" | "n.a." | "null" | "none" | "nan"
    ) || lowered.chars().all(|c| c == '-')
}

fn load_json(path: &Path) -> Result<Dataset> {
    let bytes =
        fs::read(path).map_err(|err| load_error(path, SourceFormat::Json, err))?;
    let parsed: JsonValue = serde_json::from_slice(&bytes)
        .map_err(|err| load_error(path, SourceFormat::Json, err))?;
    let rows = parsed
        .as_array()
        .ok_or_else(|| load_error(path, SourceFormat::Json, "expected an array of records"))?;

    // Column order is first-encountered key order across all records.
    let mut dataset = Dataset::new(std::iter::empty());
    for (row_idx, row) in rows.iter().enumerate() {
        let object = row.as_object().ok_or_else(|| {
            load_error(
                path,
                SourceFormat::Json,
                format!("record {row_idx} is not an object"),
            )
        })?;
        for (key, value) in object {
            if dataset.column(key).is_none() {
                let mut column = DataColumn::new(key.clone());
                // Backfill rows read before this key first appeared.
                column.cells.resize(row_idx, None);
                dataset.columns.push(column);
            }
            let cell = json_cell(value).map_err(|reason| {
                load_error(
                    path,
                    SourceFormat::Json,
                    format!("column '{key}', record {row_idx}: {reason}"),
                )
            })?;
            if let Some(column) = dataset.columns.iter_mut().find(|c| c.name == *key) {
                column.cells.resize(row_idx, None);
                column.cells.push(cell);
            }
        }
        // Keys absent from this record become missing cells.
        for column in &mut dataset.columns {
            column.cells.resize(row_idx + 1, None);
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    dataset.fingerprint = Some(format!("{:x}", hasher.finalize()));
    Ok(dataset)
}

fn json_cell(value: &JsonValue) -> std::result::Result<Cell, String> {
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::Bool(b) => Ok(Some(RawValue::Bool(*b))),
        JsonValue::Number(number) => {
            if let Some(i) = number.as_i64() {
                Ok(Some(RawValue::Integer(i)))
            } else if let Some(f) = number.as_f64() {
                Ok(Some(RawValue::Float(f)))
            } else {
                Err(format!("number {number} is out of range"))
            }
        }
        JsonValue::String(s) => Ok(Some(RawValue::Text(s.clone()))),
        JsonValue::Array(_) | JsonValue::Object(_) => {
            Err("nested values are not tabular".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_detection_follows_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("data.CSV")),
            Some(SourceFormat::Csv)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("data.json")),
            Some(SourceFormat::Json)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("book.xlsx")),
            Some(SourceFormat::Xlsx)
        );
        assert_eq!(SourceFormat::from_path(Path::new("data.parquet")), None);
    }

    #[test]
    fn placeholder_tokens_become_missing_cells() {
        assert_eq!(csv_cell(""), None);
        assert_eq!(csv_cell("  "), None);
        assert_eq!(csv_cell("NA"), None);
        assert_eq!(csv_cell("n/a"), None);
        assert_eq!(csv_cell("-"), None);
        assert_eq!(
            csv_cell(" 42 "),
            Some(RawValue::Text("42".to_string()))
        );
    }

    #[test]
    fn json_cells_map_scalars_and_reject_nesting() {
        assert_eq!(json_cell(&JsonValue::Null).unwrap(), None);
        assert_eq!(
            json_cell(&serde_json::json!(3)).unwrap(),
            Some(RawValue::Integer(3))
        );
        assert_eq!(
            json_cell(&serde_json::json!(2.5)).unwrap(),
            Some(RawValue::Float(2.5))
        );
        assert_eq!(
            json_cell(&serde_json::json!("x")).unwrap(),
            Some(RawValue::Text("x".to_string()))
        );
        assert!(json_cell(&serde_json::json!([1, 2])).is_err());
        assert!(json_cell(&serde_json::json!({"a": 1})).is_err());
    }
}
