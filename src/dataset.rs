//! In-memory tabular data as produced by the loaders.
//!
//! A [`Dataset`] is an ordered list of named columns, each an ordered
//! sequence of cells. A cell is either a typed scalar ([`RawValue`]) or the
//! explicit missing marker (`None`). Loaders own all format concerns; the
//! profiling engine operates on this representation only.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single scalar cell value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RawValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl RawValue {
    pub fn as_display(&self) -> String {
        match self {
            RawValue::Integer(i) => i.to_string(),
            RawValue::Float(f) => f.to_string(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Text(s) => s.clone(),
        }
    }

    /// Float NaN carries no value; profiling treats it as missing.
    pub fn is_nan(&self) -> bool {
        matches!(self, RawValue::Float(f) if f.is_nan())
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub type Cell = Option<RawValue>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataColumn {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl DataColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: Vec::new(),
        }
    }

    pub fn with_cells(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// Cells that hold an actual value: neither missing nor NaN.
    pub fn present_cells(&self) -> impl Iterator<Item = &RawValue> {
        self.cells
            .iter()
            .filter_map(|cell| cell.as_ref())
            .filter(|value| !value.is_nan())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<DataColumn>,
    /// Hex SHA-256 of the source bytes when loaded from a file; absent for
    /// datasets assembled in memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl Dataset {
    pub fn new(column_names: impl IntoIterator<Item = String>) -> Self {
        Self {
            columns: column_names.into_iter().map(DataColumn::new).collect(),
            fingerprint: None,
        }
    }

    pub fn from_columns(columns: Vec<DataColumn>) -> Self {
        Self {
            columns,
            fingerprint: None,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Row count is the longest column; ragged columns are padded with
    /// missing cells at profile time.
    pub fn row_count(&self) -> usize {
        self.columns
            .iter()
            .map(|column| column.cells.len())
            .max()
            .unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&DataColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| column.name.clone())
            .collect()
    }

    /// Appends one row, padding short rows with missing cells.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        for (idx, column) in self.columns.iter_mut().enumerate() {
            column.cells.push(row.get(idx).cloned().flatten());
        }
    }
}
