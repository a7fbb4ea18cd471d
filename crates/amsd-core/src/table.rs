//! Core table types for normalized records and output tables

use crate::registry::Key;
use serde::{Deserialize, Serialize};

/// One normalized row of the primary (`sticks`) table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// 1-based position of the row in the export
    pub pk: Key,
    /// One value per schema field
    pub cells: Vec<CellValue>,
}

impl Record {
    /// Create a new record
    pub fn new(pk: Key, cells: Vec<CellValue>) -> Self {
        Self { pk, cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }

    /// Output row: pk followed by every cell
    pub fn to_row(&self) -> Vec<String> {
        std::iter::once(self.pk.to_string())
            .chain(self.cells.iter().map(CellValue::to_string_value))
            .collect()
    }
}

/// A normalized cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Cleaned text stored inline
    Text(String),
    /// Decimal degrees
    Float(f64),
    /// Reference to a single lookup value
    Key(Key),
    /// References to several lookup values, in token order
    Keys(Vec<Key>),
    /// Empty/null cell
    Empty,
}

impl CellValue {
    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Lookup keys referenced by the cell
    pub fn keys(&self) -> &[Key] {
        match self {
            CellValue::Key(k) => std::slice::from_ref(k),
            CellValue::Keys(keys) => keys,
            _ => &[],
        }
    }

    /// Text of a `Text` cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to the string written to CSV
    pub fn to_string_value(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Float(fl) => write!(f, "{}", fl),
            CellValue::Key(k) => write!(f, "{}", k),
            CellValue::Keys(keys) => {
                for (i, k) in keys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    write!(f, "{}", k)?;
                }
                Ok(())
            }
            CellValue::Empty => write!(f, ""),
        }
    }
}

/// A finished table, ready to be written as `<name>.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputTable {
    /// Table name (and output file stem)
    pub name: String,
    /// Column names
    pub header: Vec<String>,
    /// Row data
    pub rows: Vec<Vec<String>>,
}

impl OutputTable {
    /// Create a new empty table
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            name: name.into(),
            header,
            rows: Vec::new(),
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column index by name
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|c| c == name)
    }

    /// All values of a column, in row order
    pub fn column(&self, name: &str) -> Vec<&str> {
        match self.find_column(name) {
            Some(idx) => self
                .rows
                .iter()
                .map(|r| r.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
            None => Vec::new(),
        }
    }
}
