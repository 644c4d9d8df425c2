//! In-memory tabular data model.
//!
//! A [`Table`] is a row-major grid of [`Cell`]s with named columns. Chunks read
//! from an archive member are small `Table`s; the accumulated table for a run is
//! the same type, grown by [`Table::append`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TabragError};

/// A single table value.
///
/// Values start life as `Text` when read from a delimited file (empty fields
/// become `Missing`) and may be retyped to `Number` by column classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Parse a raw field into a cell. Empty (after trim) becomes `Missing`.
    pub fn from_field(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Cell::Missing
        } else {
            Cell::Text(raw.to_string())
        }
    }

    /// Attempt numeric coercion. `Missing` stays missing; unparseable text is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            Cell::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) => {
                // Integral floats print without the trailing ".0" so row
                // documents read naturally ("30", not "30.0").
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
        }
    }
}

/// Semantic class assigned to a column by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnClass {
    Numeric,
    Categorical,
    Text,
}

impl fmt::Display for ColumnClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnClass::Numeric => write!(f, "numeric"),
            ColumnClass::Categorical => write!(f, "categorical"),
            ColumnClass::Text => write!(f, "text"),
        }
    }
}

/// A row-major table with named columns.
///
/// Invariant: every row has exactly `columns.len()` cells. Constructors and
/// mutators uphold this; `append` refuses tables with a different column count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given column names.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Push a row, padding with `Missing` or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Missing);
        self.rows.push(row);
    }

    /// Rename all columns positionally. Count must match.
    pub fn set_columns(&mut self, names: Vec<String>) -> Result<()> {
        if names.len() != self.columns.len() {
            return Err(TabragError::InvalidInput(format!(
                "column rename length mismatch: table has {}, got {}",
                self.columns.len(),
                names.len()
            )));
        }
        self.columns = names;
        Ok(())
    }

    /// Values of one column, by index.
    pub fn column(&self, idx: usize) -> Vec<Cell> {
        self.rows.iter().map(|r| r[idx].clone()).collect()
    }

    /// Replace the values of one column. Length must equal the row count.
    pub fn set_column(&mut self, idx: usize, values: Vec<Cell>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(TabragError::InvalidInput(format!(
                "column value length mismatch: table has {} rows, got {}",
                self.rows.len(),
                values.len()
            )));
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
        Ok(())
    }

    /// Right-pad with all-missing columns, or truncate, to exactly `count` columns.
    ///
    /// Padding columns get placeholder names; callers are expected to rename
    /// them positionally right after (schema reconciliation).
    pub fn resize_columns(&mut self, count: usize) {
        let current = self.columns.len();
        if current < count {
            for i in current..count {
                self.columns.push(format!("FILL_{}", i + 1));
            }
        } else {
            self.columns.truncate(count);
        }
        for row in &mut self.rows {
            row.resize(count, Cell::Missing);
        }
    }

    /// Append all rows of `other` in order. Column counts must match; the
    /// receiving table's column names win.
    pub fn append(&mut self, other: Table) -> Result<()> {
        if other.column_count() != self.column_count() {
            return Err(TabragError::InvalidInput(format!(
                "cannot append table with {} columns to table with {}",
                other.column_count(),
                self.column_count()
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }
}
