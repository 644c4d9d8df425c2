//! Column classification: heuristic semantic retyping of chunk columns.
//!
//! The strategy is pluggable so alternative heuristics can be swapped in and
//! tested independently of the orchestrator.

use std::collections::{HashMap, HashSet};

use crate::table::{Cell, ColumnClass, Table};

/// One-column classification strategy: values in, class plus cleaned values out.
pub trait ClassifyStrategy: Send + Sync {
    fn classify(&self, values: &[Cell]) -> (ColumnClass, Vec<Cell>);
}

/// Default heuristic:
///
/// 1. If at least 80% of the non-missing values coerce to numbers, the
///    column is numeric and the failures become missing values.
/// 2. Else, if the number of distinct values is below 50 and below half the
///    row count, the column is categorical (finite label domain).
/// 3. Else it stays free text.
///
/// Idempotent: an already-numeric column coerces at 100% and commits numeric
/// again with unchanged values. Never fails on empty or all-missing columns.
pub struct ThresholdClassifier {
    numeric_ratio: f64,
    max_categories: usize,
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self {
            numeric_ratio: 0.8,
            max_categories: 50,
        }
    }
}

impl ClassifyStrategy for ThresholdClassifier {
    fn classify(&self, values: &[Cell]) -> (ColumnClass, Vec<Cell>) {
        if values.is_empty() {
            return (ColumnClass::Text, Vec::new());
        }

        let coerced: Vec<Option<f64>> = values.iter().map(|c| c.as_number()).collect();
        let numeric_count = coerced.iter().filter(|n| n.is_some()).count();
        // Ratio over non-missing values only, so sparse numeric columns
        // still classify as numeric.
        let non_missing = values.iter().filter(|c| !c.is_missing()).count();

        if non_missing > 0 && numeric_count as f64 / non_missing as f64 >= self.numeric_ratio {
            let cleaned = coerced
                .into_iter()
                .map(|n| n.map(Cell::Number).unwrap_or(Cell::Missing))
                .collect();
            return (ColumnClass::Numeric, cleaned);
        }

        let mut distinct: HashSet<String> = HashSet::new();
        let mut has_missing = false;
        for cell in values {
            if cell.is_missing() {
                has_missing = true;
            } else {
                distinct.insert(cell.to_string());
            }
        }
        let distinct_total = distinct.len() + usize::from(has_missing);

        if distinct.len() < self.max_categories
            && (distinct_total as f64) < values.len() as f64 / 2.0
        {
            (ColumnClass::Categorical, values.to_vec())
        } else {
            (ColumnClass::Text, values.to_vec())
        }
    }
}

/// Classify every column of a table in place; returns the class per column name.
pub fn classify_table(
    table: &mut Table,
    strategy: &dyn ClassifyStrategy,
) -> HashMap<String, ColumnClass> {
    let mut classes = HashMap::new();
    for idx in 0..table.column_count() {
        let name = table.columns()[idx].clone();
        let (class, cleaned) = strategy.classify(&table.column(idx));
        // Lengths always match: classify returns one cell per input.
        let _ = table.set_column(idx, cleaned);
        classes.insert(name, class);
    }
    classes
}
