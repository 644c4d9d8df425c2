//! Canonical schema: the column-name contract a run's first chunk establishes
//! and every later chunk is reconciled against.

use serde::{Deserialize, Serialize};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::error::Result;
use crate::table::Table;

/// Normalize a column name: trim, uppercase, then strip diacritical marks
/// (accents, cedillas) via NFD decomposition, discarding combining marks.
pub fn normalize_column_name(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// The normalized, ordered column names fixed by the first chunk of a run.
///
/// Owned by exactly one ingestion run. Later chunks are padded or truncated to
/// this column count and renamed positionally, which tolerates ragged trailing
/// rows and malformed delimiter runs without aborting the ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSchema {
    names: Vec<String>,
}

impl CanonicalSchema {
    /// Establish the schema from a run's first chunk, normalizing the chunk's
    /// own column names in place.
    pub fn establish(first_chunk: &mut Table) -> Result<Self> {
        let names: Vec<String> = first_chunk
            .columns()
            .iter()
            .map(|c| normalize_column_name(c))
            .collect();
        first_chunk.set_columns(names.clone())?;
        Ok(Self { names })
    }

    /// Rebuild the schema from already-normalized column names (resume path).
    pub fn from_columns(columns: &[String]) -> Self {
        Self {
            names: columns.to_vec(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column_count(&self) -> usize {
        self.names.len()
    }

    /// Force a chunk to this schema: right-pad with missing-value columns or
    /// truncate extras, then assign the canonical names positionally.
    pub fn reconcile(&self, chunk: &mut Table) -> Result<()> {
        chunk.resize_columns(self.names.len());
        chunk.set_columns(self.names.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_normalize_uppercases_and_trims() {
        assert_eq!(normalize_column_name("  name "), "NAME");
    }

    #[test]
    fn test_normalize_strips_accents_and_cedilla() {
        assert_eq!(normalize_column_name("preço"), "PRECO");
        assert_eq!(normalize_column_name("situação"), "SITUACAO");
        assert_eq!(normalize_column_name("année"), "ANNEE");
    }

    #[test]
    fn test_establish_normalizes_chunk_columns() {
        let mut chunk = Table::new(vec!["nome".into(), "Idade ".into()]);
        chunk.push_row(vec![text("Ana"), text("30")]);
        let schema = CanonicalSchema::establish(&mut chunk).unwrap();
        assert_eq!(schema.names(), &["NOME".to_string(), "IDADE".to_string()]);
        assert_eq!(chunk.columns(), schema.names());
    }

    #[test]
    fn test_reconcile_pads_narrow_chunk() {
        let mut first = Table::new(vec!["A".into(), "B".into(), "C".into()]);
        let schema = CanonicalSchema::establish(&mut first).unwrap();

        let mut narrow = Table::new(vec!["x".into()]);
        narrow.push_row(vec![text("1")]);
        schema.reconcile(&mut narrow).unwrap();

        assert_eq!(narrow.column_count(), 3);
        assert_eq!(narrow.columns(), schema.names());
        assert!(narrow.rows()[0][1].is_missing());
        assert!(narrow.rows()[0][2].is_missing());
    }

    #[test]
    fn test_reconcile_truncates_wide_chunk() {
        let mut first = Table::new(vec!["A".into(), "B".into()]);
        let schema = CanonicalSchema::establish(&mut first).unwrap();

        let mut wide = Table::new(vec!["x".into(), "y".into(), "z".into()]);
        wide.push_row(vec![text("1"), text("2"), text("3")]);
        schema.reconcile(&mut wide).unwrap();

        assert_eq!(wide.column_count(), 2);
        assert_eq!(wide.rows()[0], vec![text("1"), text("2")]);
    }
}
