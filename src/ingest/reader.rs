//! Chunk Reader: one bounded slice of rows out of an archive member.
//!
//! `start_row == 0` reads from the top and consumes the first row as the
//! header. `start_row > 0` skips the header plus `start_row` data rows and
//! reads with no header interpretation, because the header was already
//! consumed by the first chunk of the run. Delimiter inference for ambiguous
//! plain-text members is repeated per read and is deterministic, so it always
//! matches the inspector's choice for the same member.

use crate::archive::{self, dialect, ArchiveMember, Dialect, TabularFormat};
use crate::error::{Result, TabragError};
use crate::ingest::schema::CanonicalSchema;
use crate::table::{Cell, Table};

/// Read up to `max_rows` data rows starting at `start_row`.
///
/// Individual malformed lines are skipped, never fatal to the chunk. When a
/// canonical schema is given the chunk is reconciled to it (padded with
/// missing-value columns or truncated, then renamed positionally). A zero-row
/// result is the clean "no more rows" signal; a returned error is fatal to
/// the run.
pub fn read_chunk(
    zip_bytes: &[u8],
    member: &ArchiveMember,
    start_row: usize,
    max_rows: usize,
    canonical: Option<&CanonicalSchema>,
) -> Result<Table> {
    let bytes = archive::read_member_bytes(zip_bytes, &member.name)?;

    let raw_rows = match member.format {
        TabularFormat::Csv => read_delimited(&bytes, Dialect::Comma, start_row, max_rows)?,
        TabularFormat::Txt => {
            let text = String::from_utf8_lossy(&bytes);
            let first = text
                .lines()
                .find(|l| !l.trim().is_empty())
                .unwrap_or_default();
            let inferred = dialect::infer_dialect(first);
            match inferred {
                Dialect::Whitespace => read_whitespace(&text, start_row, max_rows),
                d => read_delimited(&bytes, d, start_row, max_rows)?,
            }
        }
        TabularFormat::Xlsx => {
            // Header row + skipped rows + the requested window.
            let needed = 1 + start_row + max_rows;
            let mut rows = archive::xlsx::read_rows(&bytes, needed)?;
            let keep_from = (1 + start_row).min(rows.len());
            RawChunk {
                header: rows.first().cloned(),
                data: rows.split_off(keep_from),
            }
        }
    };

    let mut table = raw_rows.into_table(start_row);

    if let Some(schema) = canonical {
        schema.reconcile(&mut table)?;
    }

    Ok(table)
}

/// Rows as read, before cell typing and reconciliation.
struct RawChunk {
    /// First physical row of the member (present even when `start_row > 0`,
    /// where it is only used to position the data window).
    header: Option<Vec<String>>,
    data: Vec<Vec<String>>,
}

impl RawChunk {
    /// Build a table: header fields become column names for a first chunk,
    /// positional placeholders otherwise. Chunk width follows its first data
    /// row; short rows pad with missing, long rows truncate.
    fn into_table(self, start_row: usize) -> Table {
        let columns: Vec<String> = if start_row == 0 {
            self.header
                .unwrap_or_default()
                .iter()
                .map(|f| f.trim().to_string())
                .collect()
        } else {
            let width = self.data.first().map(|r| r.len()).unwrap_or(0);
            (1..=width).map(|i| format!("COL_{}", i)).collect()
        };

        let mut table = Table::new(columns);
        for row in self.data {
            table.push_row(row.iter().map(|f| Cell::from_field(f)).collect());
        }
        table
    }
}

/// Read a window of records with the `csv` crate. `flexible` record reads
/// tolerate ragged rows; records that still fail to parse are skipped.
fn read_delimited(
    bytes: &[u8],
    dialect: Dialect,
    start_row: usize,
    max_rows: usize,
) -> Result<RawChunk> {
    let delimiter = dialect
        .delimiter()
        .ok_or_else(|| TabragError::Parse("whitespace dialect has no byte delimiter".to_string()))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut header: Option<Vec<String>> = None;
    let mut data: Vec<Vec<String>> = Vec::new();
    let mut skipped = 0usize;
    // Physical data-row position, counted over successfully parsed records.
    let mut position = 0usize;

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                skipped += 1;
                log::debug!("skipping malformed line: {}", e);
                continue;
            }
        };
        let fields: Vec<String> = record.iter().map(|f| f.to_string()).collect();

        if header.is_none() {
            header = Some(fields);
            continue;
        }

        if position >= start_row {
            data.push(fields);
            if data.len() >= max_rows {
                break;
            }
        }
        position += 1;
    }

    if skipped > 0 {
        log::debug!("chunk read skipped {} malformed line(s)", skipped);
    }

    Ok(RawChunk { header, data })
}

/// Whitespace-run-delimited text: split each non-blank line on whitespace.
fn read_whitespace(text: &str, start_row: usize, max_rows: usize) -> RawChunk {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .map(|l| dialect::split_line(l, Dialect::Whitespace));
    let data: Vec<Vec<String>> = lines
        .skip(start_row)
        .take(max_rows)
        .map(|l| dialect::split_line(l, Dialect::Whitespace))
        .collect();
    RawChunk { header, data }
}
