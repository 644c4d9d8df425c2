//! Ingestion pipeline: chunked reads, classification, embedding, persistence.
//!
//! The orchestrator drives the loop and is the only mutator of the
//! accumulated table, the vector index, and the document log for a run. All
//! accumulators live in an explicit [`IngestionState`] passed through the
//! component calls; there is no ambient global state.

pub mod classify;
pub mod indexer;
pub mod reader;
pub mod schema;

pub use classify::{classify_table, ClassifyStrategy, ThresholdClassifier};
pub use indexer::{index_chunk, render_row_document};
pub use reader::read_chunk;
pub use schema::{normalize_column_name, CanonicalSchema};

use std::collections::HashMap;

use crate::archive::{self, ArchiveMember};
use crate::embeddings::Embedder;
use crate::error::{Result, TabragError};
use crate::index::VectorIndex;
use crate::store::ProgressStore;
use crate::table::{ColumnClass, Table};

/// Default rows per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Provisional total-row estimate for spreadsheet members, in chunks. No cheap
/// exact count exists for xlsx; the loop shrinks the estimate once a short
/// final chunk is read.
const XLSX_ESTIMATE_CHUNKS: usize = 50;
/// Fallback estimate, in chunks, when even line counting fails.
const FALLBACK_ESTIMATE_CHUNKS: usize = 10;

/// All accumulators for one ingestion run.
///
/// Alignment invariant: after every committed chunk,
/// `index.len() == documents.len() == table.row_count()`.
#[derive(Debug, Default)]
pub struct IngestionState {
    pub table: Option<Table>,
    pub index: Option<VectorIndex>,
    pub documents: Vec<String>,
    pub schema: Option<CanonicalSchema>,
    pub column_classes: HashMap<String, ColumnClass>,
    /// Rows committed so far; the next chunk's read offset.
    pub rows_processed: usize,
    /// Total-row estimate, corrected downward when the final chunk is short.
    pub total_rows: usize,
    /// Last reported progress, in `[0, 1]`.
    pub progress: f32,
    /// Resumability key for this (archive, member) pair.
    pub fingerprint: String,
}

/// Ingest one archive member to completion, resuming from a persisted
/// snapshot when one exists.
///
/// Runs synchronously to exhaustion or failure. On failure the last
/// successfully persisted snapshot remains valid, so re-invoking naturally
/// resumes.
pub async fn run_ingestion(
    zip_bytes: &[u8],
    member: &ArchiveMember,
    embedder: &dyn Embedder,
    classifier: &dyn ClassifyStrategy,
    store: &ProgressStore,
    chunk_size: usize,
) -> Result<IngestionState> {
    if chunk_size == 0 {
        return Err(TabragError::InvalidInput("chunk_size must be non-zero".to_string()));
    }

    let archive_hash = archive::archive_hash(zip_bytes);
    let fingerprint = ProgressStore::derive_key(&archive_hash, &member.name);

    let mut state = IngestionState {
        fingerprint: fingerprint.clone(),
        ..Default::default()
    };

    // RESUME_CHECK: restored snapshot + an independent total estimate.
    let snapshot = store.load(&fingerprint);
    let rows_loaded = snapshot.as_ref().map(|s| s.rows_processed).unwrap_or(0);
    let estimate = estimate_total_rows(zip_bytes, member, chunk_size);
    state.total_rows = estimate.max(rows_loaded);

    if let Some(snapshot) = snapshot {
        let complete = rows_loaded > 0 && rows_loaded >= state.total_rows;

        // Adopt the restored accumulators either way; on COMPLETE the chunk
        // loop is skipped entirely.
        let mut table = snapshot.table;
        state.schema = Some(CanonicalSchema::from_columns(table.columns()));
        state.column_classes = classify_table(&mut table, classifier);
        state.rows_processed = snapshot.rows_processed;
        state.table = Some(table);
        state.index = Some(snapshot.index);
        state.documents = snapshot.documents;

        if complete {
            state.total_rows = state.rows_processed;
            state.progress = 1.0;
            log::info!(
                "{}: snapshot already complete ({} rows)",
                member.name,
                state.rows_processed
            );
            return Ok(state);
        }

        // CONTINUE_PARTIAL: resume mid-file.
        log::info!(
            "{}: resuming from {} of ~{} rows",
            member.name,
            state.rows_processed,
            state.total_rows
        );
    } else {
        // FRESH_START: accumulators stay at their defaults.
        log::info!(
            "{}: starting fresh ingestion (~{} rows estimated)",
            member.name,
            state.total_rows
        );
    }

    chunk_loop(zip_bytes, member, embedder, classifier, store, chunk_size, &mut state).await?;

    // Final classification over the whole accumulated table. Per-chunk
    // classes are noisy on short chunks (a one-row tail can demote a sparse
    // numeric column); the full-table pass is authoritative.
    let (classes, row_count) = match state.table.as_mut() {
        Some(table) if !table.is_empty() => {
            (classify_table(table, classifier), table.row_count())
        }
        _ => {
            return Err(TabragError::Parse(format!(
                "member {} produced no data rows",
                member.name
            )))
        }
    };
    state.column_classes = classes;
    state.total_rows = row_count;
    state.rows_processed = row_count;
    state.progress = 1.0;
    log::info!(
        "{}: ingestion complete, {} rows loaded",
        member.name,
        state.rows_processed
    );
    Ok(state)
}

/// CHUNK_LOOP: read, classify, index, append, persist, report.
async fn chunk_loop(
    zip_bytes: &[u8],
    member: &ArchiveMember,
    embedder: &dyn Embedder,
    classifier: &dyn ClassifyStrategy,
    store: &ProgressStore,
    chunk_size: usize,
    state: &mut IngestionState,
) -> Result<()> {
    let mut offset = state.rows_processed;

    while offset < state.total_rows || offset == 0 {
        let mut chunk = read_chunk(zip_bytes, member, offset, chunk_size, state.schema.as_ref())?;
        let rows_read = chunk.row_count();

        if rows_read == 0 {
            // Clean exhaustion: fix the total at what was actually read.
            state.total_rows = offset;
            break;
        }

        if state.schema.is_none() {
            state.schema = Some(CanonicalSchema::establish(&mut chunk)?);
        }

        let classes = classify_table(&mut chunk, classifier);
        state.column_classes.extend(classes);

        index_chunk(&mut state.index, &mut state.documents, &chunk, embedder).await?;

        match &mut state.table {
            Some(table) => table.append(chunk)?,
            None => state.table = Some(chunk),
        }

        offset += rows_read;
        state.rows_processed = offset;

        // A short chunk means end-of-file; correct an over-estimate.
        if rows_read < chunk_size && offset < state.total_rows {
            state.total_rows = offset;
        }

        state.progress = if state.total_rows > 0 {
            (offset as f32 / state.total_rows as f32).min(1.0)
        } else {
            1.0
        };

        persist_snapshot(store, state);

        log::info!(
            "{}: {}/{} rows ({:.1}%)",
            member.name,
            offset,
            state.total_rows,
            state.progress * 100.0
        );

        if rows_read < chunk_size {
            state.total_rows = offset;
            break;
        }
    }

    Ok(())
}

/// Best-effort save: a failed write is logged and ingestion continues with
/// in-memory state only.
fn persist_snapshot(store: &ProgressStore, state: &IngestionState) {
    let Some(table) = &state.table else { return };
    if let Err(e) = store.save(
        &state.fingerprint,
        table,
        state.index.as_ref(),
        &state.documents,
        state.total_rows,
    ) {
        log::warn!("progress save failed (continuing in memory): {}", e);
    }
}

fn estimate_total_rows(zip_bytes: &[u8], member: &ArchiveMember, chunk_size: usize) -> usize {
    if member.format.is_line_oriented() {
        match archive::count_data_rows(zip_bytes, &member.name) {
            Ok(count) => count,
            Err(e) => {
                log::warn!("row count for {} failed ({}), using fallback estimate", member.name, e);
                chunk_size * FALLBACK_ESTIMATE_CHUNKS
            }
        }
    } else {
        chunk_size * XLSX_ESTIMATE_CHUNKS
    }
}
