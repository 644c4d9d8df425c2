//! Progress Store: resumable ingestion snapshots on disk.
//!
//! Four artifacts per fingerprint key: the accumulated table (JSON), the
//! vector index (LE-f32 blob), the document log (JSON), and a plain-text
//! row-count marker. Saves are best-effort, loads are all-or-nothing: a
//! partially-written snapshot must never be resumed from.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::error::{Result, TabragError};
use crate::index::VectorIndex;
use crate::table::Table;

/// A fully consistent restored snapshot.
#[derive(Debug)]
pub struct ProgressSnapshot {
    pub table: Table,
    pub index: VectorIndex,
    pub documents: Vec<String>,
    /// Rows already committed: the restored table's length.
    pub rows_processed: usize,
    /// Total-row estimate recorded at the last save.
    pub total_rows: usize,
}

/// File-backed store for ingestion progress, one snapshot per fingerprint.
pub struct ProgressStore {
    state_dir: PathBuf,
}

impl ProgressStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    /// Stable fingerprint for one (archive content, member name) pair.
    ///
    /// The same member in the same archive resumes; a different archive or
    /// member starts fresh.
    pub fn derive_key(archive_hash: &str, member_name: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(archive_hash.as_bytes());
        hasher.update(member_name.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// The four artifact paths for a key: table, index, documents, row marker.
    pub fn artifact_paths(&self, key: &str) -> [PathBuf; 4] {
        [
            self.state_dir.join(format!("{}_table.json", key)),
            self.state_dir.join(format!("{}_index.bin", key)),
            self.state_dir.join(format!("{}_docs.json", key)),
            self.state_dir.join(format!("{}_rows.txt", key)),
        ]
    }

    /// Persist a snapshot.
    ///
    /// Skips the table when it is empty and the index when it has no vectors,
    /// so placeholder state never poisons a later load. Callers treat a
    /// returned error as non-fatal (log and continue with in-memory state).
    pub fn save(
        &self,
        key: &str,
        table: &Table,
        index: Option<&VectorIndex>,
        documents: &[String],
        total_rows: usize,
    ) -> Result<()> {
        std::fs::create_dir_all(&self.state_dir).map_err(TabragError::Io)?;
        let [table_path, index_path, docs_path, rows_path] = self.artifact_paths(key);

        if !table.is_empty() {
            let json = serde_json::to_vec(table)
                .map_err(|e| TabragError::Parse(format!("table serialization: {}", e)))?;
            std::fs::write(&table_path, json).map_err(TabragError::Io)?;
        }

        if let Some(index) = index {
            if !index.is_empty() {
                std::fs::write(&index_path, index.to_bytes()).map_err(TabragError::Io)?;
            }
        }

        let docs_json = serde_json::to_vec(documents)
            .map_err(|e| TabragError::Parse(format!("document log serialization: {}", e)))?;
        std::fs::write(&docs_path, docs_json).map_err(TabragError::Io)?;

        std::fs::write(&rows_path, total_rows.to_string()).map_err(TabragError::Io)?;

        Ok(())
    }

    /// Restore a snapshot, or `None` when the table, index, or document log
    /// is missing or unreadable (all-or-nothing). The row marker alone is
    /// tolerated missing; the restored table length stands in for it.
    pub fn load(&self, key: &str) -> Option<ProgressSnapshot> {
        let [table_path, index_path, docs_path, rows_path] = self.artifact_paths(key);

        let table: Table = read_json(&table_path)?;
        let index = VectorIndex::from_bytes(&std::fs::read(&index_path).ok()?).ok()?;
        let documents: Vec<String> = read_json(&docs_path)?;

        let rows_processed = table.row_count();
        let total_rows: usize = std::fs::read_to_string(&rows_path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(rows_processed);
        Some(ProgressSnapshot {
            table,
            index,
            documents,
            rows_processed,
            total_rows,
        })
    }

    /// Remove all artifacts for a key. Missing files are ignored.
    pub fn clear(&self, key: &str) {
        for path in self.artifact_paths(key) {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = std::fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}
