//! Embedding Indexer: rows to documents, documents to vectors, vectors into
//! the growing index with an order-aligned document log.

use crate::embeddings::Embedder;
use crate::error::{Result, TabragError};
use crate::index::VectorIndex;
use crate::table::{Cell, Table};

/// Render one row to a single text document: stringified values in column
/// order, space-separated.
pub fn render_row_document(row: &[Cell]) -> String {
    row.iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Embed a chunk's rows and append them to the index and document log.
///
/// A zero-row chunk is a no-op, not an error. The index is created lazily with
/// the dimension observed from the first embedding batch; a later batch with a
/// different dimension is a fatal configuration error (vectors are never
/// silently truncated or padded). Documents are appended in the same order as
/// their vectors, and only after the vectors are committed, so the log and the
/// index never go out of step.
pub async fn index_chunk(
    index: &mut Option<VectorIndex>,
    documents: &mut Vec<String>,
    chunk: &Table,
    embedder: &dyn Embedder,
) -> Result<()> {
    if chunk.is_empty() {
        return Ok(());
    }

    let docs: Vec<String> = chunk.rows().iter().map(|r| render_row_document(r)).collect();
    let embeddings = embedder.embed_batch(&docs).await?;

    if embeddings.len() != docs.len() {
        return Err(TabragError::Embedding(format!(
            "embedder returned {} vectors for {} documents",
            embeddings.len(),
            docs.len()
        )));
    }

    let target = match index {
        Some(existing) => existing,
        None => {
            let dimension = embeddings
                .first()
                .map(|v| v.len())
                .ok_or_else(|| TabragError::Embedding("empty embedding batch".to_string()))?;
            index.insert(VectorIndex::new(dimension)?)
        }
    };

    target.add_batch(&embeddings)?;
    documents.extend(docs);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashEmbedder;
    use async_trait::async_trait;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_render_row_document() {
        let row = vec![text("Ana"), Cell::Number(30.0), Cell::Missing];
        assert_eq!(render_row_document(&row), "Ana 30 ");
    }

    #[tokio::test]
    async fn test_index_chunk_appends_aligned() {
        let embedder = HashEmbedder::new(32).unwrap();
        let mut index = None;
        let mut documents = Vec::new();

        let mut chunk = Table::new(vec!["A".into()]);
        chunk.push_row(vec![text("x")]);
        chunk.push_row(vec![text("y")]);

        index_chunk(&mut index, &mut documents, &chunk, &embedder).await.unwrap();
        index_chunk(&mut index, &mut documents, &chunk, &embedder).await.unwrap();

        let index = index.unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(documents.len(), 4);
        assert_eq!(documents[0], "x");
        assert_eq!(documents[3], "y");
    }

    #[tokio::test]
    async fn test_empty_chunk_is_noop() {
        let embedder = HashEmbedder::new(32).unwrap();
        let mut index = None;
        let mut documents = Vec::new();
        let chunk = Table::new(vec!["A".into()]);

        index_chunk(&mut index, &mut documents, &chunk, &embedder).await.unwrap();
        assert!(index.is_none());
        assert!(documents.is_empty());
    }

    /// Embedder whose dimension flips after the first batch.
    struct FlippingEmbedder {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl Embedder for FlippingEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let dim = if call == 0 { 4 } else { 8 };
            Ok(texts.iter().map(|_| vec![0.0; dim]).collect())
        }
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_fatal_and_keeps_log_aligned() {
        let embedder = FlippingEmbedder {
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let mut index = None;
        let mut documents = Vec::new();

        let mut chunk = Table::new(vec!["A".into()]);
        chunk.push_row(vec![text("x")]);

        index_chunk(&mut index, &mut documents, &chunk, &embedder).await.unwrap();
        let err = index_chunk(&mut index, &mut documents, &chunk, &embedder).await;
        assert!(err.is_err());

        // The failed chunk contributed neither vectors nor documents.
        assert_eq!(index.unwrap().len(), 1);
        assert_eq!(documents.len(), 1);
    }
}
