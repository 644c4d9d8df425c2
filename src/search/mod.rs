//! Retrieval: top-K nearest row documents for a natural-language query.

use crate::embeddings::Embedder;
use crate::error::Result;
use crate::index::VectorIndex;

/// One retrieved row document with its search score.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedContext {
    /// The rendered row text that was embedded at ingestion time.
    pub document: String,
    /// Squared-L2 distance to the query vector; lower is closer.
    pub distance: f32,
    /// Position in the document log (and so the row's insertion order).
    pub row: usize,
}

/// Embed the query with the same embedder used at ingestion and return up to
/// `top_k` closest row documents, best first.
///
/// An absent or empty index yields an empty result rather than an error, so
/// callers can probe before ingestion has produced anything.
pub async fn retrieve_context(
    query: &str,
    index: Option<&VectorIndex>,
    documents: &[String],
    embedder: &dyn Embedder,
    top_k: usize,
) -> Result<Vec<RetrievedContext>> {
    let index = match index {
        Some(index) if !index.is_empty() => index,
        _ => return Ok(Vec::new()),
    };
    if top_k == 0 {
        return Ok(Vec::new());
    }

    let query_vector = embedder.embed_query(query).await?;
    let hits = index.search(&query_vector, top_k)?;

    let mut results = Vec::with_capacity(hits.len());
    for (distance, row) in hits {
        // A position past the log means index and log drifted apart; skip it
        // rather than fabricate text.
        match documents.get(row) {
            Some(document) => results.push(RetrievedContext {
                document: document.clone(),
                distance,
                row,
            }),
            None => log::warn!(
                "index position {} has no document (log has {})",
                row,
                documents.len()
            ),
        }
    }
    Ok(results)
}

/// Join retrieved documents into the context block handed to a generator.
pub fn context_block(results: &[RetrievedContext]) -> String {
    results
        .iter()
        .map(|r| r.document.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
