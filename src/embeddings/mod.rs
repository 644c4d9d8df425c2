//! Embedding providers behind one injected trait.
//!
//! The ingestion indexer and the retrieval service both depend only on
//! [`Embedder`]; indexing and querying must go through the *same* embedder or
//! nearest-neighbor results silently degrade to noise.

pub mod cache;
pub mod local;
pub mod openai;

pub use cache::EmbeddingCache;
pub use local::HashEmbedder;
pub use openai::OpenAIEmbedder;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{Result, TabragError};

/// An embedding function: texts in, fixed-dimension vectors out.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of documents, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .pop()
            .ok_or_else(|| TabragError::Embedding("empty embedding response".to_string()))
    }
}

/// Construct the embedder named by the configuration.
///
/// `provider = "openai"` requires the configured API-key env var; `"local"`
/// is the deterministic offline hash embedder.
pub fn build_embedder(config: &Config) -> Result<Box<dyn Embedder>> {
    match config.embeddings.provider.as_str() {
        "openai" => {
            let api_key = std::env::var(&config.embeddings.api_key_env).map_err(|_| {
                TabragError::Config(format!(
                    "environment variable {} not set",
                    config.embeddings.api_key_env
                ))
            })?;
            let cache = std::sync::Arc::new(EmbeddingCache::new(config.embeddings.cache_capacity));
            Ok(Box::new(OpenAIEmbedder::new_with_cache(
                api_key,
                config.embeddings.model.clone(),
                config.embeddings.batch_size,
                Some(cache),
            )))
        }
        "local" => Ok(Box::new(HashEmbedder::new(config.embeddings.dimensions)?)),
        other => Err(TabragError::Config(format!(
            "unknown embeddings provider: {}",
            other
        ))),
    }
}
