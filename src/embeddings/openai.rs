use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, TabragError};

use super::{cache::EmbeddingCache, Embedder};

/// Request structure for the OpenAI embeddings API
#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

/// Response structure from the OpenAI embeddings API
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// Individual embedding data in API response
#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// OpenAI embeddings client.
///
/// Handles batch embedding generation with retry logic and rate limiting.
/// Optionally caches query embeddings to reduce API calls. The vector
/// dimension is whatever the configured model returns; the index is created
/// from the first observed batch, so no dimension is hardcoded here.
pub struct OpenAIEmbedder {
    client: Client,
    api_key: String,
    model: String,
    batch_size: usize,
    cache: Option<Arc<EmbeddingCache>>,
}

impl OpenAIEmbedder {
    /// Create a new embedder for the given model.
    ///
    /// `batch_size` is clamped to the API limit of 2048 inputs per request.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// normal operation).
    pub fn new(api_key: String, model: String, batch_size: usize) -> Self {
        Self::new_with_cache(api_key, model, batch_size, None)
    }

    /// Create a new embedder with an optional query-embedding cache.
    pub fn new_with_cache(
        api_key: String,
        model: String,
        batch_size: usize,
        cache: Option<Arc<EmbeddingCache>>,
    ) -> Self {
        let batch_size = batch_size.min(2048);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            model,
            batch_size,
            cache,
        }
    }

    /// Internal method to make a single API request.
    async fn request_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: texts,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/embeddings")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| TabragError::Embedding(format!("Network error: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(TabragError::Embedding(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| TabragError::Embedding(format!("Failed to parse response: {}", e)))?;

        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Embed one text with bounded retry and exponential backoff on 429/5xx.
    async fn embed_with_retry(&self, text: &str, max_retries: usize) -> Result<Vec<f32>> {
        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.request_batch(vec![text.to_string()]).await {
                Ok(mut embeddings) => {
                    if embeddings.is_empty() {
                        return Err(TabragError::Embedding(
                            "Empty response from OpenAI API".to_string(),
                        ));
                    }
                    log::debug!(
                        "Embedding API call took {:?} (attempt {})",
                        start.elapsed(),
                        attempt + 1
                    );
                    return Ok(embeddings.remove(0));
                }
                Err(e) if attempt < max_retries => {
                    let should_retry = e.to_string().contains("429")
                        || e.to_string().contains("500")
                        || e.to_string().contains("502")
                        || e.to_string().contains("503")
                        || e.to_string().contains("504");

                    if should_retry {
                        log::warn!("Retry {}/{} after error: {}", attempt + 1, max_retries, e);
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                        attempt += 1;
                    } else {
                        return Err(e);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    /// Embed a batch of texts, splitting into API-sized sub-batches.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::new();

        for chunk in texts.chunks(self.batch_size) {
            let embeddings = self.request_batch(chunk.to_vec()).await?;
            if embeddings.len() != chunk.len() {
                return Err(TabragError::Embedding(format!(
                    "API returned {} embeddings for {} inputs",
                    embeddings.len(),
                    chunk.len()
                )));
            }
            all_embeddings.extend(embeddings);

            // Rate limiting: small delay between full batches
            if chunk.len() == self.batch_size {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }

        Ok(all_embeddings)
    }

    /// Embed a query with cache lookup and retry.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(text) {
                log::debug!("Cache hit for query: {}", text);
                return Ok(cached);
            }
        }

        let embedding = self.embed_with_retry(text, 3).await?;

        if let Some(cache) = &self.cache {
            cache.put(text.to_string(), embedding.clone());
        }

        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_clamped_to_api_limit() {
        let embedder = OpenAIEmbedder::new("k".to_string(), "text-embedding-3-small".to_string(), 10_000);
        assert_eq!(embedder.batch_size, 2048);
    }

    #[tokio::test]
    async fn test_empty_batch_short_circuits() {
        // No API key and no network needed: an empty input never hits the API.
        let embedder = OpenAIEmbedder::new("k".to_string(), "m".to_string(), 16);
        let out = embedder.embed_batch(&[]).await.unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = EmbeddingRequest {
            model: "text-embedding-3-small".to_string(),
            input: vec!["a".to_string(), "b".to_string()],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "text-embedding-3-small");
        assert_eq!(json["input"].as_array().unwrap().len(), 2);
    }
}
