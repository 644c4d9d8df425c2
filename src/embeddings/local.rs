//! Deterministic offline embedder.
//!
//! Folds SHA-256 digests of whitespace tokens into a fixed-dimension vector
//! and L2-normalizes the result. Identical texts always embed to identical
//! vectors, and texts sharing tokens land near each other, which is enough
//! for keyless runs and for exercising the full pipeline in tests. Not a
//! semantic model.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{Result, TabragError};

use super::Embedder;

/// Token-hash embedder with a configurable dimension.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(TabragError::Config(
                "local embedder dimension must be non-zero".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimension];
        for token in text.split_whitespace() {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            for (i, slot) in vector.iter_mut().enumerate() {
                let byte = digest[i % digest.len()] as f32;
                // Rotate the digest per slot so dimensions beyond 32 differ
                let rotated = digest[(i / digest.len() + i) % digest.len()] as f32;
                *slot += ((byte + rotated) / 255.0) - 1.0;
            }
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic() {
        let e = HashEmbedder::new(64).unwrap();
        let a = e.embed_query("Ana 30").await.unwrap();
        let b = e.embed_query("Ana 30").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn test_distinct_texts_differ() {
        let e = HashEmbedder::new(64).unwrap();
        let a = e.embed_query("Ana 30").await.unwrap();
        let b = e.embed_query("Bo 41").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_batch_order_matches_input() {
        let e = HashEmbedder::new(32).unwrap();
        let texts = vec!["x".to_string(), "y".to_string()];
        let batch = e.embed_batch(&texts).await.unwrap();
        assert_eq!(batch[0], e.embed_query("x").await.unwrap());
        assert_eq!(batch[1], e.embed_query("y").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let e = HashEmbedder::new(16).unwrap();
        let v = e.embed_query("").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(HashEmbedder::new(0).is_err());
    }
}
