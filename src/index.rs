//! Append-only flat vector index with exact L2 nearest-neighbor search.
//!
//! Vectors are stored contiguously as `f32` rows of a fixed dimension. Search
//! is a full scan, which is the right trade-off at the row counts a single
//! ingested member produces. Serialization is a little-endian `f32` blob with
//! a 4-byte dimension header.

use crate::error::{Result, TabragError};

/// A growing collection of fixed-dimension embedding vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    /// Create an empty index for vectors of the given dimension.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(TabragError::Index("dimension must be non-zero".to_string()));
        }
        Ok(Self {
            dimension,
            data: Vec::new(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of vectors stored.
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append a batch of vectors in order.
    ///
    /// A vector whose dimension differs from the index's is a configuration
    /// error; nothing from the batch is appended in that case.
    pub fn add_batch(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        for v in vectors {
            if v.len() != self.dimension {
                return Err(TabragError::Index(format!(
                    "embedding dimension mismatch: index has {}, got {}",
                    self.dimension,
                    v.len()
                )));
            }
        }
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    /// Exact nearest-neighbor search: up to `k` `(distance, position)` pairs,
    /// closest first. Distance is squared L2.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(f32, usize)>> {
        if query.len() != self.dimension {
            return Err(TabragError::Index(format!(
                "query dimension mismatch: index has {}, got {}",
                self.dimension,
                query.len()
            )));
        }
        let mut scored: Vec<(f32, usize)> = self
            .data
            .chunks(self.dimension)
            .enumerate()
            .map(|(i, row)| (l2_squared(query, row), i))
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    /// Serialize: 4-byte little-endian dimension header, then LE f32 data.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.data.len() * 4);
        out.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        for f in &self.data {
            out.extend_from_slice(&f.to_le_bytes());
        }
        out
    }

    /// Deserialize a blob produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(blob: &[u8]) -> Result<Self> {
        if blob.len() < 4 || (blob.len() - 4) % 4 != 0 {
            return Err(TabragError::Index("corrupt index blob".to_string()));
        }
        let dim_bytes: [u8; 4] = blob[..4].try_into().unwrap_or([0; 4]);
        let dimension = u32::from_le_bytes(dim_bytes) as usize;
        if dimension == 0 {
            return Err(TabragError::Index("corrupt index blob: zero dimension".to_string()));
        }
        let data: Vec<f32> = blob[4..]
            .chunks(4)
            .map(|bytes| {
                let arr: [u8; 4] = bytes.try_into().unwrap_or([0; 4]);
                f32::from_le_bytes(arr)
            })
            .collect();
        if data.len() % dimension != 0 {
            return Err(TabragError::Index(
                "corrupt index blob: data not a multiple of dimension".to_string(),
            ));
        }
        Ok(Self { dimension, data })
    }
}

fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_dimension() {
        assert!(VectorIndex::new(0).is_err());
    }

    #[test]
    fn test_add_batch_and_len() {
        let mut idx = VectorIndex::new(3).unwrap();
        assert!(idx.is_empty());
        idx.add_batch(&[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]).unwrap();
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn test_add_batch_dimension_mismatch_is_atomic() {
        let mut idx = VectorIndex::new(3).unwrap();
        let result = idx.add_batch(&[vec![1.0, 0.0, 0.0], vec![1.0, 0.0]]);
        assert!(result.is_err());
        // Nothing partial appended
        assert_eq!(idx.len(), 0);
    }

    #[test]
    fn test_search_returns_closest_first() {
        let mut idx = VectorIndex::new(2).unwrap();
        idx.add_batch(&[vec![0.0, 0.0], vec![1.0, 1.0], vec![0.1, 0.0]]).unwrap();
        let hits = idx.search(&[0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].1, 0);
        assert_eq!(hits[1].1, 2);
        assert!(hits[0].0 <= hits[1].0);
    }

    #[test]
    fn test_search_k_larger_than_index() {
        let mut idx = VectorIndex::new(2).unwrap();
        idx.add_batch(&[vec![1.0, 2.0]]).unwrap();
        let hits = idx.search(&[1.0, 2.0], 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].0.abs() < 1e-6);
    }

    #[test]
    fn test_search_rejects_wrong_query_dimension() {
        let idx = VectorIndex::new(3).unwrap();
        assert!(idx.search(&[1.0], 1).is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut idx = VectorIndex::new(2).unwrap();
        idx.add_batch(&[vec![1.5, -2.5], vec![0.0, 3.25]]).unwrap();
        let blob = idx.to_bytes();
        let restored = VectorIndex::from_bytes(&blob).unwrap();
        assert_eq!(restored, idx);
    }

    #[test]
    fn test_from_bytes_rejects_corrupt_blobs() {
        assert!(VectorIndex::from_bytes(&[]).is_err());
        assert!(VectorIndex::from_bytes(&[1, 2, 3]).is_err());
        // Zero dimension header
        assert!(VectorIndex::from_bytes(&0u32.to_le_bytes()).is_err());
        // Dimension 3 but only two floats of data
        let mut blob = Vec::new();
        blob.extend_from_slice(&3u32.to_le_bytes());
        blob.extend_from_slice(&1.0f32.to_le_bytes());
        blob.extend_from_slice(&2.0f32.to_le_bytes());
        assert!(VectorIndex::from_bytes(&blob).is_err());
    }
}
