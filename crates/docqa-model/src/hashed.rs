//! Deterministic feature-hashing embedder.
//!
//! Each lower-cased alphanumeric token is hashed into one of `dimension`
//! buckets with a hash-derived sign, and the resulting count vector is
//! L2-normalised. Texts sharing vocabulary get high cosine similarity, which
//! is enough for offline use and tests. Hashing uses SHA-256 so vectors are
//! stable across builds and platforms.

use crate::error::ModelResult;
use crate::EmbeddingModel;
use sha2::{Digest, Sha256};

pub const HASHED_MODEL_ID: &str = "hashed";

/// Offline embedder based on the hashing trick.
#[derive(Debug, Clone)]
pub struct HashedEmbeddingModel {
    dimension: usize,
}

impl HashedEmbeddingModel {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn hash_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
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

impl EmbeddingModel for HashedEmbeddingModel {
    fn embed(&self, texts: &[&str]) -> ModelResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.hash_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        HASHED_MODEL_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_deterministic_and_normalized() {
        let model = HashedEmbeddingModel::new(64);
        let a = model.embed(&["Payment terms are net 30"]).unwrap();
        let b = model.embed(&["payment TERMS are net 30"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 64);
        assert!((cosine(&a[0], &a[0]) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_vocabulary_scores_higher() {
        let model = HashedEmbeddingModel::new(256);
        let v = model
            .embed(&[
                "termination notice period",
                "the termination notice period is ninety days",
                "supplier shall deliver widgets",
            ])
            .unwrap();
        assert!(cosine(&v[0], &v[1]) > cosine(&v[0], &v[2]));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let model = HashedEmbeddingModel::new(8);
        let v = model.embed(&["  ...  "]).unwrap();
        assert!(v[0].iter().all(|x| *x == 0.0));
    }
}
