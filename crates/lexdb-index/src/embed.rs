//! Deterministic hashing embedder.
//!
//! The production encoder is an external service consumed behind the
//! `Embedder` trait. This stand-in hashes whitespace tokens into a fixed-size
//! bag-of-words vector: deterministic, fast, and good enough for tests,
//! development, and smoke runs without the encoder sidecar.

use std::hash::{Hash, Hasher};

use twox_hash::XxHash64;

use lexdb_core::traits::Embedder;

use crate::schema::EMBEDDING_DIM;

pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.to_lowercase().split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

pub fn hash_embedder() -> Box<dyn Embedder> {
    Box::new(HashEmbedder::new(EMBEDDING_DIM as usize))
}
