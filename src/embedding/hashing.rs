use anyhow::{ensure, Result};
use ndarray::Array1;

use crate::comparison::Embedder;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic bag-of-words embedding via signed feature hashing.
///
/// Each whitespace token is hashed into one of `dimensions` buckets and adds
/// +1 or -1 depending on the top hash bit. Texts sharing words point in
/// similar directions; word order is ignored.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self> {
        ensure!(dimensions > 0, "hashing embedder needs at least one dimension");
        Ok(Self { dimensions })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &'static str {
        "hashing"
    }

    fn embed(&self, text: &str) -> Result<Array1<f32>> {
        let mut vector = Array1::<f32>::zeros(self.dimensions);
        for token in text.split_whitespace() {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        Ok(vector)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
