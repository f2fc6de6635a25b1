use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, ensure};
use ndarray::Array1;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use super::normalize::normalize;
use super::{ComparisonError, Result};

/// Semantic embedding capability: `embed(text) -> vector` plus a similarity metric.
pub trait Embedder: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Embed already-normalized text.
    fn embed(&self, text: &str) -> anyhow::Result<Array1<f32>>;

    /// Similarity of two embeddings in `[-1, 1]`; cosine unless overridden.
    fn similarity(&self, a: &Array1<f32>, b: &Array1<f32>) -> anyhow::Result<f32> {
        cosine_similarity(a, b)
    }
}

/// Cosine of the angle between two vectors.
///
/// Vectors of different dimension are rejected as malformed. A zero vector
/// carries no direction, so its similarity to anything is 0.
pub fn cosine_similarity(a: &Array1<f32>, b: &Array1<f32>) -> anyhow::Result<f32> {
    ensure!(
        a.len() == b.len(),
        "embedding dimensions differ: {} vs {}",
        a.len(),
        b.len()
    );
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    if !norm_a.is_finite() || !norm_b.is_finite() {
        bail!("embedding contains non-finite values");
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        warn!("zero-norm embedding; treating similarity as 0");
        return Ok(0.0);
    }
    Ok(a.dot(b) / (norm_a * norm_b))
}

/// Embedding similarity expressed as a percentage.
///
/// Negative cosine values are passed through, so the percentage may drop
/// below zero for texts that point in opposite directions.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SimilarityResult {
    percent: f64,
}

impl SimilarityResult {
    pub fn from_similarity(similarity: f32) -> Self {
        Self {
            percent: f64::from(similarity) * 100.0,
        }
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }
}

impl Display for SimilarityResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}%", self.percent)
    }
}

impl Serialize for SimilarityResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Normalizes whole texts and scores them through an [`Embedder`].
#[derive(Clone)]
pub struct SimilarityScorer {
    embedder: Arc<dyn Embedder>,
}

impl SimilarityScorer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Score two texts; a text with no words left after normalization scores 0
    /// without consulting the embedder.
    pub fn score(&self, text_a: &str, text_b: &str) -> Result<SimilarityResult> {
        let started = Instant::now();
        let (text_a, text_b) = (normalize(text_a), normalize(text_b));
        if text_a.trim().is_empty() || text_b.trim().is_empty() {
            warn!("text has no words after normalization; similarity is 0");
            return Ok(SimilarityResult::from_similarity(0.0));
        }
        let a = self.embed(&text_a)?;
        let b = self.embed(&text_b)?;
        let similarity = self
            .embedder
            .similarity(&a, &b)
            .map_err(|err| ComparisonError::capability("embedding", err))?;
        if !similarity.is_finite() {
            return Err(ComparisonError::capability(
                "embedding",
                anyhow::anyhow!("similarity metric returned {similarity}"),
            ));
        }
        let result = SimilarityResult::from_similarity(similarity);
        debug!(
            embedder = self.embedder.name(),
            dimensions = a.len(),
            similarity = %result,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scored semantic similarity"
        );
        Ok(result)
    }

    fn embed(&self, normalized: &str) -> Result<Array1<f32>> {
        self.embedder
            .embed(normalized)
            .map_err(|err| ComparisonError::capability("embedding", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Embeds text as counts of a few vowels; enough to get distinct directions.
    struct VowelEmbed;

    impl Embedder for VowelEmbed {
        fn name(&self) -> &'static str {
            "vowels"
        }

        fn embed(&self, text: &str) -> anyhow::Result<Array1<f32>> {
            Ok(['a', 'e', 'i', 'o', 'u']
                .iter()
                .map(|v| text.chars().filter(|c| c == v).count() as f32)
                .collect())
        }
    }

    struct Failing;

    impl Embedder for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn embed(&self, _text: &str) -> anyhow::Result<Array1<f32>> {
            bail!("model not loaded")
        }
    }

    #[test]
    fn cosine_of_parallel_and_opposite_vectors() {
        let a = array![1.0_f32, 2.0, 3.0];
        let b = array![2.0_f32, 4.0, 6.0];
        let c = array![-1.0_f32, -2.0, -3.0];
        assert!((cosine_similarity(&a, &b).unwrap() - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&a, &c).unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_rejects_dimension_mismatch() {
        let a = array![1.0_f32, 0.0];
        let b = array![1.0_f32, 0.0, 0.0];
        assert!(cosine_similarity(&a, &b).is_err());
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        let a = array![0.0_f32, 0.0];
        let b = array![1.0_f32, 0.0];
        assert_eq!(cosine_similarity(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn negative_similarity_is_not_clamped() {
        let result = SimilarityResult::from_similarity(-0.25);
        assert!((result.percent() + 25.0).abs() < 1e-9);
        assert_eq!(result.to_string(), "-25.00%");
    }

    #[test]
    fn serializes_as_percentage_string() {
        let result = SimilarityResult::from_similarity(0.87654);
        assert_eq!(serde_json::to_value(result).unwrap(), "87.65%");
    }

    #[test]
    fn identical_texts_after_normalization_score_full() {
        let scorer = SimilarityScorer::new(Arc::new(VowelEmbed));
        let result = scorer.score("Hallo, Anna!", "hallo anna").unwrap();
        assert!((result.percent() - 100.0).abs() < 1e-4);
    }

    #[test]
    fn wordless_text_scores_zero_without_embedding() {
        let scorer = SimilarityScorer::new(Arc::new(Failing));
        for (a, b) in [("", "Guten Morgen"), ("?!", "Guten Morgen"), ("hallo", "  ")] {
            let result = scorer.score(a, b).unwrap();
            assert_eq!(result.to_string(), "0.00%");
        }
    }

    #[test]
    fn score_is_symmetric() {
        let scorer = SimilarityScorer::new(Arc::new(VowelEmbed));
        let ab = scorer.score("guten morgen", "gute nacht").unwrap();
        let ba = scorer.score("gute nacht", "guten morgen").unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn embedder_failure_is_a_capability_error() {
        let scorer = SimilarityScorer::new(Arc::new(Failing));
        let err = scorer.score("a", "b").unwrap_err();
        assert!(matches!(
            err,
            ComparisonError::Capability {
                capability: "embedding",
                ..
            }
        ));
    }
}
