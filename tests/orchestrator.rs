use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::bail;
use approx::assert_relative_eq;
use ndarray::Array1;
use recitalyzer::comparison::{
    AlignmentStrategy, AnalysisMode, ComparisonError, ComparisonOrchestrator, Embedder,
    SimilarityScorer, WordAligner,
};
use recitalyzer::embedding::HashingEmbedder;

/// Wraps the hashing embedder and counts how often it is called.
struct CountingEmbed {
    inner: HashingEmbedder,
    calls: AtomicUsize,
}

impl CountingEmbed {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: HashingEmbedder::new(128).unwrap(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for CountingEmbed {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn embed(&self, text: &str) -> anyhow::Result<Array1<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text)
    }
}

/// Returns a fixed similarity regardless of the vectors.
struct FixedSimilarity(f32);

impl Embedder for FixedSimilarity {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn embed(&self, _text: &str) -> anyhow::Result<Array1<f32>> {
        Ok(Array1::from(vec![1.0, 0.0]))
    }

    fn similarity(&self, _a: &Array1<f32>, _b: &Array1<f32>) -> anyhow::Result<f32> {
        Ok(self.0)
    }
}

struct Unreachable;

impl Embedder for Unreachable {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    fn embed(&self, _text: &str) -> anyhow::Result<Array1<f32>> {
        bail!("connection refused")
    }
}

fn orchestrator(embedder: Arc<dyn Embedder>) -> ComparisonOrchestrator {
    ComparisonOrchestrator::new(WordAligner::default(), SimilarityScorer::new(embedder))
}

#[test]
fn mode_none_never_touches_the_embedder() {
    let embedder = CountingEmbed::new();
    let result = orchestrator(embedder.clone())
        .compare("ich bin hier", Some("ich bin da"), AnalysisMode::None)
        .unwrap();
    assert_eq!(result.transcribed_text, "ich bin hier");
    assert!(result.word_diff.is_none());
    assert!(result.semantic_similarity.is_none());
    assert_eq!(embedder.calls(), 0);
}

#[test]
fn word_by_word_attaches_diff_only() {
    let embedder = CountingEmbed::new();
    let result = orchestrator(embedder.clone())
        .compare("ich bin hier", Some("Ich bin da."), AnalysisMode::WordByWord)
        .unwrap();
    let diff = result.word_diff.expect("word diff");
    assert_eq!(diff.summary().correct, 2);
    assert_eq!(diff.summary().mismatch, 1);
    assert!(result.semantic_similarity.is_none());
    assert_eq!(embedder.calls(), 0);
}

#[test]
fn semantic_attaches_similarity_only() {
    let embedder = CountingEmbed::new();
    let result = orchestrator(embedder.clone())
        .compare("Ich bin hier!", Some("ich bin hier"), AnalysisMode::Semantic)
        .unwrap();
    let similarity = result.semantic_similarity.expect("similarity");
    assert_relative_eq!(similarity.percent(), 100.0, epsilon = 1e-3);
    assert!(result.word_diff.is_none());
    assert_eq!(embedder.calls(), 2);
}

#[test]
fn semantic_score_is_symmetric() {
    let scorer = SimilarityScorer::new(CountingEmbed::new());
    let forward = scorer
        .score("der zug kommt spät", "der zug ist pünktlich")
        .unwrap();
    let backward = scorer
        .score("der zug ist pünktlich", "der zug kommt spät")
        .unwrap();
    assert_eq!(forward, backward);
}

#[test]
fn missing_expected_text_is_a_silent_no_op_by_default() {
    let embedder = CountingEmbed::new();
    let orchestrator = orchestrator(embedder.clone());
    for mode in [AnalysisMode::WordByWord, AnalysisMode::Semantic] {
        let result = orchestrator.compare("hallo", None, mode).unwrap();
        assert!(result.word_diff.is_none());
        assert!(result.semantic_similarity.is_none());
        let result = orchestrator.compare("hallo", Some(""), mode).unwrap();
        assert!(result.word_diff.is_none());
    }
    assert_eq!(embedder.calls(), 0);
}

#[test]
fn strict_mode_rejects_missing_expected_text() {
    let orchestrator = orchestrator(CountingEmbed::new()).with_strict_expected(true);
    let err = orchestrator
        .compare("hallo", None, AnalysisMode::Semantic)
        .unwrap_err();
    assert!(matches!(err, ComparisonError::InvalidInput(_)));
    assert!(orchestrator
        .compare("hallo", None, AnalysisMode::None)
        .is_ok());
}

#[test]
fn negative_similarity_passes_through() {
    let result = orchestrator(Arc::new(FixedSimilarity(-0.5)))
        .compare("ja", Some("nein"), AnalysisMode::Semantic)
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["semantic_similarity"], "-50.00%");
}

#[test]
fn embedding_failures_propagate() {
    let err = orchestrator(Arc::new(Unreachable))
        .compare("ja", Some("nein"), AnalysisMode::Semantic)
        .unwrap_err();
    assert!(matches!(
        err,
        ComparisonError::Capability {
            capability: "embedding",
            ..
        }
    ));
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn payload_matches_transport_shape() {
    let result = orchestrator(CountingEmbed::new())
        .compare("a x c d", Some("a b c"), AnalysisMode::WordByWord)
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "transcribed_text": "a x c d",
            "word_diff": [
                {"type": "correct", "word": "a"},
                {"type": "mismatch", "expected": "b", "transcribed": "x"},
                {"type": "correct", "word": "c"},
                {"type": "extra", "word": "d"},
            ]
        })
    );
}

#[test]
fn edit_distance_strategy_is_used_when_configured() {
    let orchestrator = ComparisonOrchestrator::new(
        WordAligner::new(AlignmentStrategy::EditDistance),
        SimilarityScorer::new(CountingEmbed::new()),
    );
    let result = orchestrator
        .compare("a b c", Some("a x b c"), AnalysisMode::WordByWord)
        .unwrap();
    let summary = result.word_diff.unwrap().summary();
    assert_eq!((summary.correct, summary.missing), (3, 1));
    assert_eq!(summary.mismatch, 0);
}

#[test]
fn empty_transcription_scores_zero_percent() {
    let embedder = CountingEmbed::new();
    let orchestrator = orchestrator(embedder.clone());
    for transcribed in ["", "?!"] {
        let result = orchestrator
            .compare(transcribed, Some("Guten Morgen"), AnalysisMode::Semantic)
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["semantic_similarity"], "0.00%");
    }
    assert_eq!(embedder.calls(), 0);
}
