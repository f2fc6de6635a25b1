use serde::Serialize;
use tracing::{debug, info, warn};

use super::diff::{AlignmentReport, WordAligner};
use super::similarity::{SimilarityResult, SimilarityScorer};
use super::{ComparisonError, Result};

/// Requested kind of feedback, resolved once at the request boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Transcription only.
    #[default]
    None,
    /// Word-level diff against the expected text.
    WordByWord,
    /// Embedding similarity against the expected text.
    Semantic,
}

impl AnalysisMode {
    /// Resolve the `analysis_type` request field.
    ///
    /// Unknown values fall back to [`AnalysisMode::None`] with a warning.
    pub fn from_request(analysis_type: Option<&str>) -> Self {
        match analysis_type {
            None => Self::None,
            Some("wordByWord") => Self::WordByWord,
            Some("semantic") => Self::Semantic,
            Some(other) => {
                warn!(
                    analysis_type = other,
                    "unrecognized analysis type; returning transcription only"
                );
                Self::None
            }
        }
    }

    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::WordByWord => Some("wordByWord"),
            Self::Semantic => Some("semantic"),
        }
    }
}

/// Payload handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub transcribed_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_diff: Option<AlignmentReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_similarity: Option<SimilarityResult>,
}

impl ComparisonResult {
    pub fn transcription_only(transcribed_text: impl Into<String>) -> Self {
        Self {
            transcribed_text: transcribed_text.into(),
            word_diff: None,
            semantic_similarity: None,
        }
    }
}

/// Dispatches a transcription to the word aligner or the similarity scorer.
#[derive(Clone)]
pub struct ComparisonOrchestrator {
    aligner: WordAligner,
    scorer: SimilarityScorer,
    strict_expected: bool,
}

impl ComparisonOrchestrator {
    pub fn new(aligner: WordAligner, scorer: SimilarityScorer) -> Self {
        Self {
            aligner,
            scorer,
            strict_expected: false,
        }
    }

    /// Reject analysis requests that arrive without an expected text instead
    /// of silently returning the transcription alone.
    pub fn with_strict_expected(mut self, strict: bool) -> Self {
        self.strict_expected = strict;
        self
    }

    pub fn aligner(&self) -> &WordAligner {
        &self.aligner
    }

    pub fn compare(
        &self,
        transcribed: &str,
        expected: Option<&str>,
        mode: AnalysisMode,
    ) -> Result<ComparisonResult> {
        let mut result = ComparisonResult::transcription_only(transcribed);
        // An empty expected text is treated like an absent one.
        let expected = expected.filter(|text| !text.is_empty());

        match (mode, expected) {
            (AnalysisMode::None, _) => {
                debug!("no analysis requested");
            }
            (AnalysisMode::WordByWord, Some(expected)) => {
                let report = self.aligner.align(expected, transcribed);
                let summary = report.summary();
                info!(
                    correct = summary.correct,
                    mismatch = summary.mismatch,
                    missing = summary.missing,
                    extra = summary.extra,
                    "word-by-word comparison complete"
                );
                result.word_diff = Some(report);
            }
            (AnalysisMode::Semantic, Some(expected)) => {
                let similarity = self.scorer.score(transcribed, expected)?;
                info!(similarity = %similarity, "semantic comparison complete");
                result.semantic_similarity = Some(similarity);
            }
            (mode, None) => {
                if self.strict_expected {
                    return Err(ComparisonError::invalid_input(format!(
                        "analysis type {} requires an expected text",
                        mode.as_str().unwrap_or("none")
                    )));
                }
                warn!(
                    ?mode,
                    "analysis requested without expected text; returning transcription only"
                );
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_analysis_types() {
        assert_eq!(AnalysisMode::from_request(None), AnalysisMode::None);
        assert_eq!(
            AnalysisMode::from_request(Some("wordByWord")),
            AnalysisMode::WordByWord
        );
        assert_eq!(
            AnalysisMode::from_request(Some("semantic")),
            AnalysisMode::Semantic
        );
    }

    #[test]
    fn unknown_analysis_type_resolves_to_none() {
        assert_eq!(
            AnalysisMode::from_request(Some("wordbyword")),
            AnalysisMode::None
        );
        assert_eq!(AnalysisMode::from_request(Some("")), AnalysisMode::None);
    }

    #[test]
    fn transcription_only_payload_omits_analysis_fields() {
        let json = serde_json::to_value(ComparisonResult::transcription_only("hallo")).unwrap();
        assert_eq!(json, serde_json::json!({"transcribed_text": "hallo"}));
    }
}
