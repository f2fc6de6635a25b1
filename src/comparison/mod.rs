//! Text comparison engine: normalization, word alignment and semantic scoring.

pub mod diff;
pub mod normalize;
pub mod orchestrator;
pub mod similarity;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub use diff::{
    align, AlignmentEntry, AlignmentReport, AlignmentStrategy, AlignmentSummary, Token, WordAligner,
};
pub use normalize::normalize;
pub use orchestrator::{AnalysisMode, ComparisonOrchestrator, ComparisonResult};
pub use similarity::{cosine_similarity, Embedder, SimilarityResult, SimilarityScorer};

/// Convenient alias for results returned by the comparison engine.
pub type Result<T> = std::result::Result<T, ComparisonError>;

/// Failures surfaced by the comparison engine.
#[derive(Debug)]
pub enum ComparisonError {
    /// The request combination cannot be evaluated.
    InvalidInput(String),
    /// An external capability (speech-to-text, embedding) failed.
    Capability {
        capability: &'static str,
        source: anyhow::Error,
    },
}

impl ComparisonError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn capability(capability: &'static str, source: anyhow::Error) -> Self {
        Self::Capability { capability, source }
    }
}

impl Display for ComparisonError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Capability { capability, source } => {
                write!(f, "{capability} capability failed: {source}")
            }
        }
    }
}

impl Error for ComparisonError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(_) => None,
            Self::Capability { source, .. } => Some(&**source),
        }
    }
}
