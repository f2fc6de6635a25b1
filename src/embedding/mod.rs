//! Embedding backends implementing [`crate::comparison::Embedder`].

pub mod hashing;
pub mod ollama;

use serde::{Deserialize, Serialize};

pub use hashing::HashingEmbedder;
pub use ollama::OllamaEmbedder;

/// Selectable embedding backend.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum EmbedderKind {
    /// Ollama server `/api/embeddings` endpoint.
    #[default]
    Ollama,
    /// Offline feature-hashing bag of words.
    Hashing,
}
