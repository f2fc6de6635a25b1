use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, ensure, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::comparison::{
    AlignmentStrategy, ComparisonOrchestrator, Embedder, SimilarityScorer, WordAligner,
};
use crate::embedding::{EmbedderKind, HashingEmbedder, OllamaEmbedder};
use crate::transcription::WhisperOptions;

pub const WHISPER_MODEL_ENV: &str = "WHISPER_MODEL_PATH";
pub const EMBEDDER_ENV: &str = "RECITALYZER_EMBEDDER";
pub const OLLAMA_URL_ENV: &str = "OLLAMA_URL";
pub const EMBED_MODEL_ENV: &str = "OLLAMA_EMBED_MODEL";

/// Runtime settings for the evaluation service.
///
/// Resolved in layers: built-in defaults, an optional JSON file, environment
/// variables, then command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub whisper_model: PathBuf,
    pub language: Option<String>,
    pub beam_size: u32,
    pub embedder: EmbedderKind,
    pub ollama_url: String,
    pub embed_model: String,
    /// Request timeout for the embedding server; unset waits indefinitely.
    pub embed_timeout_secs: Option<u64>,
    pub hashing_dimensions: usize,
    pub strict_expected: bool,
    pub alignment: AlignmentStrategy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            whisper_model: PathBuf::from("./models/ggml-medium.bin"),
            language: None,
            beam_size: 5,
            embedder: EmbedderKind::Ollama,
            ollama_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            embed_timeout_secs: None,
            hashing_dimensions: 256,
            strict_expected: false,
            alignment: AlignmentStrategy::Positional,
        }
    }
}

impl AppConfig {
    /// Defaults, overlaid by `path` when given, overlaid by the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {:?}", path))?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Apply environment overrides fetched through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup(WHISPER_MODEL_ENV) {
            self.whisper_model = PathBuf::from(model);
        }
        if let Some(kind) = lookup(EMBEDDER_ENV) {
            self.embedder = EmbedderKind::from_str(&kind, true).map_err(|_| {
                anyhow!("{EMBEDDER_ENV} must be one of ollama, hashing (got {kind:?})")
            })?;
        }
        if let Some(url) = lookup(OLLAMA_URL_ENV) {
            self.ollama_url = url;
        }
        if let Some(model) = lookup(EMBED_MODEL_ENV) {
            self.embed_model = model;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.beam_size > 0, "beam_size must be positive");
        ensure!(
            self.hashing_dimensions > 0,
            "hashing_dimensions must be positive"
        );
        ensure!(
            !self.ollama_url.trim().is_empty(),
            "ollama_url must not be empty"
        );
        ensure!(
            !self.embed_model.trim().is_empty(),
            "embed_model must not be empty"
        );
        Ok(())
    }

    pub fn whisper_options(&self) -> WhisperOptions {
        WhisperOptions {
            model_path: self.whisper_model.clone(),
            language: self.language.clone(),
            beam_size: self.beam_size,
        }
    }

    pub fn build_embedder(&self) -> Result<Arc<dyn Embedder>> {
        let embedder: Arc<dyn Embedder> = match self.embedder {
            EmbedderKind::Ollama => Arc::new(OllamaEmbedder::new(
                self.ollama_url.clone(),
                self.embed_model.clone(),
                self.embed_timeout_secs.map(Duration::from_secs),
            )?),
            EmbedderKind::Hashing => Arc::new(HashingEmbedder::new(self.hashing_dimensions)?),
        };
        Ok(embedder)
    }

    pub fn build_orchestrator(&self) -> Result<ComparisonOrchestrator> {
        let scorer = SimilarityScorer::new(self.build_embedder()?);
        Ok(
            ComparisonOrchestrator::new(WordAligner::new(self.alignment), scorer)
                .with_strict_expected(self.strict_expected),
        )
    }
}
