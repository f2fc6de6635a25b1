use std::time::Duration;

use anyhow::{ensure, Context, Result};
use ndarray::Array1;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::comparison::Embedder;

/// Embedding client that calls an Ollama instance via HTTP.
#[derive(Clone, Debug)]
pub struct OllamaEmbedder {
    client: Client,
    /// Base URL for the Ollama server, e.g. `http://localhost:11434`.
    base_url: String,
    /// Embedding model such as `nomic-embed-text`.
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    /// Build a client; `timeout` of `None` waits for the server indefinitely.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for Ollama")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/embeddings", self.base_url.trim_end_matches('/'))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Embedder for OllamaEmbedder {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn embed(&self, text: &str) -> Result<Array1<f32>> {
        let url = self.endpoint();
        trace!(%url, model = %self.model, chars = text.len(), "requesting embedding");
        let response: EmbeddingResponse = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .with_context(|| format!("Failed to reach Ollama at {url}"))?
            .error_for_status()
            .context("Ollama rejected the embedding request")?
            .json()
            .context("Failed to parse Ollama embedding response")?;
        ensure!(
            !response.embedding.is_empty(),
            "Ollama returned an empty embedding for model {}",
            self.model
        );
        Ok(Array1::from(response.embedding))
    }
}
