use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use crate::comparison::AlignmentStrategy;
use crate::config::AppConfig;
use crate::embedding::EmbedderKind;
use crate::practice::PracticeRequest;

#[derive(Parser, Debug)]
#[command(
    name = "recitalyzer",
    version,
    about = "Transcribe practice recordings and compare them with the expected text"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Transcribe a recording and compare it with the expected text.
    Evaluate(EvaluateArgs),
    /// Compare an existing transcription with the expected text.
    Compare(CompareArgs),
    /// Report that the tool is ready.
    Ping,
}

#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Text the learner was asked to say.
    #[arg(long = "expected", value_name = "TEXT")]
    pub expected_text: Option<String>,
    /// Feedback to produce: `wordByWord` or `semantic`.
    #[arg(long = "analysis-type", value_name = "TYPE")]
    pub analysis_type: Option<String>,
}

impl RequestArgs {
    pub fn to_request(&self) -> PracticeRequest {
        PracticeRequest::from_fields(self.expected_text.clone(), self.analysis_type.as_deref())
    }
}

#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// JSON configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Embedding backend for semantic comparison.
    #[arg(long, value_enum)]
    pub embedder: Option<EmbedderKind>,
    /// Base URL of the Ollama server.
    #[arg(long = "ollama-url", value_name = "URL")]
    pub ollama_url: Option<String>,
    /// Ollama embedding model.
    #[arg(long = "embed-model", value_name = "MODEL")]
    pub embed_model: Option<String>,
    /// Word alignment strategy.
    #[arg(long, value_enum)]
    pub alignment: Option<AlignmentStrategy>,
    /// Fail when an analysis type is given without an expected text.
    #[arg(long)]
    pub strict: bool,
    /// Pretty-print the JSON result.
    #[arg(long)]
    pub pretty: bool,
}

impl EngineArgs {
    /// Resolve the layered configuration with these flags on top.
    pub fn resolve(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(kind) = self.embedder {
            config.embedder = kind;
        }
        if let Some(url) = &self.ollama_url {
            config.ollama_url = url.clone();
        }
        if let Some(model) = &self.embed_model {
            config.embed_model = model.clone();
        }
        if let Some(alignment) = self.alignment {
            config.alignment = alignment;
        }
        if self.strict {
            config.strict_expected = true;
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Recording to evaluate (WAV, MP3, OGG, FLAC, ...).
    #[arg(value_name = "AUDIO")]
    pub audio: PathBuf,
    /// Whisper ggml model file.
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,
    /// Spoken language code; auto-detected when omitted.
    #[arg(long, value_name = "CODE")]
    pub language: Option<String>,
    /// Beam width for whisper decoding.
    #[arg(long = "beam-size")]
    pub beam_size: Option<u32>,
    #[command(flatten)]
    pub request: RequestArgs,
    #[command(flatten)]
    pub engine: EngineArgs,
}

impl EvaluateArgs {
    pub fn validate(&self) -> Result<()> {
        if !self.audio.exists() {
            bail!("Audio file does not exist: {:?}", self.audio);
        }
        if !self.audio.is_file() {
            bail!("Audio path is not a file: {:?}", self.audio);
        }
        Ok(())
    }

    pub fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.engine.config.as_deref())?;
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overlay engine and transcription flags onto `config`.
    pub fn apply_to(&self, config: &mut AppConfig) {
        self.engine.apply_to(config);
        if let Some(model) = &self.model {
            config.whisper_model = model.clone();
        }
        if let Some(language) = &self.language {
            config.language = Some(language.clone());
        }
        if let Some(beam_size) = self.beam_size {
            config.beam_size = beam_size;
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Transcribed text to evaluate.
    #[arg(long, value_name = "TEXT")]
    pub transcribed: String,
    #[command(flatten)]
    pub request: RequestArgs,
    #[command(flatten)]
    pub engine: EngineArgs,
}
