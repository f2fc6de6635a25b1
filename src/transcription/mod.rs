//! Transcription module - converts learner recordings to text using Whisper
//!
//! The speech-to-text engine is an external capability from the point of view
//! of the comparison core. It is modelled as the [`Transcriber`] trait so the
//! evaluation service can be built with a real whisper model in production and
//! a canned transcriber in tests.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::audio::resample::WHISPER_SAMPLE_RATE;
use crate::types::{AudioData, Segment, Transcript};
use anyhow::{anyhow, ensure, Context, Result};
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Speech-to-text capability: `transcribe(audio) -> text`.
pub trait Transcriber: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Transcribe 16 kHz mono audio into timestamped segments.
    fn transcribe(&self, audio: &AudioData) -> Result<Transcript>;
}

/// Decoding options forwarded to whisper for every request.
#[derive(Debug, Clone, PartialEq)]
pub struct WhisperOptions {
    pub model_path: PathBuf,
    /// ISO language code; `None` lets whisper auto-detect.
    pub language: Option<String>,
    pub beam_size: u32,
}

/// Whisper model loaded once and shared read-only across requests.
pub struct WhisperTranscriber {
    ctx: WhisperContext,
    options: WhisperOptions,
}

impl WhisperTranscriber {
    /// Load the whisper model named in `options`.
    pub fn new(options: WhisperOptions) -> Result<Self> {
        ensure!(options.beam_size > 0, "beam size must be positive");
        let model_path = model_path_str(&options.model_path)?;
        let started = Instant::now();
        let ctx = WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
            .with_context(|| {
                format!(
                    "Failed to load Whisper model at {}. Download with: wget https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-medium.bin -P ./models/",
                    options.model_path.display()
                )
            })?;
        info!(
            model = %options.model_path.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "whisper model loaded"
        );
        Ok(Self { ctx, options })
    }

    pub fn options(&self) -> &WhisperOptions {
        &self.options
    }
}

impl Transcriber for WhisperTranscriber {
    fn name(&self) -> &'static str {
        "whisper"
    }

    fn transcribe(&self, audio: &AudioData) -> Result<Transcript> {
        ensure!(
            audio.sample_rate == WHISPER_SAMPLE_RATE,
            "whisper expects {} Hz audio, got {} Hz",
            WHISPER_SAMPLE_RATE,
            audio.sample_rate
        );

        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: self.options.beam_size as i32,
            patience: -1.0,
        });
        params.set_language(self.options.language.as_deref());
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        let started = Instant::now();
        let mut state = self
            .ctx
            .create_state()
            .context("Failed to create Whisper state")?;
        state
            .full(params, &audio.samples)
            .context("Failed to transcribe audio")?;

        let mut segments = Vec::new();
        for segment in state.as_iter() {
            let text = segment
                .to_str()
                .context("Failed to get segment text")?
                .to_string();
            // Timestamps are in centiseconds
            segments.push(Segment {
                text,
                start_time: segment.start_timestamp() as f64 / 100.0,
                end_time: segment.end_timestamp() as f64 / 100.0,
            });
        }
        debug!(
            segments = segments.len(),
            audio_secs = audio.duration_secs(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "whisper transcription finished"
        );
        Ok(Transcript { segments })
    }
}

fn model_path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow!("model path must be valid UTF-8: {}", path.display()))
}

/// Transcriber returning a fixed text, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct StaticTranscriber {
    text: String,
}

impl StaticTranscriber {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Transcriber for StaticTranscriber {
    fn name(&self) -> &'static str {
        "static"
    }

    fn transcribe(&self, audio: &AudioData) -> Result<Transcript> {
        Ok(Transcript {
            segments: vec![Segment {
                text: self.text.clone(),
                start_time: 0.0,
                end_time: audio.duration_secs(),
            }],
        })
    }
}
