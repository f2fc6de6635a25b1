//! End-to-end evaluation of a practice recording.
//!
//! Decodes the learner's recording, transcribes it and hands the text to the
//! comparison engine. The transcriber and the orchestrator are constructed
//! once by the caller and shared across requests.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use tracing::info;

use crate::audio::{decoder, resample};
use crate::comparison::{AnalysisMode, ComparisonError, ComparisonOrchestrator, ComparisonResult};
use crate::transcription::Transcriber;
use crate::types::AudioData;

/// What the learner was supposed to say and which feedback they want.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PracticeRequest {
    pub expected_text: Option<String>,
    pub mode: AnalysisMode,
}

impl PracticeRequest {
    /// Build from raw request fields, resolving the analysis type string.
    pub fn from_fields(expected_text: Option<String>, analysis_type: Option<&str>) -> Self {
        Self {
            expected_text,
            mode: AnalysisMode::from_request(analysis_type),
        }
    }
}

/// Transcribes recordings and compares them against expected texts.
#[derive(Clone)]
pub struct PracticeEvaluator {
    transcriber: Arc<dyn Transcriber>,
    orchestrator: ComparisonOrchestrator,
}

impl PracticeEvaluator {
    pub fn new(transcriber: Arc<dyn Transcriber>, orchestrator: ComparisonOrchestrator) -> Self {
        Self {
            transcriber,
            orchestrator,
        }
    }

    /// Decode the file at `path` and evaluate it.
    pub fn evaluate_file(
        &self,
        path: &Path,
        request: &PracticeRequest,
    ) -> Result<ComparisonResult> {
        let audio = decoder::decode_audio(path)
            .with_context(|| format!("Failed to decode recording {:?}", path))?;
        self.evaluate_audio(&audio, request)
    }

    /// Evaluate already-decoded mono audio at any sample rate.
    pub fn evaluate_audio(
        &self,
        audio: &AudioData,
        request: &PracticeRequest,
    ) -> Result<ComparisonResult> {
        ensure!(!audio.is_empty(), "recording contains no audio samples");
        let started = Instant::now();
        let prepared = resample::to_whisper_rate(audio)?;
        let transcript = self
            .transcriber
            .transcribe(&prepared)
            .map_err(|err| ComparisonError::capability("speech-to-text", err))?;
        let transcribed_text = transcript.text();
        info!(
            transcriber = self.transcriber.name(),
            audio_secs = audio.duration_secs(),
            words = transcribed_text.split_whitespace().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "transcribed recording"
        );
        let result = self.orchestrator.compare(
            &transcribed_text,
            request.expected_text.as_deref(),
            request.mode,
        )?;
        Ok(result)
    }
}
