//! Core value types shared by the audio and transcription stages

/// Raw audio data representation (mono, f32 samples)
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples, normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g., 44100)
    pub sample_rate: u32,
}

impl AudioData {
    /// Duration of the clip in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Transcription output containing timestamped segments
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Concatenate segment texts with single spaces, the way learners read them back
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A segment of transcribed audio with timing information
#[derive(Debug, Clone)]
pub struct Segment {
    pub text: String,
    pub start_time: f64, // seconds
    pub end_time: f64,   // seconds
}
