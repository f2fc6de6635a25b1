//! Spoken-language practice evaluation.
//!
//! A learner's recording is transcribed and compared against the text they
//! were asked to read, either word by word or by semantic similarity.

pub mod audio;
pub mod cli;
pub mod comparison;
pub mod config;
pub mod embedding;
pub mod practice;
pub mod transcription;
pub mod types;
