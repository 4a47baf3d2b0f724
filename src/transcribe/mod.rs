// Speech recognition capability
//
// The recognizer is an external tool wrapped behind a trait:
// - WhisperCli: whisper command-line implementation
// - select: host-resource-based model and device selection

pub mod select;
pub mod whisper_cli;

use async_trait::async_trait;
use std::path::Path;

pub use select::*;

use crate::config::TranscriberConfig;
use crate::error::Result;
use crate::transcript::Transcription;

/// Recognizer task mode. `Translate` is the recognizer's built-in
/// speech-to-English mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscribeTask {
    Transcribe,
    Translate,
}

impl TranscribeTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcribe => "transcribe",
            Self::Translate => "translate",
        }
    }
}

/// Main trait for transcription operations
#[async_trait]
pub trait TranscriberTrait: Send + Sync {
    /// Transcribe the audio file with the declared source language.
    async fn transcribe(
        &self,
        audio_path: &Path,
        language: &str,
        task: TranscribeTask,
    ) -> Result<Transcription>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Create the default transcriber (whisper CLI) for the selected model
    /// and device.
    pub fn create_default(
        config: TranscriberConfig,
        model_class: String,
        device: String,
    ) -> Box<dyn TranscriberTrait> {
        Box::new(whisper_cli::WhisperCliTranscriber::new(
            config,
            model_class,
            device,
        ))
    }
}
