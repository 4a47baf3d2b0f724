use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use tracing::info;

use crate::config::TranscriberConfig;
use crate::error::{Result, SublateError};
use crate::transcript::{Segment, Transcription};
use super::{TranscribeTask, TranscriberTrait};

/// Whisper CLI JSON output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperOutput {
    pub segments: Vec<WhisperSegment>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl WhisperOutput {
    /// Map the tool-specific format into the crate's transcription model.
    /// The declared language wins only when the tool reports none.
    pub fn into_transcription(self, declared_language: &str) -> Transcription {
        let segments = self
            .segments
            .into_iter()
            .map(|seg| Segment::new(seg.start, seg.end, seg.text.trim()))
            .collect();

        let language = self
            .language
            .unwrap_or_else(|| declared_language.to_string());

        Transcription::new(segments, language)
    }
}

/// Whisper command-line implementation of the recognizer capability.
pub struct WhisperCliTranscriber {
    config: TranscriberConfig,
    model_class: String,
    device: String,
}

impl WhisperCliTranscriber {
    pub fn new(config: TranscriberConfig, model_class: String, device: String) -> Self {
        Self {
            config,
            model_class,
            device,
        }
    }
}

#[async_trait]
impl TranscriberTrait for WhisperCliTranscriber {
    async fn transcribe(
        &self,
        audio_path: &Path,
        language: &str,
        task: TranscribeTask,
    ) -> Result<Transcription> {
        info!(
            "Transcribing {} (model={}, device={}, task={})",
            audio_path.display(),
            self.model_class,
            self.device,
            task.as_str()
        );

        let temp_dir = tempfile::tempdir().map_err(|e| {
            SublateError::Transcription(format!("Failed to create temp directory: {}", e))
        })?;
        let output_dir = temp_dir.path();

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg(audio_path)
            .arg("--model")
            .arg(&self.model_class)
            .arg("--device")
            .arg(&self.device)
            .arg("--language")
            .arg(language)
            .arg("--task")
            .arg(task.as_str())
            .arg("--output_dir")
            .arg(output_dir)
            .arg("--output_format")
            .arg("json");

        let output = cmd.output().map_err(|e| {
            SublateError::Transcription(format!("Failed to execute recognizer: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SublateError::Transcription(format!(
                "Recognizer failed: {}",
                stderr
            )));
        }

        let audio_stem = audio_path
            .file_stem()
            .ok_or_else(|| SublateError::Transcription("Invalid audio filename".to_string()))?;
        let json_file = output_dir.join(format!("{}.json", audio_stem.to_string_lossy()));

        let json_content = std::fs::read_to_string(&json_file).map_err(|e| {
            SublateError::Transcription(format!("Failed to read recognizer output: {}", e))
        })?;

        let whisper_output: WhisperOutput = serde_json::from_str(&json_content).map_err(|e| {
            SublateError::Transcription(format!("Failed to parse recognizer JSON: {}", e))
        })?;

        let transcription = whisper_output.into_transcription(language);
        info!(
            "Transcription produced {} segments (language={})",
            transcription.segments.len(),
            transcription.language
        );

        Ok(transcription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whisper_output_maps_to_transcription() {
        let json = r#"{
            "segments": [
                {"start": 0.0, "end": 2.0, "text": " konnichiwa "},
                {"start": 2.0, "end": 4.5, "text": "sayonara"}
            ],
            "language": "ja"
        }"#;

        let output: WhisperOutput = serde_json::from_str(json).unwrap();
        let transcription = output.into_transcription("en");

        assert_eq!(transcription.language, "ja");
        assert_eq!(transcription.segments.len(), 2);
        assert_eq!(transcription.segments[0].text, "konnichiwa");
        assert_eq!(transcription.segments[1].end, 4.5);
    }

    #[test]
    fn test_declared_language_used_when_tool_reports_none() {
        let output = WhisperOutput {
            segments: vec![],
            language: None,
        };
        let transcription = output.into_transcription("ja");
        assert_eq!(transcription.language, "ja");
    }

    #[test]
    fn test_task_flag_values() {
        assert_eq!(TranscribeTask::Transcribe.as_str(), "transcribe");
        assert_eq!(TranscribeTask::Translate.as_str(), "translate");
    }
}
