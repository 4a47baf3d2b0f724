use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};

use crate::config::{AudioConfig, MediaConfig};
use crate::error::{Result, SublateError};
use super::{MediaCommandBuilder, MediaExtractorTrait};

/// FFmpeg-backed demuxer implementation.
///
/// Extraction runs the structured command first and retries exactly once
/// via a raw subprocess invocation with equivalent flags; the primary path
/// is never attempted twice.
pub struct FfmpegExtractor {
    media: MediaConfig,
    audio: AudioConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegExtractor {
    pub fn new(media: MediaConfig, audio: AudioConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&media.binary_path);

        Self {
            media,
            audio,
            command_builder,
        }
    }

    /// Raw subprocess fallback with flags equivalent to the primary path.
    fn extract_audio_fallback(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        // Validate inputs before spawning the fallback process
        if !video_path.exists() {
            return Err(SublateError::Extraction(format!(
                "Input file does not exist: {}",
                video_path.display()
            )));
        }
        if !audio_path.is_absolute() {
            return Err(SublateError::Extraction(format!(
                "Audio path must be absolute: {}",
                audio_path.display()
            )));
        }

        let output = Command::new(&self.media.binary_path)
            .arg("-i")
            .arg(video_path)
            .arg("-ar")
            .arg(self.audio.sample_rate.to_string())
            .arg("-ac")
            .arg(self.audio.channels.to_string())
            .arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg("-copyts")
            .arg(audio_path)
            .output()
            .map_err(|e| {
                SublateError::Extraction(format!("Failed to execute fallback extraction: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SublateError::Extraction(format!(
                "Fallback extraction failed: {}",
                stderr
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl MediaExtractorTrait for FfmpegExtractor {
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        info!(
            "Extracting audio from {} to {}",
            video_path.display(),
            audio_path.display()
        );

        let command = self.command_builder.extract_audio(
            video_path,
            audio_path,
            self.audio.sample_rate,
            self.audio.channels,
        );

        match command.execute().await {
            Ok(()) => {
                info!("Audio extraction completed");
                Ok(())
            }
            Err(primary_error) => {
                warn!(
                    "Primary extraction failed ({}), retrying via subprocess fallback",
                    primary_error
                );

                self.extract_audio_fallback(video_path, audio_path)
                    .map_err(|fallback_error| {
                        SublateError::Extraction(format!(
                            "Both extraction paths failed: primary: {}; fallback: {}",
                            primary_error, fallback_error
                        ))
                    })?;

                info!("Audio extraction completed via fallback");
                Ok(())
            }
        }
    }

    async fn probe_duration(&self, media_path: &Path) -> Option<f64> {
        let output = Command::new(&self.media.probe_binary_path)
            .arg("-v")
            .arg("error")
            .arg("-print_format")
            .arg("json")
            .arg("-show_streams")
            .arg("-show_format")
            .arg(media_path)
            .output()
            .ok()?;

        if !output.status.success() {
            debug!(
                "ffprobe failed for {}: {}",
                media_path.display(),
                String::from_utf8_lossy(&output.stderr)
            );
            return None;
        }

        let probe: ProbeOutput = serde_json::from_slice(&output.stdout).ok()?;

        // Stream-level duration first, container-level second
        for stream in &probe.streams {
            if let Some(duration) = stream.duration.as_deref().and_then(|d| d.parse().ok()) {
                return Some(duration);
            }
        }

        probe
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse().ok())
    }

    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.media.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| SublateError::Extraction(format!("Demuxer not found: {}", e)))?;

        if output.status.success() {
            info!("Media demuxer is available");
            Ok(())
        } else {
            Err(SublateError::Extraction(
                "Demuxer version check failed".to_string(),
            ))
        }
    }
}

/// ffprobe JSON output, limited to the duration fields
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}
