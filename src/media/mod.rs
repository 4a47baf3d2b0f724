// Media demuxer capability
//
// Wraps the external extraction tool behind a trait so the pipeline can be
// tested without ffmpeg installed:
// - Commands: argument builder and executor abstractions
// - Extractor: ffmpeg-backed implementation with a subprocess fallback path

pub mod commands;
pub mod extractor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use extractor::*;

use crate::config::{AudioConfig, MediaConfig};
use crate::error::Result;

/// Main trait for media demuxing operations
#[async_trait]
pub trait MediaExtractorTrait: Send + Sync {
    /// Extract a normalized mono PCM stream from the video into `audio_path`,
    /// overwriting any pre-existing file there.
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()>;

    /// Best-effort media duration in seconds. Never errors; `None` when the
    /// metadata cannot be read.
    async fn probe_duration(&self, media_path: &Path) -> Option<f64>;

    /// Check if the extraction tool is available
    fn check_availability(&self) -> Result<()>;
}

/// Factory for creating media extractor instances
pub struct MediaExtractorFactory;

impl MediaExtractorFactory {
    /// Create the default extractor implementation (ffmpeg-based)
    pub fn create_extractor(media: MediaConfig, audio: AudioConfig) -> Box<dyn MediaExtractorTrait> {
        Box::new(extractor::FfmpegExtractor::new(media, audio))
    }
}
