use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, SublateError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub languages: LanguageConfig,
    pub audio: AudioConfig,
    pub transcriber: TranscriberConfig,
    pub translate: TranslateConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Default source language code
    pub source: String,
    /// Default target language code
    pub target: String,
    /// Allow routing through English when no direct translation model exists
    pub use_english_intermediate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate for the extracted PCM stream
    pub sample_rate: u32,
    /// Channel count for the extracted PCM stream
    pub channels: u32,
    /// Filename of the temporary audio artifact (created under the system temp dir)
    pub temp_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Path to the whisper CLI binary
    pub binary_path: String,
    /// Model class override; empty means auto-select from host resources
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Translation server endpoint URL
    pub endpoint: String,
    /// Model family prefix, combined with language pairs as {family}-{src}-{tgt}
    pub model_family: String,
    /// HTTP timeout for a single translation call, in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to the ffmpeg binary
    pub binary_path: String,
    /// Path to the ffprobe binary used for duration probing
    pub probe_binary_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            languages: LanguageConfig {
                source: "ja".to_string(),
                target: "zh".to_string(),
                use_english_intermediate: false,
            },
            audio: AudioConfig {
                sample_rate: 16000,
                channels: 1,
                temp_file: "sublate_audio.wav".to_string(),
            },
            transcriber: TranscriberConfig {
                binary_path: "whisper".to_string(),
                model: String::new(),
            },
            translate: TranslateConfig {
                endpoint: "http://localhost:11434".to_string(),
                model_family: "opus-mt".to_string(),
                request_timeout_secs: 300,
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                probe_binary_path: "ffprobe".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SublateError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SublateError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SublateError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SublateError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_languages() {
        let config = Config::default();
        assert_eq!(config.languages.source, "ja");
        assert_eq!(config.languages.target, "zh");
        assert!(!config.languages.use_english_intermediate);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.audio.sample_rate, 16000);
        assert_eq!(parsed.audio.channels, 1);
        assert_eq!(parsed.translate.model_family, "opus-mt");
    }
}
