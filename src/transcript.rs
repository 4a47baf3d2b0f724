use serde::{Deserialize, Serialize};

/// A time-bounded unit of transcribed or translated text.
///
/// `start <= end`, both in seconds from the beginning of the media. `text`
/// is the one mutable field: translation stages rewrite it in place, one
/// writer at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// The authoritative result of one transcription run: chronological
/// segments plus the detected or declared source language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    pub segments: Vec<Segment>,
    pub language: String,
}

impl Transcription {
    pub fn new(segments: Vec<Segment>, language: impl Into<String>) -> Self {
        Self {
            segments,
            language: language.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
