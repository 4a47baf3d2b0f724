use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::error::{Result, SublateError};
use crate::transcript::{Segment, Transcription};

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm).
///
/// Sub-millisecond precision is truncated, never rounded up: 0.9995s
/// renders as `00:00:00,999`. Boundary timestamps therefore bias one
/// millisecond early rather than carrying into the next second.
pub fn format_timestamp(seconds: f64) -> String {
    let whole = seconds.floor();
    let hours = (whole / 3600.0) as u64;
    let minutes = ((whole % 3600.0) / 60.0) as u64;
    let secs = (whole % 60.0) as u64;
    let millis = (((seconds - whole) * 1000.0) as u64).min(999);

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Render segments as SRT content: numbered blocks with 1-based contiguous
/// indices, blank-line separated, final entry blank-line-terminated.
pub fn write_captions(segments: &[Segment]) -> String {
    let mut content = String::new();

    for (index, segment) in segments.iter().enumerate() {
        content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_timestamp(segment.start),
            format_timestamp(segment.end),
            segment.text.trim()
        ));
    }

    content
}

/// Write the transcription to an SRT file.
pub async fn write_srt<P: AsRef<Path>>(
    transcription: &Transcription,
    output_path: P,
) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Writing subtitle file: {}", output_path.display());

    let content = write_captions(&transcription.segments);

    fs::write(output_path, content).await.map_err(|e| {
        SublateError::Serialization(format!(
            "Failed to write {}: {}",
            output_path.display(),
            e
        ))
    })?;

    info!("Subtitle file written ({} entries)", transcription.segments.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp_boundaries() {
        assert_eq!(format_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_timestamp(1.0), "00:00:01,000");
        assert_eq!(format_timestamp(60.0), "00:01:00,000");
        assert_eq!(format_timestamp(3600.0), "01:00:00,000");
        assert_eq!(format_timestamp(1.5), "00:00:01,500");
        assert_eq!(format_timestamp(61.25), "00:01:01,250");
    }

    #[test]
    fn test_format_timestamp_truncates_sub_millisecond() {
        assert_eq!(format_timestamp(0.9995), "00:00:00,999");
        assert_eq!(format_timestamp(59.9999), "00:00:59,999");
    }

    #[test]
    fn test_caption_indices_are_contiguous() {
        let segments: Vec<Segment> = (0..5)
            .map(|i| Segment::new(i as f64, i as f64 + 1.0, format!("line {}", i)))
            .collect();

        let content = write_captions(&segments);
        let indices: Vec<usize> = content
            .split("\n\n")
            .filter(|block| !block.is_empty())
            .map(|block| block.lines().next().unwrap().parse().unwrap())
            .collect();

        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_caption_block_layout() {
        let segments = vec![Segment::new(0.0, 2.5, "  hello  ")];
        let content = write_captions(&segments);
        assert_eq!(content, "1\n00:00:00,000 --> 00:00:02,500\nhello\n\n");
    }

    #[test]
    fn test_empty_segments_produce_empty_content() {
        assert_eq!(write_captions(&[]), "");
    }

    #[tokio::test]
    async fn test_write_srt_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.srt");
        let transcription = Transcription::new(
            vec![Segment::new(0.0, 1.0, "first"), Segment::new(1.0, 2.0, "second")],
            "en",
        );

        write_srt(&transcription, &path).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("1\n00:00:00,000 --> 00:00:01,000\nfirst\n"));
        assert!(content.ends_with("\n\n"));
    }
}
