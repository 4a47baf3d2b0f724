//! Duration estimates for operations that expose no progress callback.
//!
//! External transcoding and transcription tools report nothing while they
//! run, so the progress display is driven by a time estimate rather than a
//! measurement. These are deliberately rough linear models.

/// Seconds of ffmpeg work per megabyte of input.
const EXTRACTION_COST_PER_MB: f64 = 0.1;
/// Multiplier applied on top of the per-MB cost.
const EXTRACTION_SAFETY_FACTOR: f64 = 3.0;
/// Factor applied to audio duration for an unrecognized model class.
const DEFAULT_TRANSCRIPTION_FACTOR: f64 = 3.0;

/// Estimate audio extraction time from the input file size.
///
/// Linear in megabytes with a safety factor. `cap` bounds the estimate so
/// small files do not produce misleadingly long ETAs.
pub fn estimate_extraction_time(byte_size: u64, cap: Option<f64>) -> f64 {
    let mb = byte_size as f64 / (1024.0 * 1024.0);
    let estimate = mb * EXTRACTION_COST_PER_MB * EXTRACTION_SAFETY_FACTOR;
    match cap {
        Some(limit) => estimate.min(limit),
        None => estimate,
    }
}

/// Estimate transcription time from audio duration and model class.
pub fn estimate_transcription_time(duration_secs: f64, model_class: &str) -> f64 {
    let factor = match model_class {
        "tiny" => 2.0,
        "base" => 2.5,
        "small" => 3.0,
        "medium" => 3.5,
        "large" => 4.0,
        "large-v2" => 4.0,
        "large-v3" => 4.2,
        _ => DEFAULT_TRANSCRIPTION_FACTOR,
    };
    duration_secs * factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_estimate_is_linear() {
        let one_mb = estimate_extraction_time(1024 * 1024, None);
        let ten_mb = estimate_extraction_time(10 * 1024 * 1024, None);
        assert!((one_mb - 0.3).abs() < 1e-9);
        assert!((ten_mb - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_extraction_estimate_respects_cap() {
        let huge = estimate_extraction_time(10_000 * 1024 * 1024, Some(30.0));
        assert_eq!(huge, 30.0);

        // Cap only bounds from above
        let tiny = estimate_extraction_time(1024 * 1024, Some(30.0));
        assert!(tiny < 30.0);
    }

    #[test]
    fn test_transcription_factors() {
        assert_eq!(estimate_transcription_time(60.0, "tiny"), 120.0);
        assert_eq!(estimate_transcription_time(60.0, "medium"), 210.0);
        assert_eq!(estimate_transcription_time(60.0, "large-v3"), 252.0);
    }

    #[test]
    fn test_unknown_model_class_uses_default_factor() {
        assert_eq!(estimate_transcription_time(60.0, "turbo-x"), 180.0);
    }
}
