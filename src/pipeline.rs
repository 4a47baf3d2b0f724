use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, SublateError};
use crate::estimate::{estimate_extraction_time, estimate_transcription_time};
use crate::media::{MediaExtractorFactory, MediaExtractorTrait};
use crate::progress::{ConsoleProgressObserver, ProgressReporter, SimulatedProgress};
use crate::subtitle::write_srt;
use crate::transcribe::{
    select_model_and_device, ModelChoice, TranscribeTask, TranscriberFactory, TranscriberTrait,
};
use crate::transcript::Transcription;
use crate::translate::{HttpTranslationProvider, TranslationChain};

/// Cap on the synthetic extraction estimate so trivial files do not
/// advertise absurd ETAs.
const EXTRACTION_ESTIMATE_CAP_SECS: f64 = 30.0;

/// All stage reporters run on a percentage scale.
const PROGRESS_TOTAL: f64 = 100.0;

/// The transcription-translation pipeline root.
///
/// Stages run strictly sequentially on the calling task:
/// validate -> extract -> transcribe -> (translate iff src != tgt) ->
/// serialize -> cleanup. External capability calls block with no timeout;
/// a stuck recognizer blocks the run indefinitely. The temporary audio
/// artifact is removed on every exit path.
pub struct Pipeline {
    config: Config,
    media: Box<dyn MediaExtractorTrait>,
    transcriber: Box<dyn TranscriberTrait>,
    chain: TranslationChain,
    model_choice: ModelChoice,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        // Model selection is an explicit, side-effect-free call made once
        // per run; a configured model class overrides the selected one.
        let mut model_choice = select_model_and_device();
        if !config.transcriber.model.is_empty() {
            model_choice.model_class = config.transcriber.model.clone();
        }
        info!(
            "Selected model class '{}' on device '{}'",
            model_choice.model_class, model_choice.device
        );

        let media =
            MediaExtractorFactory::create_extractor(config.media.clone(), config.audio.clone());
        media.check_availability()?;

        let transcriber = TranscriberFactory::create_default(
            config.transcriber.clone(),
            model_choice.model_class.clone(),
            model_choice.device.clone(),
        );

        let chain = TranslationChain::new(
            Box::new(HttpTranslationProvider::new(config.translate.clone())),
            config.translate.model_family.clone(),
        );

        Ok(Self {
            config,
            media,
            transcriber,
            chain,
            model_choice,
        })
    }

    /// Constructor with injected capabilities, used by tests.
    pub fn with_components(
        config: Config,
        media: Box<dyn MediaExtractorTrait>,
        transcriber: Box<dyn TranscriberTrait>,
        chain: TranslationChain,
        model_choice: ModelChoice,
    ) -> Self {
        Self {
            config,
            media,
            transcriber,
            chain,
            model_choice,
        }
    }

    /// Run the full pipeline for one video. Returns the caption file path,
    /// written beside the source video as `{stem}_{tgt_lang}.srt`.
    pub async fn generate_subtitles(
        &self,
        video_path: &Path,
        src_lang: &str,
        tgt_lang: &str,
        use_english_intermediate: bool,
    ) -> Result<PathBuf> {
        info!(
            "Generating subtitles for {} ({} -> {})",
            video_path.display(),
            src_lang,
            tgt_lang
        );

        // Pre-flight, before any resource allocation
        if !video_path.exists() {
            return Err(SublateError::InputNotFound(
                video_path.display().to_string(),
            ));
        }

        let audio_path = std::env::temp_dir().join(&self.config.audio.temp_file);
        let _cleanup = TempArtifact::new(audio_path.clone());

        self.extract_with_progress(video_path, &audio_path).await?;

        let mut transcription = self.transcribe_with_progress(&audio_path, src_lang).await?;

        if src_lang != tgt_lang {
            self.chain
                .translate_segments(&mut transcription, src_lang, tgt_lang, use_english_intermediate)
                .await?;
        } else {
            info!("Source and target language match, skipping translation");
        }

        let output_path = caption_output_path(video_path, tgt_lang)?;
        write_srt(&transcription, &output_path).await?;

        info!("Subtitle generation complete: {}", output_path.display());
        Ok(output_path)
    }

    /// Extract audio from a video file without running the rest of the
    /// pipeline.
    pub async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        if !video_path.exists() {
            return Err(SublateError::InputNotFound(
                video_path.display().to_string(),
            ));
        }
        self.extract_with_progress(video_path, audio_path).await
    }

    /// Transcribe an audio file straight to SRT without translation.
    pub async fn transcribe_audio(
        &self,
        audio_path: &Path,
        output_path: &Path,
        language: &str,
    ) -> Result<()> {
        if !audio_path.exists() {
            return Err(SublateError::InputNotFound(
                audio_path.display().to_string(),
            ));
        }
        let transcription = self.transcribe_with_progress(audio_path, language).await?;
        write_srt(&transcription, output_path).await
    }

    /// Run extraction while a background task animates an estimated
    /// progress curve. The simulation is joined before the reporter is
    /// completed, so completion is observed exactly once on this task
    /// regardless of which extraction path succeeded.
    async fn extract_with_progress(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        let byte_size = std::fs::metadata(video_path).map(|m| m.len()).unwrap_or(0);
        let estimate = estimate_extraction_time(byte_size, Some(EXTRACTION_ESTIMATE_CAP_SECS));

        let reporter = Arc::new(ProgressReporter::new(PROGRESS_TOTAL));
        reporter.add_observer(Box::new(ConsoleProgressObserver::new(
            "Extracting audio",
            PROGRESS_TOTAL,
        )));

        let simulation =
            SimulatedProgress::start(Arc::clone(&reporter), estimate, "extracting audio");
        let result = self.media.extract_audio(video_path, audio_path).await;
        simulation.finish().await;

        if result.is_ok() {
            reporter.complete();
        }
        result
    }

    /// Run transcription under a simulated progress curve sized from the
    /// probed media duration; without duration metadata the stage runs
    /// silently.
    async fn transcribe_with_progress(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<Transcription> {
        let reporter = Arc::new(ProgressReporter::new(PROGRESS_TOTAL));
        reporter.add_observer(Box::new(ConsoleProgressObserver::new(
            "Transcribing",
            PROGRESS_TOTAL,
        )));

        let simulation = match self.media.probe_duration(audio_path).await {
            Some(duration) => {
                let estimate =
                    estimate_transcription_time(duration, &self.model_choice.model_class);
                Some(SimulatedProgress::start(
                    Arc::clone(&reporter),
                    estimate,
                    "recognizing speech",
                ))
            }
            None => None,
        };

        let result = self
            .transcriber
            .transcribe(audio_path, language, TranscribeTask::Transcribe)
            .await;

        if let Some(simulation) = simulation {
            simulation.finish().await;
        }
        if result.is_ok() {
            reporter.complete();
        }
        result
    }
}

/// Owns the temporary audio artifact for the duration of one run and
/// removes it on every exit path, success or failure.
struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(
                    "Failed to remove temporary audio file {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

fn caption_output_path(video_path: &Path, tgt_lang: &str) -> Result<PathBuf> {
    let stem = video_path
        .file_stem()
        .ok_or_else(|| SublateError::Config("Invalid video filename".to_string()))?;
    let dir = video_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(format!("{}_{}.srt", stem.to_string_lossy(), tgt_lang)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SublateError;
    use crate::transcript::Segment;
    use crate::translate::{ModelSpec, TranslationProvider, Translator};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct FakeMedia {
        fail_extraction: bool,
    }

    #[async_trait]
    impl MediaExtractorTrait for FakeMedia {
        async fn extract_audio(&self, _video_path: &Path, audio_path: &Path) -> Result<()> {
            if self.fail_extraction {
                return Err(SublateError::Extraction("scripted failure".to_string()));
            }
            std::fs::write(audio_path, b"pcm").unwrap();
            Ok(())
        }

        async fn probe_duration(&self, _media_path: &Path) -> Option<f64> {
            Some(2.0)
        }

        fn check_availability(&self) -> Result<()> {
            Ok(())
        }
    }

    struct FakeTranscriber {
        fail: bool,
        texts: Vec<&'static str>,
    }

    #[async_trait]
    impl TranscriberTrait for FakeTranscriber {
        async fn transcribe(
            &self,
            _audio_path: &Path,
            language: &str,
            _task: TranscribeTask,
        ) -> Result<Transcription> {
            if self.fail {
                return Err(SublateError::Transcription("scripted failure".to_string()));
            }
            let segments = self
                .texts
                .iter()
                .enumerate()
                .map(|(i, t)| Segment::new(i as f64, i as f64 + 1.0, *t))
                .collect();
            Ok(Transcription::new(segments, language))
        }
    }

    struct RecordingProvider {
        available: HashSet<String>,
        load_attempts: Mutex<Vec<String>>,
    }

    impl RecordingProvider {
        fn new(available: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                available: available.iter().map(|s| s.to_string()).collect(),
                load_attempts: Mutex::new(Vec::new()),
            })
        }
    }

    struct TaggingTranslator {
        tag: String,
    }

    #[async_trait]
    impl Translator for TaggingTranslator {
        async fn translate(&self, text: &str) -> Result<String> {
            Ok(format!("{}:{}", self.tag, text))
        }
    }

    #[async_trait]
    impl TranslationProvider for Arc<RecordingProvider> {
        async fn load_translator(&self, spec: &ModelSpec) -> Result<Box<dyn Translator>> {
            self.load_attempts
                .lock()
                .unwrap()
                .push(spec.identifier.clone());

            if !self.available.contains(&spec.identifier) {
                return Err(SublateError::Translation(format!(
                    "model '{}' not available",
                    spec.identifier
                )));
            }
            Ok(Box::new(TaggingTranslator {
                tag: spec.identifier.clone(),
            }))
        }
    }

    fn test_pipeline(
        temp_file: &str,
        media: FakeMedia,
        transcriber: FakeTranscriber,
        provider: &Arc<RecordingProvider>,
    ) -> Pipeline {
        let mut config = Config::default();
        config.audio.temp_file = temp_file.to_string();

        let chain = TranslationChain::new(Box::new(Arc::clone(provider)), "opus-mt".to_string());

        Pipeline::with_components(
            config,
            Box::new(media),
            Box::new(transcriber),
            chain,
            ModelChoice {
                model_class: "small".to_string(),
                device: "cpu".to_string(),
            },
        )
    }

    fn temp_audio_path(temp_file: &str) -> PathBuf {
        std::env::temp_dir().join(temp_file)
    }

    #[tokio::test]
    async fn test_missing_input_fails_before_any_work() {
        let provider = RecordingProvider::new(&[]);
        let pipeline = test_pipeline(
            "pipeline_missing_input.wav",
            FakeMedia {
                fail_extraction: false,
            },
            FakeTranscriber {
                fail: false,
                texts: vec![],
            },
            &provider,
        );

        let err = pipeline
            .generate_subtitles(Path::new("/nonexistent/video.mp4"), "ja", "zh", false)
            .await
            .unwrap_err();

        assert!(matches!(err, SublateError::InputNotFound(_)));
        assert!(provider.load_attempts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_equal_languages_skip_translation_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"video bytes").unwrap();

        let provider = RecordingProvider::new(&["opus-mt-ja-zh"]);
        let pipeline = test_pipeline(
            "pipeline_equal_langs.wav",
            FakeMedia {
                fail_extraction: false,
            },
            FakeTranscriber {
                fail: false,
                texts: vec!["konnichiwa", "sayonara"],
            },
            &provider,
        );

        let output = pipeline
            .generate_subtitles(&video, "ja", "ja", false)
            .await
            .unwrap();

        // No translation capability was ever loaded
        assert!(provider.load_attempts.lock().unwrap().is_empty());

        // Segments passed through verbatim
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("konnichiwa"));
        assert!(content.contains("sayonara"));
        assert_eq!(output, dir.path().join("clip_ja.srt"));
    }

    #[tokio::test]
    async fn test_direct_failure_without_intermediate_yields_english() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"video bytes").unwrap();

        // Direct ja->zh unavailable; only the English candidate loads.
        let provider = RecordingProvider::new(&["opus-mt-ja-en"]);
        let pipeline = test_pipeline(
            "pipeline_english_fallback.wav",
            FakeMedia {
                fail_extraction: false,
            },
            FakeTranscriber {
                fail: false,
                texts: vec!["konnichiwa"],
            },
            &provider,
        );

        let output = pipeline
            .generate_subtitles(&video, "ja", "zh", false)
            .await
            .unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("opus-mt-ja-en:konnichiwa"));
        assert_eq!(
            *provider.load_attempts.lock().unwrap(),
            vec!["opus-mt-ja-zh", "opus-mt-ja-en"]
        );
    }

    #[tokio::test]
    async fn test_temp_audio_removed_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"video bytes").unwrap();

        let temp_file = "pipeline_cleanup_success.wav";
        let provider = RecordingProvider::new(&[]);
        let pipeline = test_pipeline(
            temp_file,
            FakeMedia {
                fail_extraction: false,
            },
            FakeTranscriber {
                fail: false,
                texts: vec!["line"],
            },
            &provider,
        );

        pipeline
            .generate_subtitles(&video, "ja", "ja", false)
            .await
            .unwrap();

        assert!(!temp_audio_path(temp_file).exists());
    }

    #[tokio::test]
    async fn test_temp_audio_removed_on_extraction_failure() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"video bytes").unwrap();

        let temp_file = "pipeline_cleanup_extract_fail.wav";
        let provider = RecordingProvider::new(&[]);
        let pipeline = test_pipeline(
            temp_file,
            FakeMedia {
                fail_extraction: true,
            },
            FakeTranscriber {
                fail: false,
                texts: vec![],
            },
            &provider,
        );

        let err = pipeline
            .generate_subtitles(&video, "ja", "ja", false)
            .await
            .unwrap_err();

        assert!(matches!(err, SublateError::Extraction(_)));
        assert!(!temp_audio_path(temp_file).exists());
    }

    #[tokio::test]
    async fn test_temp_audio_removed_on_transcription_failure() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"video bytes").unwrap();

        let temp_file = "pipeline_cleanup_transcribe_fail.wav";
        let provider = RecordingProvider::new(&[]);
        let pipeline = test_pipeline(
            temp_file,
            FakeMedia {
                fail_extraction: false,
            },
            FakeTranscriber {
                fail: true,
                texts: vec![],
            },
            &provider,
        );

        let err = pipeline
            .generate_subtitles(&video, "ja", "ja", false)
            .await
            .unwrap_err();

        assert!(matches!(err, SublateError::Transcription(_)));
        assert!(!temp_audio_path(temp_file).exists());
    }

    #[test]
    fn test_caption_path_lands_beside_video() {
        let path = caption_output_path(Path::new("/videos/movie.mkv"), "zh").unwrap();
        assert_eq!(path, PathBuf::from("/videos/movie_zh.srt"));
    }
}
