use tracing::{info, warn};

use crate::error::Result;
use crate::transcript::{Segment, Transcription};
use super::{ModelSpec, TranslationOutcome, TranslationProvider, Translator};

/// Orchestrates translation capability candidates in precedence order:
///
/// 1. direct `{family}-{src}-{tgt}` model;
/// 2. English-intermediate two-hop (opt-in): `{family}-{src}-en` falling
///    back to `{family}-mul-en`, then `{family}-en-{tgt}`;
/// 3. English-only: the same source-to-English candidates, when the caller
///    did not opt into intermediate mode.
///
/// Each stage is tried only if the previous one is unavailable. Quality
/// failures never abort the run: a segment whose translation fails keeps
/// its original text and its siblings are still processed.
pub struct TranslationChain {
    provider: Box<dyn TranslationProvider>,
    model_family: String,
}

impl TranslationChain {
    pub fn new(provider: Box<dyn TranslationProvider>, model_family: String) -> Self {
        Self {
            provider,
            model_family,
        }
    }

    /// Translate every segment in place from `src_lang` to `tgt_lang`.
    /// Segment iteration is always chronological; whitespace-only text is
    /// never submitted to a translator.
    pub async fn translate_segments(
        &self,
        transcription: &mut Transcription,
        src_lang: &str,
        tgt_lang: &str,
        allow_english_intermediate: bool,
    ) -> Result<()> {
        info!("Translating from {} to {}", src_lang, tgt_lang);

        // Stage 1: direct pair
        if let Some(direct) = self.load_first(&[self.direct_spec(src_lang, tgt_lang)]).await {
            let outcomes = translate_single_hop(&mut transcription.segments, direct.as_ref()).await;
            log_summary("direct", &outcomes);
            return Ok(());
        }

        // Stage 2: English-intermediate two-hop, opt-in only
        if allow_english_intermediate && tgt_lang != "en" {
            let Some(to_english) = self.load_first(&self.to_english_specs(src_lang)).await else {
                warn!("No source-to-English model available, segments left untranslated");
                return Ok(());
            };

            match self.load_first(&[self.from_english_spec(tgt_lang)]).await {
                Some(from_english) => {
                    let outcomes = translate_two_hop(
                        &mut transcription.segments,
                        to_english.as_ref(),
                        from_english.as_ref(),
                    )
                    .await;
                    log_summary("english-intermediate", &outcomes);
                }
                None => {
                    // Second hop unavailable: degrade to source-to-English
                    // rather than failing the run.
                    warn!(
                        "English-to-{} model unavailable, degrading to English output",
                        tgt_lang
                    );
                    let outcomes =
                        translate_single_hop(&mut transcription.segments, to_english.as_ref())
                            .await;
                    log_summary("source-to-english", &outcomes);
                }
            }
            return Ok(());
        }

        // Stage 3: English-only fallback
        match self.load_first(&self.to_english_specs(src_lang)).await {
            Some(to_english) => {
                let outcomes =
                    translate_single_hop(&mut transcription.segments, to_english.as_ref()).await;
                log_summary("english-only", &outcomes);
            }
            None => {
                warn!("No translation model available, segments left untranslated");
            }
        }

        Ok(())
    }

    fn direct_spec(&self, src_lang: &str, tgt_lang: &str) -> ModelSpec {
        ModelSpec::new(
            format!("{}-{}-{}", self.model_family, src_lang, tgt_lang),
            src_lang,
            tgt_lang,
        )
    }

    /// Candidates for the source-to-English hop: the specific pairing
    /// first, then the generic multilingual model.
    fn to_english_specs(&self, src_lang: &str) -> Vec<ModelSpec> {
        vec![
            ModelSpec::new(
                format!("{}-{}-en", self.model_family, src_lang),
                src_lang,
                "en",
            ),
            ModelSpec::new(format!("{}-mul-en", self.model_family), src_lang, "en"),
        ]
    }

    fn from_english_spec(&self, tgt_lang: &str) -> ModelSpec {
        ModelSpec::new(
            format!("{}-en-{}", self.model_family, tgt_lang),
            "en",
            tgt_lang,
        )
    }

    /// Load candidates in order, short-circuiting on the first success.
    async fn load_first(&self, specs: &[ModelSpec]) -> Option<Box<dyn Translator>> {
        for spec in specs {
            match self.provider.load_translator(spec).await {
                Ok(translator) => {
                    info!("Loaded translation model: {}", spec.identifier);
                    return Some(translator);
                }
                Err(e) => {
                    warn!("Translation model {} unavailable: {}", spec.identifier, e);
                }
            }
        }
        None
    }
}

/// Translate each non-empty segment independently. A failed segment keeps
/// its original text; later segments are still attempted.
async fn translate_single_hop(
    segments: &mut [Segment],
    translator: &dyn Translator,
) -> Vec<TranslationOutcome> {
    let total = segments.len();
    let mut outcomes = Vec::with_capacity(total);

    for (idx, segment) in segments.iter_mut().enumerate() {
        if segment.text.trim().is_empty() {
            outcomes.push(TranslationOutcome::Skipped {
                reason: "empty".to_string(),
            });
            continue;
        }

        match translator.translate(&segment.text).await {
            Ok(translation) => {
                segment.text = translation;
                outcomes.push(TranslationOutcome::Translated);
            }
            Err(e) => {
                warn!(
                    "Translation failed for segment {}/{}: {}, keeping original text",
                    idx + 1,
                    total,
                    e
                );
                outcomes.push(TranslationOutcome::Skipped {
                    reason: e.to_string(),
                });
            }
        }
    }

    outcomes
}

/// Two sequential hops per segment. A failure at either hop keeps the
/// segment's original text; partial-hop text is never written back.
async fn translate_two_hop(
    segments: &mut [Segment],
    first: &dyn Translator,
    second: &dyn Translator,
) -> Vec<TranslationOutcome> {
    let total = segments.len();
    let mut outcomes = Vec::with_capacity(total);

    for (idx, segment) in segments.iter_mut().enumerate() {
        if segment.text.trim().is_empty() {
            outcomes.push(TranslationOutcome::Skipped {
                reason: "empty".to_string(),
            });
            continue;
        }

        let hopped = match first.translate(&segment.text).await {
            Ok(english) => second.translate(&english).await,
            Err(e) => Err(e),
        };

        match hopped {
            Ok(translation) => {
                segment.text = translation;
                outcomes.push(TranslationOutcome::Translated);
            }
            Err(e) => {
                warn!(
                    "Two-hop translation failed for segment {}/{}: {}, keeping original text",
                    idx + 1,
                    total,
                    e
                );
                outcomes.push(TranslationOutcome::Skipped {
                    reason: e.to_string(),
                });
            }
        }
    }

    outcomes
}

fn log_summary(stage: &str, outcomes: &[TranslationOutcome]) {
    let translated = outcomes
        .iter()
        .filter(|o| matches!(o, TranslationOutcome::Translated))
        .count();
    info!(
        "Translation stage '{}' finished: {}/{} segments translated",
        stage,
        translated,
        outcomes.len()
    );
}
