use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, SublateError};
use super::{ModelSpec, TranslationProvider, Translator};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// HTTP-backed translation provider. Loading a model checks its
/// availability on the server; the returned translator is pinned to one
/// language pair.
pub struct HttpTranslationProvider {
    client: Client,
    config: TranslateConfig,
}

impl HttpTranslationProvider {
    pub fn new(config: TranslateConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("HTTP client creation should not fail");

        Self { client, config }
    }
}

#[async_trait]
impl TranslationProvider for HttpTranslationProvider {
    async fn load_translator(&self, spec: &ModelSpec) -> Result<Box<dyn Translator>> {
        let url = format!("{}/api/show", self.config.endpoint);
        let request = json!({ "name": spec.identifier });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                SublateError::Translation(format!("Failed to reach translation server: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(SublateError::Translation(format!(
                "Translation model '{}' not available on server",
                spec.identifier
            )));
        }

        Ok(Box::new(HttpTranslator {
            client: self.client.clone(),
            endpoint: self.config.endpoint.clone(),
            model: spec.identifier.clone(),
            target_language: spec.target.clone(),
        }))
    }
}

/// A loaded server-side model for one language pair.
pub struct HttpTranslator {
    client: Client,
    endpoint: String,
    model: String,
    target_language: String,
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let prompt = build_translation_prompt(text, &self.target_language);

        let request = TranslationRequest {
            model: self.model.clone(),
            prompt,
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.endpoint);
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SublateError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SublateError::Translation(format!(
                "Translation server error {}: {}",
                status, error_text
            )));
        }

        let translation_response: TranslationResponse = response
            .json()
            .await
            .map_err(|e| SublateError::Translation(format!("Failed to parse response: {}", e)))?;

        let raw_response = translation_response.response.trim().to_string();
        debug!("Raw translation response: {}", raw_response);

        if raw_response.is_empty() {
            return Err(SublateError::Translation(
                "Empty translation received".to_string(),
            ));
        }

        if let Ok(result) = serde_json::from_str::<TranslationResult>(&raw_response) {
            let text = result.text.trim().to_string();
            if text.is_empty() {
                return Err(SublateError::Translation(
                    "Empty translation received".to_string(),
                ));
            }
            return Ok(text);
        }

        Ok(clean_translation_response(&raw_response))
    }
}

/// Build the translation prompt pinned to the pair's target language.
fn build_translation_prompt(text: &str, target_language: &str) -> String {
    let language_name = language_code_to_name(target_language);

    format!(
        "You are a professional translator.\n\
         \n\
         CRITICAL: You must translate the text to {} ONLY. Do not translate to any other language.\n\
         The target language is: {} (language code: {})\n\
         \n\
         Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
         Do not include any explanations, alternatives, or text in other languages.\n\
         \n\
         Text to translate: \"{}\"\n",
        language_name, language_name, target_language, language_name, text
    )
}

/// Convert a language code to a full language name for clearer prompts
fn language_code_to_name(code: &str) -> String {
    match code.to_lowercase().as_str() {
        "en" => "English",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "fr" => "French",
        "de" => "German",
        "es" => "Spanish",
        "ru" => "Russian",
        "it" => "Italian",
        "pt" => "Portuguese",
        "pl" => "Polish",
        "nl" => "Dutch",
        "tr" => "Turkish",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "uk" => "Ukrainian",
        "sv" => "Swedish",
        "fi" => "Finnish",
        "cs" => "Czech",
        _ => return code.to_string(),
    }
    .to_string()
}

/// Strip framing the model sometimes adds around a plain-text translation.
fn clean_translation_response(response: &str) -> String {
    for line in response.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with("Here are")
            || trimmed.starts_with("Translation:")
            || trimmed.starts_with("- ")
            || trimmed.starts_with("* ")
            || (trimmed.starts_with("**") && trimmed.ends_with("**"))
        {
            continue;
        }

        if trimmed.len() > 3 {
            return trimmed.to_string();
        }
    }

    for line in response.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    response.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_pins_target_language() {
        let prompt = build_translation_prompt("hello", "zh");
        assert!(prompt.contains("Chinese"));
        assert!(prompt.contains("language code: zh"));
        assert!(prompt.contains("hello"));
    }

    #[test]
    fn test_unknown_language_code_passes_through() {
        assert_eq!(language_code_to_name("tlh"), "tlh");
        assert_eq!(language_code_to_name("JA"), "Japanese");
    }

    #[test]
    fn test_clean_response_skips_framing_lines() {
        let raw = "Here are some options:\n**Option 1**\nBonjour le monde\n";
        assert_eq!(clean_translation_response(raw), "Bonjour le monde");
    }

    #[test]
    fn test_clean_response_keeps_plain_text() {
        assert_eq!(clean_translation_response("こんにちは"), "こんにちは");
    }

    #[test]
    fn test_translation_result_parses_json_payload() {
        let parsed: TranslationResult =
            serde_json::from_str(r#"{"text": " 你好 "}"#).unwrap();
        assert_eq!(parsed.text.trim(), "你好");
    }
}
