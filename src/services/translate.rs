//! Translation through a LibreTranslate server.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{TranslationError, Translator};
use crate::config::TranslatorConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

/// Translator backed by the LibreTranslate `/translate` endpoint.
pub struct LibreTranslator {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl LibreTranslator {
    pub fn from_config(config: &TranslatorConfig) -> Result<Self, TranslationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl Translator for LibreTranslator {
    fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Err(TranslationError::EmptyInput);
        }

        let request = TranslateRequest {
            q: text,
            source: "auto",
            target: target_language,
            format: "text",
        };
        let response = self.client.post(&self.endpoint).json(&request).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Status(status.as_u16()));
        }

        parse_translation(&response.text()?)
    }
}

pub(crate) fn parse_translation(body: &str) -> Result<String, TranslationError> {
    let response: TranslateResponse = serde_json::from_str(body)
        .map_err(|e| TranslationError::InvalidResponse(e.to_string()))?;
    response
        .translated_text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| TranslationError::InvalidResponse("missing translatedText".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = TranslateRequest {
            q: "hello",
            source: "auto",
            target: "hi",
            format: "text",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"q": "hello", "source": "auto", "target": "hi", "format": "text"})
        );
    }

    #[test]
    fn test_parse_translation() {
        assert_eq!(
            parse_translation(r#"{"translatedText":"नमस्ते"}"#).unwrap(),
            "नमस्ते"
        );
    }

    #[test]
    fn test_parse_translation_missing_field() {
        assert!(matches!(
            parse_translation(r#"{"error":"rate limited"}"#),
            Err(TranslationError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        let translator = LibreTranslator::from_config(&TranslatorConfig::default()).unwrap();
        assert!(matches!(
            translator.translate("  ", "hi"),
            Err(TranslationError::EmptyInput)
        ));
    }
}
