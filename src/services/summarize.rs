//! Summaries through the Google Generative Language API.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};

use super::{SummarizationError, Summarizer};
use crate::config::SummarizerConfig;

/// Instruction prepended to the document text.
const SUMMARY_PROMPT: &str = "Please provide a concise summary of the following text, \
highlighting the key points and main ideas. Keep the summary clear and informative:";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Summarizer backed by a Gemini `generateContent` endpoint.
pub struct GeminiSummarizer {
    client: reqwest::blocking::Client,
    config: SummarizerConfig,
    api_key: String,
}

impl GeminiSummarizer {
    /// Build from configuration, reading the API key from the configured
    /// environment variable.
    pub fn from_config(config: &SummarizerConfig) -> Result<Self, SummarizationError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SummarizationError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(
        config: &SummarizerConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, SummarizationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
            api_key: api_key.into(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl Summarizer for GeminiSummarizer {
    fn summarize(&self, text: &str) -> Result<String, SummarizationError> {
        if text.trim().is_empty() {
            return Err(SummarizationError::NoText);
        }

        log::debug!("Requesting summary of {} characters from {}", text.len(), self.config.model);
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(&self.config, text))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if status.as_u16() == 429 {
            return Err(SummarizationError::Quota);
        }
        if !status.is_success() {
            return Err(SummarizationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_summary(&body)
    }
}

/// JSON body of a `generateContent` request.
pub(crate) fn request_body(config: &SummarizerConfig, text: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": format!("{SUMMARY_PROMPT}\n\n{text}") }]
        }],
        "generationConfig": {
            "temperature": config.temperature,
            "topK": config.top_k,
            "topP": config.top_p,
            "maxOutputTokens": config.max_output_tokens,
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Concatenate the text parts of the first candidate.
pub(crate) fn parse_summary(body: &str) -> Result<String, SummarizationError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| SummarizationError::InvalidResponse(e.to_string()))?;

    let summary: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    if summary.trim().is_empty() {
        return Err(SummarizationError::Empty);
    }
    Ok(summary)
}
