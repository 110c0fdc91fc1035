//! Gemini `generateContent` client implementing [`RoomAnalyzer`]

use async_trait::async_trait;
use base64::Engine;
use roomiex_store::Blob;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::analysis::{parse_response, RoomAnalysis, RoomAnalyzer, ANALYSIS_PROMPT};
use crate::error::AnalysisError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Model and sampling settings for room analysis
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.4,
            top_k: 32,
            top_p: 1.0,
            max_output_tokens: 2048,
        }
    }
}

pub struct GeminiAnalyzer {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiAnalyzer {
    /// Creates an analyzer with default model settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(GeminiConfig {
            api_key: api_key.into(),
            ..GeminiConfig::default()
        })
    }

    pub fn with_config(config: GeminiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Prompt plus the inline photo, with the configured generation settings
    pub fn build_request_body(&self, photo: &Blob) -> Value {
        let data = base64::engine::general_purpose::STANDARD.encode(&photo.bytes);
        json!({
            "contents": [{
                "parts": [
                    { "text": ANALYSIS_PROMPT },
                    {
                        "inline_data": {
                            "mime_type": photo.content_type,
                            "data": data,
                        }
                    }
                ]
            }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "topK": self.config.top_k,
                "topP": self.config.top_p,
                "maxOutputTokens": self.config.max_output_tokens,
            }
        })
    }
}

#[async_trait]
impl RoomAnalyzer for GeminiAnalyzer {
    #[instrument(skip(self, photo), fields(model = %self.config.model, file = %photo.file_name))]
    async fn analyze(&self, photo: &Blob) -> Result<RoomAnalysis, AnalysisError> {
        if self.config.api_key.trim().is_empty() {
            return Err(AnalysisError::MissingApiKey);
        }

        let body = self.build_request_body(photo);
        debug!("Sending {} byte photo for analysis", photo.bytes.len());

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            let message = error_message(&text);
            warn!("Analysis request rejected: {} {}", status, message);
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let response_body: Value = response.json().await?;
        let analysis = parse_response(&response_body)?;
        debug!("Analysis complete, overall {}", analysis.overall_score);
        Ok(analysis)
    }
}

/// `error.message` from a JSON error body, or the raw body when it is not JSON
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
    });
    if let Some(message) = from_json {
        return message;
    }

    let body = body.trim();
    if body.is_empty() {
        "Unknown error".to_string()
    } else {
        body.chars().take(MAX_ERROR_BODY_CHARS).collect()
    }
}
