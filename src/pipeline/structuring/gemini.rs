use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::types::LlmClient;
use super::StructuringError;
use crate::config::GeminiSettings;

/// Google Generative Language REST client (`models/{model}:generateContent`).
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> Result<Self, StructuringError> {
        if settings.api_key.trim().is_empty() {
            return Err(StructuringError::MissingApiKey);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| StructuringError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.trim().to_string(),
            client,
            timeout_secs: settings.timeout_secs,
        })
    }

    /// Client configured from the environment; `MissingApiKey` when
    /// `GOOGLE_API_KEY` is not set.
    pub fn from_env() -> Result<Self, StructuringError> {
        let settings = GeminiSettings::from_env().ok_or(StructuringError::MissingApiKey)?;
        Self::new(&settings)
    }

    fn generate_url(&self, model: &str) -> String {
        let model = model.trim_start_matches("models/");
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

/// Request body for generateContent
#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Response body from generateContent
#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn into_text(self) -> String {
        self.candidates
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
            .unwrap_or_default()
    }
}

impl LlmClient for GeminiClient {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, StructuringError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.generate_url(model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    StructuringError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    // Without the URL: it carries the API key.
                    StructuringError::HttpClient(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StructuringError::ModelNotFound(model.to_string()));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StructuringError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| StructuringError::ResponseParsing(e.without_url().to_string()))?;

        Ok(parsed.into_text())
    }
}

/// Mock LLM client for testing: returns a configurable reply and reports
/// the configured models as missing.
pub struct MockLlmClient {
    response: String,
    missing_models: Vec<String>,
    failure: Option<(u16, String)>,
    calls: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            missing_models: Vec::new(),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_missing_models(mut self, models: Vec<String>) -> Self {
        self.missing_models = models;
        self
    }

    /// Every available model answers with this HTTP error instead.
    pub fn with_failure(mut self, status: u16, body: &str) -> Self {
        self.failure = Some((status, body.to_string()));
        self
    }

    /// Models that `generate` was called with, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, model: &str, _prompt: &str) -> Result<String, StructuringError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(model.to_string());
        }
        if self.missing_models.iter().any(|m| m == model) {
            return Err(StructuringError::ModelNotFound(model.to_string()));
        }
        if let Some((status, body)) = &self.failure {
            return Err(StructuringError::ApiError {
                status: *status,
                body: body.clone(),
            });
        }
        Ok(self.response.clone())
    }
}
