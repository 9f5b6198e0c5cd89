use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::StructuringError;
use crate::models::ImportedReport;

/// Which extractor turns document text into report fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionEngine {
    /// Label/section regexes, no network.
    #[default]
    Heuristic,
    /// Prompted extraction through a generative model.
    Llm,
}

impl ExtractionEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::Llm => "llm",
        }
    }
}

impl FromStr for ExtractionEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heuristic" | "regex" => Ok(Self::Heuristic),
            "llm" | "gemini" => Ok(Self::Llm),
            other => Err(format!("unknown extraction engine: {other}")),
        }
    }
}

/// Turns raw document text into report fields.
pub trait ReportExtractor {
    fn extract(&self, raw_text: &str) -> Result<ImportedReport, StructuringError>;
}

/// Generative model client abstraction (allows mocking)
pub trait LlmClient {
    /// Run one prompt against `model` and return the text reply.
    /// A model the backend does not know must map to
    /// `StructuringError::ModelNotFound`.
    fn generate(&self, model: &str, prompt: &str) -> Result<String, StructuringError>;
}
