pub mod types;
pub mod heuristic;
pub mod prompt;
pub mod parser;
pub mod sanitize;
pub mod gemini;
pub mod orchestrator;

pub use types::*;
pub use heuristic::*;
pub use prompt::*;
pub use parser::*;
pub use sanitize::*;
pub use gemini::*;
pub use orchestrator::*;

use thiserror::Error;

use crate::pipeline::import::ImportError;

#[derive(Error, Debug)]
pub enum StructuringError {
    #[error("Gemini API key not configured (set GOOGLE_API_KEY)")]
    MissingApiKey,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("No Gemini model is available for this API key (tried: {0})")]
    NoModelAvailable(String),

    #[error("Gemini returned error (status {status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("The model returned an empty response")]
    EmptyResponse,

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),
}
