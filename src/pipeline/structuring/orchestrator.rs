use tracing::{debug, info, warn};

use super::gemini::GeminiClient;
use super::heuristic::HeuristicExtractor;
use super::parser::parse_extraction_response;
use super::prompt::build_extraction_prompt;
use super::sanitize::sanitize_for_llm_with_audit;
use super::types::{ExtractionEngine, LlmClient, ReportExtractor};
use super::StructuringError;
use crate::config::GeminiSettings;
use crate::models::ImportedReport;
use crate::pipeline::import::{extract_raw_text, sanitize_filename, validate_word_upload};

/// Prompted extraction: sanitize → prompt → model (with fallback) → parse.
pub struct LlmExtractor {
    llm: Box<dyn LlmClient + Send + Sync>,
    models: Vec<String>,
    source: Option<String>,
}

impl LlmExtractor {
    pub fn new(llm: Box<dyn LlmClient + Send + Sync>, models: Vec<String>) -> Self {
        Self {
            llm,
            models,
            source: None,
        }
    }

    /// Gemini-backed extractor configured from the environment.
    pub fn from_env() -> Result<Self, StructuringError> {
        let settings = GeminiSettings::from_env().ok_or(StructuringError::MissingApiKey)?;
        let client = GeminiClient::new(&settings)?;
        Ok(Self::new(Box::new(client), settings.models))
    }

    /// File name reported in injection audit warnings.
    pub fn with_source(mut self, file_name: &str) -> Self {
        self.source = Some(file_name.to_string());
        self
    }

    /// Send the prompt to each configured model in turn until one exists.
    /// Only `ModelNotFound` moves on to the next model; any other failure
    /// is returned as is.
    fn generate_with_fallback(&self, prompt: &str) -> Result<String, StructuringError> {
        for model in &self.models {
            match self.llm.generate(model, prompt) {
                Ok(reply) => {
                    info!(model = %model, reply_chars = reply.chars().count(), "Model replied");
                    return Ok(reply);
                }
                Err(StructuringError::ModelNotFound(_)) => {
                    warn!(model = %model, "Model not available, trying next");
                }
                Err(e) => return Err(e),
            }
        }
        Err(StructuringError::NoModelAvailable(self.models.join(", ")))
    }
}

impl ReportExtractor for LlmExtractor {
    fn extract(&self, raw_text: &str) -> Result<ImportedReport, StructuringError> {
        let sanitized = sanitize_for_llm_with_audit(raw_text, self.source.as_deref());
        let prompt = build_extraction_prompt(&sanitized);
        debug!(prompt_chars = prompt.chars().count(), "Built extraction prompt");

        let reply = self.generate_with_fallback(&prompt)?;
        parse_extraction_response(&reply)
    }
}

/// Validate a Word upload, extract its text and run the selected engine.
pub fn import_word_document(
    file_name: &str,
    bytes: &[u8],
    engine: ExtractionEngine,
) -> Result<ImportedReport, StructuringError> {
    match engine {
        ExtractionEngine::Heuristic => {
            import_word_document_with(file_name, bytes, engine, &HeuristicExtractor)
        }
        ExtractionEngine::Llm => {
            // Fail on a missing key before touching the document.
            let extractor = LlmExtractor::from_env()?.with_source(&sanitize_filename(file_name));
            import_word_document_with(file_name, bytes, engine, &extractor)
        }
    }
}

/// Same as [`import_word_document`] with a caller-supplied extractor.
pub fn import_word_document_with(
    file_name: &str,
    bytes: &[u8],
    engine: ExtractionEngine,
    extractor: &dyn ReportExtractor,
) -> Result<ImportedReport, StructuringError> {
    let detection = validate_word_upload(file_name, bytes)?;
    info!(
        engine = engine.as_str(),
        format = detection.category.as_str(),
        size_bytes = detection.file_size_bytes,
        "Importing Word document"
    );

    let raw_text = extract_raw_text(bytes)?;
    let imported = extractor.extract(&raw_text)?;

    info!(
        engine = engine.as_str(),
        fields = ?imported.present_fields(),
        "Extracted report fields"
    );
    Ok(imported)
}
