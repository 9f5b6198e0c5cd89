use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Diário de Obra";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory name under the platform data dir.
const APP_DIR_NAME: &str = "diario-obra";

/// Word uploads larger than this are rejected (10 MB).
pub const MAX_WORD_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Image attachments larger than this are rejected (5 MB).
pub const MAX_IMAGE_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Default timeout for a single generateContent call.
const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 120;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Models tried in order until one exists for the API key.
pub const GEMINI_FALLBACK_MODELS: &[&str] = &[
    "gemini-1.5-pro-latest",
    "gemini-1.5-flash-latest",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemini-pro",
];

/// Get the application data directory.
/// Falls back to the working directory when the platform has no data dir.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Get the drafts directory
pub fn drafts_dir() -> PathBuf {
    app_data_dir().join("drafts")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "diario_obra_lib=info,warn"
}

/// Settings for the Gemini extraction engine, read from the environment.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub base_url: String,
    pub models: Vec<String>,
    pub timeout_secs: u64,
}

impl GeminiSettings {
    /// Reads `GOOGLE_API_KEY` (required), `DIARIO_GEMINI_MODEL`,
    /// `DIARIO_GEMINI_BASE_URL` and `DIARIO_GEMINI_TIMEOUT_SECS`.
    /// Returns `None` when no API key is configured.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let api_key = lookup("GOOGLE_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())?;

        let base_url = lookup("DIARIO_GEMINI_BASE_URL")
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());

        let timeout_secs = lookup("DIARIO_GEMINI_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_GEMINI_TIMEOUT_SECS);

        let preferred = lookup("DIARIO_GEMINI_MODEL")
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        Some(Self {
            api_key,
            base_url,
            models: model_order(preferred.as_deref()),
            timeout_secs,
        })
    }
}

/// Fallback list with the preferred model (if any) moved to the front.
fn model_order(preferred: Option<&str>) -> Vec<String> {
    let mut models: Vec<String> = Vec::with_capacity(GEMINI_FALLBACK_MODELS.len() + 1);
    if let Some(p) = preferred {
        models.push(p.to_string());
    }
    for m in GEMINI_FALLBACK_MODELS {
        if Some(*m) != preferred {
            models.push(m.to_string());
        }
    }
    models
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn drafts_dir_under_app_data() {
        let drafts = drafts_dir();
        assert!(drafts.starts_with(app_data_dir()));
        assert!(drafts.ends_with("drafts"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn settings_require_api_key() {
        assert!(GeminiSettings::from_lookup(lookup_from(&[])).is_none());
        assert!(GeminiSettings::from_lookup(lookup_from(&[("GOOGLE_API_KEY", "  ")])).is_none());
    }

    #[test]
    fn settings_defaults() {
        let s = GeminiSettings::from_lookup(lookup_from(&[("GOOGLE_API_KEY", "abc")])).unwrap();
        assert_eq!(s.api_key, "abc");
        assert_eq!(s.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(s.timeout_secs, 120);
        assert_eq!(s.models.len(), GEMINI_FALLBACK_MODELS.len());
        assert_eq!(s.models[0], "gemini-1.5-pro-latest");
    }

    #[test]
    fn preferred_model_goes_first_without_duplicates() {
        let s = GeminiSettings::from_lookup(lookup_from(&[
            ("GOOGLE_API_KEY", "abc"),
            ("DIARIO_GEMINI_MODEL", "gemini-1.5-flash"),
            ("DIARIO_GEMINI_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(s.models[0], "gemini-1.5-flash");
        assert_eq!(
            s.models.iter().filter(|m| *m == "gemini-1.5-flash").count(),
            1
        );
        assert_eq!(s.timeout_secs, 30);
    }

    #[test]
    fn unknown_preferred_model_is_prepended() {
        let s = GeminiSettings::from_lookup(lookup_from(&[
            ("GOOGLE_API_KEY", "abc"),
            ("DIARIO_GEMINI_MODEL", "gemini-2.0-flash"),
        ]))
        .unwrap();
        assert_eq!(s.models[0], "gemini-2.0-flash");
        assert_eq!(s.models.len(), GEMINI_FALLBACK_MODELS.len() + 1);
    }
}
