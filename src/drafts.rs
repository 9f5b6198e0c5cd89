//! Local draft persistence: one JSON file per draft under the app data dir.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config;
use crate::form::ReportForm;

#[derive(Error, Debug)]
pub enum DraftError {
    #[error("Rascunho não encontrado: {0}")]
    NotFound(Uuid),

    #[error("Rascunho {id} corrompido: {reason}")]
    Corrupt { id: Uuid, reason: String },

    #[error("Falha ao serializar rascunho: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A saved form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub form: ReportForm,
}

/// What `list` shows for each draft.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftSummary {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub site_name: String,
    pub sheet_number: String,
}

impl From<&Draft> for DraftSummary {
    fn from(draft: &Draft) -> Self {
        Self {
            id: draft.id,
            saved_at: draft.saved_at,
            site_name: draft.form.site_name.clone(),
            sheet_number: draft.form.sheet_number.clone(),
        }
    }
}

pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store in the platform data directory.
    pub fn open_default() -> Self {
        Self::new(config::drafts_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Create a new draft (`id = None`) or overwrite an existing one.
    pub fn save(&self, form: &ReportForm, id: Option<Uuid>) -> Result<Draft, DraftError> {
        std::fs::create_dir_all(&self.dir)?;

        let draft = Draft {
            id: id.unwrap_or_else(Uuid::new_v4),
            saved_at: Utc::now(),
            form: form.clone(),
        };
        let json = serde_json::to_vec_pretty(&draft)?;

        // Write then rename so a crash never leaves a truncated draft.
        let path = self.path_for(&draft.id);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;

        info!(draft_id = %draft.id, images = draft.form.images.len(), "Draft saved");
        Ok(draft)
    }

    pub fn load(&self, id: &Uuid) -> Result<Draft, DraftError> {
        let path = self.path_for(id);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DraftError::NotFound(*id))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| DraftError::Corrupt {
            id: *id,
            reason: e.to_string(),
        })
    }

    /// Summaries of every readable draft, newest first. Unreadable files
    /// are skipped with a warning.
    pub fn list(&self) -> Result<Vec<DraftSummary>, DraftError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| Uuid::parse_str(s).ok())
            else {
                continue;
            };
            match self.load(&id) {
                Ok(draft) => summaries.push(DraftSummary::from(&draft)),
                Err(e) => warn!(draft_id = %id, error = %e, "Skipping unreadable draft"),
            }
        }

        summaries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        debug!(count = summaries.len(), "Listed drafts");
        Ok(summaries)
    }

    pub fn delete(&self, id: &Uuid) -> Result<(), DraftError> {
        match std::fs::remove_file(self.path_for(id)) {
            Ok(()) => {
                info!(draft_id = %id, "Draft deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DraftError::NotFound(*id)),
            Err(e) => Err(e.into()),
        }
    }
}
