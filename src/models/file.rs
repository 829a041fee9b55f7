//! File processing state consumed from the extraction stage and the record
//! handed to indexing.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::{Entity, Language};

/// A file as delivered by the extraction collaborator.
///
/// `language == None` means detection failed; such files are never sent to
/// recognition. Image files arrive with empty plaintext and get it from OCR.
#[derive(Debug, Clone)]
pub struct IngestedFile {
    pub path: PathBuf,
    /// Lowercase format extension without the dot (e.g. "pdf", "csv").
    pub format: String,
    pub plaintext: String,
    pub language: Option<Language>,
}

impl IngestedFile {
    pub fn new(path: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format: format.into().trim_start_matches('.').to_lowercase(),
            plaintext: String::new(),
            language: None,
        }
    }

    /// Build from a path, taking the format from its extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Self::new(path, format)
    }

    pub fn with_text(mut self, plaintext: impl Into<String>, language: Option<Language>) -> Self {
        self.plaintext = plaintext.into();
        self.language = language;
        self
    }

    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

impl std::fmt::Display for IngestedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "File({})", self.path.display())
    }
}

/// Outcome of running one file through OCR and recognition.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub id: String,
    pub path: PathBuf,
    pub format: String,
    pub plaintext: String,
    pub language: Option<Language>,
    pub entities: Vec<Entity>,
    /// True once plaintext and language are established. A file stays valid
    /// when recognition fails; it just carries no entities.
    pub valid: bool,
    pub processed_at: DateTime<Utc>,
}

impl ProcessedFile {
    /// A file that never got usable plaintext or language.
    pub fn skipped(file: IngestedFile) -> Self {
        Self::build(file, Vec::new(), false)
    }

    pub fn completed(file: IngestedFile, entities: Vec<Entity>) -> Self {
        Self::build(file, entities, true)
    }

    fn build(file: IngestedFile, entities: Vec<Entity>, valid: bool) -> Self {
        Self {
            id: file_id(&file.path),
            path: file.path,
            format: file.format,
            plaintext: file.plaintext,
            language: file.language,
            entities,
            valid,
            processed_at: Utc::now(),
        }
    }

    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Index record for the file itself. Entities are indexed separately via
    /// [`Entity::to_document`] with this record's `id` as parent.
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::json!({
            "filename": self.filename(),
            "path": self.path.display().to_string(),
            "format": self.format,
            "plaintext": self.plaintext,
            "language": self.language.map(|l| l.iso_639_1()),
            "timestamp": self.processed_at.to_rfc3339(),
            "entity_count": self.entities.len(),
            "relation": {
                "name": "file",
            },
        })
    }
}

/// Stable identifier derived from the file path, so re-processing a file
/// overwrites its previous index records.
pub fn file_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hex::encode(hasher.finalize())
}
