//! Configuration management for foia-ner using the prefer crate.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{EntityType, Language};
use crate::ner::{BackendDispatch, RecognitionOptions};

/// Default maximum chunk size in characters.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 500_000;

/// Default per-file cap on in-flight inference calls.
pub const DEFAULT_BATCH_WORKERS: usize = 2;

/// Default number of files processed concurrently.
pub const DEFAULT_FILE_WORKERS: usize = 4;

/// Default entity context length in characters.
pub const DEFAULT_CONTEXT_LENGTH: usize = 200;

/// Startup-time configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("language {0} is supported but has no backend mapping")]
    UnmappedLanguage(Language),
    #[error("language {0} is mapped to both the remote and the local backend")]
    AmbiguousLanguage(Language),
    #[error("language {0} has a backend mapping but is not in supported_languages")]
    UnsupportedMapping(Language),
    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Maximum concurrent inference calls per file.
    pub batch_workers: usize,
    /// Maximum files processed concurrently.
    pub file_workers: usize,
    /// Documents longer than this many characters are split into batches.
    pub max_chunk_chars: usize,
    /// Length of the context excerpt stored with each entity.
    pub context_length: usize,
    /// Formats whose entities are deduplicated per batch.
    pub tabular_formats: Vec<String>,
    /// Formats routed through OCR instead of the text extractor.
    pub ocr_formats: Vec<String>,
    /// Languages recognition accepts.
    pub supported_languages: Vec<Language>,
    /// Languages served by the remote NameTag service, with model names.
    pub remote_models: BTreeMap<Language, String>,
    /// Languages served by the in-process model, with model names.
    pub local_models: BTreeMap<Language, String>,
    /// Extra or replacement entries for the remote label table.
    pub remote_labels: HashMap<String, EntityType>,
    /// Extra or replacement entries for the local label table.
    pub local_labels: HashMap<String, EntityType>,
    /// Base URL of the NameTag REST API.
    pub nametag_url: String,
    /// Base URL of the secondary OCR service.
    pub ocr_service_url: String,
    /// Base URL of the Apache Tika server used as OCR fallback.
    pub tika_url: String,
    /// HTTP request timeout in seconds.
    pub request_timeout: u64,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Tesseract `-l` argument.
    pub tesseract_languages: String,
    /// Extra Tesseract arguments.
    pub tesseract_config: String,
    /// Languages hinted to the secondary OCR engine when the first pass
    /// detected nothing usable.
    pub ocr_default_languages: Vec<Language>,
}

impl Default for Settings {
    fn default() -> Self {
        use Language::*;

        let remote_models = [
            (English, "english-conll-200831"),
            (Czech, "czech-cnec2.0-200831"),
            (Slovak, "czech-cnec2.0-200831"),
            (Dutch, "dutch-conll-200831"),
            (German, "german-conll-200831"),
            (Spanish, "spanish-conll-200831"),
            (Ukrainian, "ukrainian-languk-230306"),
        ];
        let local_models = [
            (French, "fr_core_news_sm"),
            (Polish, "pl_core_news_sm"),
            (Russian, "ru_core_news_sm"),
            (Italian, "it_core_news_sm"),
            (Danish, "da_core_news_sm"),
            (Portuguese, "pt_core_news_sm"),
            (Swedish, "sv_core_news_sm"),
            (Romanian, "ro_core_news_sm"),
        ];

        Self {
            batch_workers: DEFAULT_BATCH_WORKERS,
            file_workers: DEFAULT_FILE_WORKERS,
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            context_length: DEFAULT_CONTEXT_LENGTH,
            tabular_formats: ["csv", "xls", "xlsx", "json"]
                .into_iter()
                .map(String::from)
                .collect(),
            ocr_formats: ["png", "jpg", "jpeg", "tiff", "tif", "bmp"]
                .into_iter()
                .map(String::from)
                .collect(),
            supported_languages: Language::ALL.to_vec(),
            remote_models: remote_models
                .into_iter()
                .map(|(l, m)| (l, m.to_string()))
                .collect(),
            local_models: local_models
                .into_iter()
                .map(|(l, m)| (l, m.to_string()))
                .collect(),
            remote_labels: HashMap::new(),
            local_labels: HashMap::new(),
            nametag_url: "https://lindat.mff.cuni.cz/services/nametag/api".to_string(),
            ocr_service_url: "http://localhost:8070".to_string(),
            tika_url: "http://localhost:9998".to_string(),
            request_timeout: 120,
            user_agent: "foia-ner/0.4 (document research)".to_string(),
            tesseract_languages: "eng+ces+slk+pol+deu+spa".to_string(),
            tesseract_config: "--oem 3 --psm 6".to_string(),
            ocr_default_languages: vec![English, Czech, Slovak, Polish, German, Spanish],
        }
    }
}

impl Settings {
    /// Check internal consistency and build the language dispatch table.
    ///
    /// Called once at startup so a bad mapping fails before any file is read.
    pub fn validate(&self) -> Result<BackendDispatch, ConfigError> {
        if self.batch_workers == 0 {
            return Err(ConfigError::ZeroLimit("batch_workers"));
        }
        if self.file_workers == 0 {
            return Err(ConfigError::ZeroLimit("file_workers"));
        }
        if self.max_chunk_chars == 0 {
            return Err(ConfigError::ZeroLimit("max_chunk_chars"));
        }
        BackendDispatch::new(
            &self.supported_languages,
            &self.remote_models,
            &self.local_models,
        )
    }

    pub fn recognition_options(&self) -> RecognitionOptions {
        RecognitionOptions {
            batch_workers: self.batch_workers,
            max_chunk_chars: self.max_chunk_chars,
            context_length: self.context_length,
            tabular_formats: self.tabular_formats.clone(),
        }
    }

    pub fn is_ocr_format(&self, format: &str) -> bool {
        self.ocr_formats.iter().any(|f| f.eq_ignore_ascii_case(format))
    }

    /// Shared HTTP client for every remote collaborator.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        Ok(reqwest::Client::builder()
            .timeout(Duration::from_secs(self.request_timeout))
            .user_agent(&self.user_agent)
            .build()?)
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chunk_chars: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabular_formats: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_formats: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_languages: Option<Vec<Language>>,
    /// Replaces the whole remote language table when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_models: Option<BTreeMap<Language, String>>,
    /// Replaces the whole local language table when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_models: Option<BTreeMap<Language, String>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub remote_labels: HashMap<String, EntityType>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub local_labels: HashMap<String, EntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nametag_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tika_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tesseract_languages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tesseract_config: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_default_languages: Option<Vec<Language>>,

    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers foia-ner config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("foia-ner").await {
            Ok(pref_config) => Config {
                batch_workers: pref_config.get("batch_workers").await.ok(),
                file_workers: pref_config.get("file_workers").await.ok(),
                max_chunk_chars: pref_config.get("max_chunk_chars").await.ok(),
                context_length: pref_config.get("context_length").await.ok(),
                tabular_formats: pref_config.get("tabular_formats").await.ok(),
                ocr_formats: pref_config.get("ocr_formats").await.ok(),
                supported_languages: pref_config.get("supported_languages").await.ok(),
                remote_models: pref_config.get("remote_models").await.ok(),
                local_models: pref_config.get("local_models").await.ok(),
                remote_labels: pref_config.get("remote_labels").await.unwrap_or_default(),
                local_labels: pref_config.get("local_labels").await.unwrap_or_default(),
                nametag_url: pref_config.get("nametag_url").await.ok(),
                ocr_service_url: pref_config.get("ocr_service_url").await.ok(),
                tika_url: pref_config.get("tika_url").await.ok(),
                request_timeout: pref_config.get("request_timeout").await.ok(),
                user_agent: pref_config.get("user_agent").await.ok(),
                tesseract_languages: pref_config.get("tesseract_languages").await.ok(),
                tesseract_config: pref_config.get("tesseract_config").await.ok(),
                ocr_default_languages: pref_config.get("ocr_default_languages").await.ok(),
                source_path: pref_config.source_path().cloned(),
            },
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let mut config: Config = serde_json::from_str(&contents)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(n) = self.batch_workers {
            settings.batch_workers = n;
        }
        if let Some(n) = self.file_workers {
            settings.file_workers = n;
        }
        if let Some(n) = self.max_chunk_chars {
            settings.max_chunk_chars = n;
        }
        if let Some(n) = self.context_length {
            settings.context_length = n;
        }
        if let Some(ref formats) = self.tabular_formats {
            settings.tabular_formats = normalize_formats(formats);
        }
        if let Some(ref formats) = self.ocr_formats {
            settings.ocr_formats = normalize_formats(formats);
        }
        if let Some(ref langs) = self.supported_languages {
            settings.supported_languages = langs.clone();
        }
        if let Some(ref models) = self.remote_models {
            settings.remote_models = models.clone();
        }
        if let Some(ref models) = self.local_models {
            settings.local_models = models.clone();
        }
        settings
            .remote_labels
            .extend(self.remote_labels.iter().map(|(k, v)| (k.clone(), *v)));
        settings
            .local_labels
            .extend(self.local_labels.iter().map(|(k, v)| (k.clone(), *v)));
        if let Some(ref url) = self.nametag_url {
            settings.nametag_url = url.clone();
        }
        if let Some(ref url) = self.ocr_service_url {
            settings.ocr_service_url = url.clone();
        }
        if let Some(ref url) = self.tika_url {
            settings.tika_url = url.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(ref langs) = self.tesseract_languages {
            settings.tesseract_languages = langs.clone();
        }
        if let Some(ref config) = self.tesseract_config {
            settings.tesseract_config = config.clone();
        }
        if let Some(ref langs) = self.ocr_default_languages {
            settings.ocr_default_languages = langs.clone();
        }
    }
}

/// Formats are compared without the leading dot and case-insensitively.
fn normalize_formats(formats: &[String]) -> Vec<String> {
    formats
        .iter()
        .map(|f| f.trim_start_matches('.').to_lowercase())
        .collect()
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

/// Load settings with explicit options.
pub async fn load_settings_with_options(options: LoadOptions) -> Result<Settings, ConfigError> {
    let config = match &options.config_path {
        Some(path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
            Config::load_from_path(Path::new(&expanded)).await?
        }
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    Ok(settings)
}

/// Default location for a user-level config file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("foia-ner")
        .join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings_validate() {
        let settings = Settings::default();
        let dispatch = settings.validate().unwrap();
        assert_eq!(dispatch.languages().count(), 15);
    }

    #[test]
    fn test_zero_batch_workers_rejected() {
        let settings = Settings {
            batch_workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::ZeroLimit("batch_workers"))
        ));
    }

    #[test]
    fn test_apply_to_settings_overrides_only_present_values() {
        let config = Config {
            batch_workers: Some(8),
            tabular_formats: Some(vec![".TSV".to_string()]),
            remote_labels: HashMap::from([("gt".to_string(), EntityType::Location)]),
            ..Default::default()
        };

        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);

        assert_eq!(settings.batch_workers, 8);
        assert_eq!(settings.max_chunk_chars, DEFAULT_MAX_CHUNK_CHARS);
        assert_eq!(settings.tabular_formats, vec!["tsv".to_string()]);
        assert_eq!(settings.remote_labels.get("gt"), Some(&EntityType::Location));
    }

    #[tokio::test]
    async fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "batch_workers": 3,
                "supported_languages": ["en", "fr"],
                "remote_models": {{"en": "english-conll-200831"}},
                "local_models": {{"fr": "fr_core_news_sm"}}
            }}"#
        )
        .unwrap();

        let config = Config::load_from_path(file.path()).await.unwrap();
        assert_eq!(config.source_path.as_deref(), Some(file.path()));

        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);
        assert_eq!(settings.batch_workers, 3);
        assert_eq!(settings.supported_languages, vec![Language::English, Language::French]);
        assert!(settings.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_path_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            Config::load_from_path(file.path()).await,
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_is_ocr_format() {
        let settings = Settings::default();
        assert!(settings.is_ocr_format("PNG"));
        assert!(!settings.is_ocr_format("pdf"));
    }
}
