//! Named entity recognition orchestration.
//!
//! Provides a unified interface over the NER backends:
//! - Remote: NameTag-compatible inference service over HTTP
//! - Local: in-process model executed on the blocking thread pool
//!
//! # Architecture
//!
//! Every backend implements [`NerBackend`] and translates its own label
//! vocabulary into [`EntityType`] through a [`LabelMap`] before returning.
//! [`RecognitionManager`] resolves the backend for a file's language via
//! [`BackendDispatch`], splits the plaintext into batches and runs them under
//! a per-file concurrency cap, merging in the deterministic
//! [`patterns`] matches for every batch.

mod batch;
mod dispatch;
mod heuristic;
mod labels;
mod local;
mod manager;
pub mod patterns;
mod remote;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{dedup_tabular, Entity, EntityType, Language};
use crate::text::{context_window, locate};

pub use batch::run_batches;
pub use dispatch::{BackendDispatch, BackendKind, Route};
pub use heuristic::HeuristicModel;
pub use labels::LabelMap;
pub use local::{LocalAdapter, LocalModel};
pub use manager::{RecognitionManager, RecognitionOptions};
pub use remote::{parse_vertical, RemoteAdapter};

/// Failure of a single batch inference call.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{backend} returned HTTP {status}")]
    Status { backend: &'static str, status: u16 },
    #[error("model {model} failed: {message}")]
    Model { model: String, message: String },
    #[error("inference task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("concurrency limiter closed")]
    LimiterClosed,
}

/// File-level recognition failure. Never aborts other files.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("no language detected")]
    MissingLanguage,
    #[error("language {0} is not supported")]
    UnsupportedLanguage(Language),
    #[error("batch failed: {0}")]
    Adapter(#[from] AdapterError),
}

/// One batch submitted to a backend.
#[derive(Debug, Clone, Copy)]
pub struct BatchRequest<'a> {
    /// Reference to the file the text came from, stored on every entity.
    pub source_file: &'a str,
    pub text: &'a str,
    pub language: Language,
    /// Backend-specific model name resolved by dispatch.
    pub model: &'a str,
    pub is_tabular: bool,
}

/// A backend-native match before label translation. `start..end` is the byte
/// range of `value` in the batch text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntity {
    pub label: String,
    pub value: String,
    /// Lemma supplied by the backend, if it produces one.
    pub normalized: Option<String>,
    pub start: usize,
    pub end: usize,
}

impl RawEntity {
    pub fn new(label: impl Into<String>, value: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            normalized: None,
            start,
            end,
        }
    }

    pub fn with_normalized(mut self, normalized: impl Into<String>) -> Self {
        self.normalized = Some(normalized.into());
        self
    }
}

/// Capability shared by every NER backend.
#[async_trait]
pub trait NerBackend: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> BackendKind;

    /// Recognize entities in one batch. Returned entities already carry
    /// canonical types.
    async fn recognize(&self, request: &BatchRequest<'_>) -> Result<Vec<Entity>, AdapterError>;
}

/// Translate raw backend output into entities: map labels, attach context,
/// and deduplicate when the source is tabular.
pub(crate) fn finish_batch(
    raw: Vec<RawEntity>,
    labels: &LabelMap,
    request: &BatchRequest<'_>,
    context_length: usize,
) -> Vec<Entity> {
    let entities: Vec<Entity> = raw
        .into_iter()
        .filter_map(|r| {
            let entity_type = labels.translate(&r.label)?;
            Some(build_entity(entity_type, r, request, context_length))
        })
        .collect();

    if request.is_tabular {
        dedup_tabular(entities)
    } else {
        entities
    }
}

fn build_entity(
    entity_type: EntityType,
    raw: RawEntity,
    request: &BatchRequest<'_>,
    context_length: usize,
) -> Entity {
    // model-supplied offsets are not trusted; re-find the value when they miss
    let span = match request.text.get(raw.start..raw.end) {
        Some(_) if raw.start < raw.end => Some((raw.start, raw.end)),
        _ => locate(request.text, &raw.value, 0),
    };
    let context = span
        .map(|(start, end)| context_window(request.text, start, end, context_length))
        .unwrap_or_default();
    let normalized = raw
        .normalized
        .filter(|lemma| !lemma.trim().is_empty())
        .unwrap_or_else(|| raw.value.trim().to_lowercase());
    Entity::new(
        entity_type,
        raw.value,
        Some(normalized),
        context,
        request.source_file,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str, is_tabular: bool) -> BatchRequest<'_> {
        BatchRequest {
            source_file: "memo.csv",
            text,
            language: Language::Czech,
            model: "czech-cnec2.0-200831",
            is_tabular,
        }
    }

    fn raw(label: &str, text: &str, value: &str) -> RawEntity {
        let start = text.find(value).unwrap();
        RawEntity::new(label, value, start, start + value.len())
    }

    #[test]
    fn test_finish_batch_drops_unmapped_and_keeps_duplicates() {
        let text = "Novák; Novák; Praha";
        let raws = vec![
            raw("P", text, "Novák"),
            raw("P", text, "Novák"),
            raw("gu", text, "Praha"),
            raw("zz", text, "Praha"),
        ];

        let entities = finish_batch(raws, &LabelMap::nametag(), &request(text, false), 200);
        assert_eq!(entities.len(), 3);
        assert_eq!(entities[2].entity_type(), EntityType::Location);
        assert_eq!(entities[0].normalized_value(), Some("novák"));
        assert_eq!(entities[0].source_file(), "memo.csv");
    }

    #[test]
    fn test_finish_batch_dedups_tabular() {
        let text = "Novák,Novák,Praha";
        let raws = vec![
            raw("P", text, "Novák"),
            raw("ps", text, "Novák"),
            raw("gu", text, "Praha"),
        ];

        let entities = finish_batch(raws, &LabelMap::nametag(), &request(text, true), 200);
        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn test_backend_lemma_is_kept() {
        let text = "Schůzka v Praze";
        let raws = vec![
            raw("gu", text, "Praze").with_normalized("Praha"),
            raw("gu", text, "Praze").with_normalized("  "),
        ];

        let entities = finish_batch(raws, &LabelMap::nametag(), &request(text, false), 200);
        assert_eq!(entities[0].normalized_value(), Some("Praha"));
        assert_eq!(entities[1].normalized_value(), Some("praze"));
    }

    #[test]
    fn test_bad_offsets_do_not_panic() {
        let text = "Novák žije v Praze";
        let raws = vec![
            RawEntity::new("gu", "Praze", 40, 45),
            RawEntity::new("P", "Novák", 1, 4),
            RawEntity::new("P", "Eva", 90, 10),
        ];

        let entities = finish_batch(raws, &LabelMap::nametag(), &request(text, false), 8);
        assert_eq!(entities.len(), 3);
        assert_eq!(entities[0].context(), "e v Praze");
        assert_eq!(entities[1].context(), "Novák žij");
        assert_eq!(entities[2].context(), "");
    }
}
