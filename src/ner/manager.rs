//! Per-file recognition driver.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::patterns::{find_bank_accounts, find_crypto_addresses};
use super::{run_batches, AdapterError, BackendDispatch, BatchRequest, NerBackend, RecognitionError, Route};
use crate::models::{Entity, IngestedFile, Language};
use crate::text::{split_text, Chunk};

/// Tunables for [`RecognitionManager`].
#[derive(Debug, Clone)]
pub struct RecognitionOptions {
    pub batch_workers: usize,
    pub max_chunk_chars: usize,
    pub context_length: usize,
    pub tabular_formats: Vec<String>,
}

impl RecognitionOptions {
    pub fn is_tabular(&self, format: &str) -> bool {
        self.tabular_formats
            .iter()
            .any(|f| f.eq_ignore_ascii_case(format))
    }
}

/// Resolves a backend per file and runs its batches.
///
/// Backends are long-lived service objects shared by every file; the manager
/// itself holds no per-file state, so one instance serves concurrent files.
pub struct RecognitionManager {
    dispatch: BackendDispatch,
    remote: Arc<dyn NerBackend>,
    local: Arc<dyn NerBackend>,
    options: RecognitionOptions,
}

impl RecognitionManager {
    pub fn new(
        dispatch: BackendDispatch,
        remote: Arc<dyn NerBackend>,
        local: Arc<dyn NerBackend>,
        options: RecognitionOptions,
    ) -> Self {
        Self {
            dispatch,
            remote,
            local,
            options,
        }
    }

    pub fn options(&self) -> &RecognitionOptions {
        &self.options
    }

    /// Recognize entities in a file, reporting any failure as an empty list.
    ///
    /// Failures are logged here and go no further; the file's plaintext and
    /// metadata stay valid.
    pub async fn recognize(&self, file: &IngestedFile) -> Vec<Entity> {
        match self.try_recognize(file).await {
            Ok(entities) => {
                info!("{}: Recognized {} entities", file, entities.len());
                entities
            }
            Err(e) => {
                error!("{}: Error while recognizing entities: {}", file, e);
                Vec::new()
            }
        }
    }

    /// Recognize entities in a file. All-or-nothing: one failed batch fails
    /// the file.
    pub async fn try_recognize(&self, file: &IngestedFile) -> Result<Vec<Entity>, RecognitionError> {
        let language = file.language.ok_or(RecognitionError::MissingLanguage)?;
        let (backend, model) = match self.dispatch.dispatch(language) {
            Route::Remote { model } => (&self.remote, model),
            Route::Local { model } => (&self.local, model),
            Route::Unsupported => return Err(RecognitionError::UnsupportedLanguage(language)),
        };

        let is_tabular = self.options.is_tabular(&file.format);
        let source_file = file.path.display().to_string();
        let chunks = split_text(&file.plaintext, self.options.max_chunk_chars);
        let label = file.to_string();

        debug!(
            "{}: {} batch(es) for {} backend {} (model {}, tabular={})",
            label,
            chunks.len(),
            backend.kind().as_str(),
            backend.name(),
            model,
            is_tabular
        );

        let backend = backend.as_ref();
        let entities = run_batches(&label, chunks, self.options.batch_workers, |chunk| {
            self.process_batch(backend, chunk, &source_file, language, model, is_tabular)
        })
        .await?;

        Ok(entities)
    }

    /// One batch: backend call plus both pattern recognizers.
    async fn process_batch(
        &self,
        backend: &dyn NerBackend,
        chunk: Chunk<'_>,
        source_file: &str,
        language: Language,
        model: &str,
        is_tabular: bool,
    ) -> Result<Vec<Entity>, AdapterError> {
        let request = BatchRequest {
            source_file,
            text: chunk.text,
            language,
            model,
            is_tabular,
        };
        let mut entities = backend.recognize(&request).await?;

        let context_length = self.options.context_length;
        entities.extend(find_crypto_addresses(chunk.text, source_file, context_length));
        entities.extend(find_bank_accounts(chunk.text, source_file, context_length));
        Ok(entities)
    }
}
