//! Local adapter: in-process model on the blocking thread pool.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{finish_batch, AdapterError, BackendKind, BatchRequest, LabelMap, NerBackend, RawEntity};
use crate::models::{Entity, Language};

/// A synchronous, CPU-bound NER model.
///
/// One instance is shared by every file and batch, so `predict` must not
/// keep per-call state.
pub trait LocalModel: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn predict(
        &self,
        text: &str,
        language: Language,
        model: &str,
    ) -> Result<Vec<RawEntity>, AdapterError>;
}

/// [`NerBackend`] running a [`LocalModel`] via `spawn_blocking`, so inference
/// never stalls the async workers that drive other batches and files.
pub struct LocalAdapter {
    model: Arc<dyn LocalModel>,
    labels: LabelMap,
    context_length: usize,
}

impl LocalAdapter {
    pub fn new(model: Arc<dyn LocalModel>, labels: LabelMap, context_length: usize) -> Self {
        Self {
            model,
            labels,
            context_length,
        }
    }
}

#[async_trait]
impl NerBackend for LocalAdapter {
    fn name(&self) -> &str {
        self.model.name()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn recognize(&self, request: &BatchRequest<'_>) -> Result<Vec<Entity>, AdapterError> {
        let model = Arc::clone(&self.model);
        let text = request.text.to_string();
        let language = request.language;
        let model_name = request.model.to_string();

        let raw = tokio::task::spawn_blocking(move || model.predict(&text, language, &model_name))
            .await??;

        debug!(
            "{}: {} raw entities from {} characters",
            self.model.name(),
            raw.len(),
            request.text.len()
        );
        Ok(finish_batch(raw, &self.labels, request, self.context_length))
    }
}
