//! Remote adapter for NameTag-compatible inference services.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{finish_batch, AdapterError, BackendKind, BatchRequest, LabelMap, NerBackend, RawEntity};
use crate::models::Entity;
use crate::text::locate;

/// Response body of the NameTag `recognize` endpoint.
#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    model: Option<String>,
    result: String,
}

/// [`NerBackend`] calling a NameTag REST service.
///
/// The service tokenizes the batch itself and answers in the vertical
/// format: one `token_ranges<TAB>label<TAB>text` line per entity.
pub struct RemoteAdapter {
    client: reqwest::Client,
    base_url: String,
    labels: LabelMap,
    context_length: usize,
}

impl RemoteAdapter {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        labels: LabelMap,
        context_length: usize,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            labels,
            context_length,
        }
    }
}

#[async_trait]
impl NerBackend for RemoteAdapter {
    fn name(&self) -> &str {
        "nametag"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn recognize(&self, request: &BatchRequest<'_>) -> Result<Vec<Entity>, AdapterError> {
        let url = format!("{}/recognize", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("data", request.text),
                ("model", request.model),
                ("input", "untokenized"),
                ("output", "vertical"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Status {
                backend: "nametag",
                status: status.as_u16(),
            });
        }

        let body: RecognizeResponse = response.json().await?;
        debug!(
            "nametag: model {} answered for {} characters",
            body.model.as_deref().unwrap_or(request.model),
            request.text.len()
        );

        let raw = parse_vertical(&body.result, request.text);
        Ok(finish_batch(raw, &self.labels, request, self.context_length))
    }
}

/// Parse NameTag vertical output, locating each entity in `text`.
///
/// Lines are ordered by first token, so each value is searched from the
/// previous match onward. Malformed lines are skipped.
pub fn parse_vertical(output: &str, text: &str) -> Vec<RawEntity> {
    let mut cursor = 0;
    let mut entities = Vec::new();

    for line in output.lines() {
        let mut fields = line.splitn(3, '\t');
        let (Some(_ranges), Some(label), Some(value)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let value = value.trim();
        if label.is_empty() || value.is_empty() {
            continue;
        }

        let (start, end) = match locate(text, value, cursor) {
            Some(range) => range,
            None => (cursor, cursor),
        };
        if end > start {
            cursor = start;
        }

        entities.push(RawEntity::new(label, value, start, end));
    }

    entities
}
