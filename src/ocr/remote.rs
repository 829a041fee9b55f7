//! Secondary OCR engine behind an HTTP service.

use std::path::Path;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{OcrEngine, OcrError};
use crate::models::Language;

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    image: String,
    languages: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    lines: Vec<String>,
}

/// [`OcrEngine`] posting base64 images to an EasyOCR-style service.
///
/// The service answers with the recognized text lines, which are joined
/// with single spaces.
pub struct RemoteOcrEngine {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteOcrEngine {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for RemoteOcrEngine {
    fn name(&self) -> &str {
        "easyocr"
    }

    async fn transcribe(&self, image: &Path, languages: &[Language]) -> Result<String, OcrError> {
        let bytes = tokio::fs::read(image).await?;
        let body = OcrRequest {
            image: STANDARD.encode(&bytes),
            languages: languages.iter().map(|l| l.iso_639_1()).collect(),
        };

        let url = format!("{}/ocr", self.base_url);
        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OcrError::Status {
                service: "easyocr",
                status: status.as_u16(),
            });
        }

        let result: OcrResponse = response.json().await?;
        debug!("easyocr: {} lines from {}", result.lines.len(), image.display());
        Ok(result.lines.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = OcrRequest {
            image: STANDARD.encode(b"png"),
            languages: [Language::Czech, Language::English]
                .iter()
                .map(|l| l.iso_639_1())
                .collect(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["image"], "cG5n");
        assert_eq!(json["languages"], serde_json::json!(["cs", "en"]));
    }

    #[test]
    fn test_response_without_lines() {
        let response: OcrResponse = serde_json::from_str("{}").unwrap();
        assert!(response.lines.is_empty());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let engine = RemoteOcrEngine::new(reqwest::Client::new(), "http://ocr:8070/");
        assert_eq!(engine.base_url, "http://ocr:8070");
    }
}
