//! Apache Tika as the last-resort OCR extractor.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::debug;

use super::{OcrEngine, OcrError};
use crate::models::Language;

/// [`OcrEngine`] sending the untouched image to a Tika server, which runs
/// its own OCR pipeline.
pub struct TikaExtractor {
    client: reqwest::Client,
    base_url: String,
}

impl TikaExtractor {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Tika expects Tesseract language codes joined with `+`.
fn ocr_language_header(languages: &[Language]) -> String {
    languages
        .iter()
        .map(|l| l.iso_639_3())
        .collect::<Vec<_>>()
        .join("+")
}

#[async_trait]
impl OcrEngine for TikaExtractor {
    fn name(&self) -> &str {
        "tika"
    }

    async fn transcribe(&self, image: &Path, languages: &[Language]) -> Result<String, OcrError> {
        let bytes = tokio::fs::read(image).await?;
        let url = format!("{}/tika", self.base_url);

        let mut request = self.client.put(&url).header(ACCEPT, "text/plain").body(bytes);
        if !languages.is_empty() {
            request = request.header("X-Tika-OCRLanguage", ocr_language_header(languages));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(OcrError::Status {
                service: "tika",
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        debug!("tika: {} characters from {}", text.len(), image.display());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ocr_language_header() {
        let header = ocr_language_header(&[Language::English, Language::Czech, Language::German]);
        assert_eq!(header, "eng+ces+deu");
        assert_eq!(ocr_language_header(&[]), "");
    }
}
