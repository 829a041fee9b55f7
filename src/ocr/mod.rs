//! OCR for image-origin documents.
//!
//! Two independently fallible engines transcribe every image:
//! - Primary: Tesseract, which also corrects orientation and hands the
//!   prepared image on ([`ImagePreprocessor`])
//! - Secondary: a remote OCR service reading the prepared image ([`OcrEngine`])
//!
//! Neither engine's self-reported score is trusted. [`OcrArbiter`] re-runs
//! language detection on each transcription and picks one with
//! [`select_engine`]. When both look like noise, Apache Tika is asked instead.

mod arbiter;
mod remote;
mod tesseract;
mod tika;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempPath;
use thiserror::Error;

use crate::models::Language;

pub use arbiter::{OcrArbiter, OcrOutput, Transcription};
pub use remote::RemoteOcrEngine;
pub use tesseract::{parse_osd_rotation, TesseractPreprocessor};
pub use tika::TikaExtractor;

/// Below this detection confidence neither engine is trusted.
pub const MIN_CONFIDENCE: f64 = 0.6;

/// At or above this the secondary engine wins outright.
pub const SECONDARY_PREFERRED: f64 = 0.95;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("no OCR engine produced text in a supported language")]
    Unresolvable,
    #[error("{engine} is not available: {message}")]
    EngineUnavailable {
        engine: &'static str,
        message: String,
    },
    #[error("{engine} failed: {message}")]
    Engine {
        engine: &'static str,
        message: String,
    },
    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("OCR task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Outcome of engine arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineChoice {
    Primary,
    Secondary,
    Fallback,
}

impl EngineChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineChoice::Primary => "primary",
            EngineChoice::Secondary => "secondary",
            EngineChoice::Fallback => "fallback",
        }
    }
}

/// Pick an engine from the detection confidences of both transcriptions.
///
/// Checks run in a fixed order; the secondary engine wins ties.
#[allow(clippy::float_cmp)]
pub fn select_engine(primary: f64, secondary: f64) -> EngineChoice {
    if primary.max(secondary) < MIN_CONFIDENCE {
        return EngineChoice::Fallback;
    }
    if secondary >= SECONDARY_PREFERRED {
        return EngineChoice::Secondary;
    }
    if primary == 1.0 {
        return EngineChoice::Primary;
    }
    if primary > secondary {
        EngineChoice::Primary
    } else {
        EngineChoice::Secondary
    }
}

/// An image made ready for OCR together with the primary transcription.
///
/// When preprocessing wrote a new file it lives as long as this value.
#[derive(Debug)]
pub struct PreparedImage {
    pub path: PathBuf,
    pub text: String,
    temp: Option<TempPath>,
}

impl PreparedImage {
    /// An image used as-is.
    pub fn original(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            temp: None,
        }
    }

    /// An image written to a temporary file, removed on drop.
    pub fn temporary(temp: TempPath, text: impl Into<String>) -> Self {
        Self {
            path: temp.to_path_buf(),
            text: text.into(),
            temp: Some(temp),
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

/// Orientation correction plus the primary transcription.
#[async_trait]
pub trait ImagePreprocessor: Send + Sync {
    fn name(&self) -> &str;

    async fn preprocess(&self, image: &Path) -> Result<PreparedImage, OcrError>;
}

/// Transcribes an image, optionally hinted with expected languages.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn transcribe(&self, image: &Path, languages: &[Language]) -> Result<String, OcrError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_engine_thresholds() {
        assert_eq!(select_engine(0.5, 0.4), EngineChoice::Fallback);
        assert_eq!(select_engine(1.0, 0.8), EngineChoice::Primary);
        assert_eq!(select_engine(0.7, 0.97), EngineChoice::Secondary);
        assert_eq!(select_engine(0.8, 0.75), EngineChoice::Primary);
        assert_eq!(select_engine(0.8, 0.8), EngineChoice::Secondary);
    }

    #[test]
    fn test_select_engine_order() {
        // secondary's 0.95 is checked before primary's perfect score
        assert_eq!(select_engine(1.0, 0.95), EngineChoice::Secondary);
        assert_eq!(select_engine(0.59, 0.6), EngineChoice::Secondary);
        assert_eq!(select_engine(0.0, 0.0), EngineChoice::Fallback);
    }

    #[test]
    fn test_prepared_image_temp_lifetime() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        let prepared = PreparedImage::temporary(file.into_temp_path(), "text");
        assert!(prepared.is_temporary());
        assert!(path.exists());
        drop(prepared);
        assert!(!path.exists());
    }
}
