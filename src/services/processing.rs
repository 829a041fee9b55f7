//! File pipeline: OCR for images, then entity recognition.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::models::{IngestedFile, ProcessedFile};
use crate::ner::RecognitionManager;
use crate::ocr::OcrArbiter;

/// Runs files through OCR (when needed) and recognition.
///
/// Every failure stays inside its file: a file either ends up valid with
/// some or no entities, or skipped without plaintext/language.
pub struct FileProcessor {
    manager: Arc<RecognitionManager>,
    arbiter: Option<Arc<OcrArbiter>>,
    ocr_formats: Vec<String>,
    file_workers: usize,
}

impl FileProcessor {
    pub fn new(
        manager: Arc<RecognitionManager>,
        arbiter: Option<Arc<OcrArbiter>>,
        ocr_formats: Vec<String>,
        file_workers: usize,
    ) -> Self {
        Self {
            manager,
            arbiter,
            ocr_formats,
            file_workers: file_workers.max(1),
        }
    }

    pub fn from_settings(
        settings: &Settings,
        manager: Arc<RecognitionManager>,
        arbiter: Option<Arc<OcrArbiter>>,
    ) -> Self {
        Self::new(
            manager,
            arbiter,
            settings.ocr_formats.clone(),
            settings.file_workers,
        )
    }

    pub fn is_ocr_format(&self, format: &str) -> bool {
        self.ocr_formats.iter().any(|f| f.eq_ignore_ascii_case(format))
    }

    /// Process one file.
    pub async fn process(&self, mut file: IngestedFile) -> ProcessedFile {
        if self.is_ocr_format(&file.format) {
            let Some(arbiter) = &self.arbiter else {
                warn!("{}: OCR is not configured, skipping image", file);
                return ProcessedFile::skipped(file);
            };
            match arbiter.run(&file.path).await {
                Ok(output) => {
                    file.plaintext = output.text;
                    file.language = Some(output.language);
                }
                Err(e) => {
                    error!("{}: OCR failed: {}", file, e);
                    return ProcessedFile::skipped(file);
                }
            }
        }

        if file.plaintext.trim().is_empty() {
            warn!("{}: No text extracted, skipping", file);
            return ProcessedFile::skipped(file);
        }
        if file.language.is_none() {
            warn!("{}: Language could not be detected, skipping", file);
            return ProcessedFile::skipped(file);
        }

        info!("{}: Recognizing entities", file);
        let entities = self.manager.recognize(&file).await;
        ProcessedFile::completed(file, entities)
    }

    /// Process many files, at most `file_workers` at a time. Output order
    /// follows completion, not input.
    pub async fn process_all(&self, files: Vec<IngestedFile>) -> Vec<ProcessedFile> {
        let total = files.len();
        info!("Processing {} files with {} workers", total, self.file_workers);

        let processed: Vec<ProcessedFile> = stream::iter(files)
            .map(|file| self.process(file))
            .buffer_unordered(self.file_workers)
            .collect()
            .await;

        let valid = processed.iter().filter(|f| f.valid).count();
        info!("Processed {} files ({} valid)", total, valid);
        processed
    }
}
