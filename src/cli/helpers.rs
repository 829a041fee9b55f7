//! Shared helper functions for CLI commands.

use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::detection::{LanguageDetector, WhatlangDetector};
use crate::models::{IngestedFile, Language};
use crate::ner::{HeuristicModel, LabelMap, LocalAdapter, RecognitionManager, RemoteAdapter};
use crate::ocr::{OcrArbiter, OcrError, RemoteOcrEngine, TesseractPreprocessor, TikaExtractor};

/// Build the recognition manager with both backends.
///
/// Fails when the language tables are inconsistent.
pub fn build_manager(settings: &Settings, client: &reqwest::Client) -> anyhow::Result<RecognitionManager> {
    let dispatch = settings.validate()?;

    let remote = RemoteAdapter::new(
        client.clone(),
        &settings.nametag_url,
        LabelMap::nametag().with_overrides(&settings.remote_labels),
        settings.context_length,
    );
    let local = LocalAdapter::new(
        Arc::new(HeuristicModel::new()),
        LabelMap::spacy().with_overrides(&settings.local_labels),
        settings.context_length,
    );

    Ok(RecognitionManager::new(
        dispatch,
        Arc::new(remote),
        Arc::new(local),
        settings.recognition_options(),
    ))
}

pub fn build_detector(settings: &Settings) -> Arc<dyn LanguageDetector> {
    Arc::new(WhatlangDetector::new(&settings.supported_languages))
}

/// Build the OCR arbiter. Fails when Tesseract is not installed.
pub fn build_arbiter(settings: &Settings, client: &reqwest::Client) -> Result<OcrArbiter, OcrError> {
    let primary = TesseractPreprocessor::new(&settings.tesseract_languages, &settings.tesseract_config)?;
    let secondary = RemoteOcrEngine::new(client.clone(), &settings.ocr_service_url);
    let fallback = TikaExtractor::new(client.clone(), &settings.tika_url);

    Ok(OcrArbiter::new(
        Arc::new(primary),
        Arc::new(secondary),
        Arc::new(fallback),
        build_detector(settings),
        settings.supported_languages.clone(),
        settings.ocr_default_languages.clone(),
    ))
}

/// Read a plaintext file the way the extraction stage would hand it over.
///
/// Images are returned without text; OCR fills it in later.
pub async fn load_file(
    settings: &Settings,
    path: &Path,
    language: Option<Language>,
    format: Option<&str>,
) -> anyhow::Result<IngestedFile> {
    let mut file = match format {
        Some(format) => IngestedFile::new(path, format),
        None => IngestedFile::from_path(path),
    };
    if settings.is_ocr_format(&file.format) {
        return Ok(file);
    }

    let bytes = tokio::fs::read(path).await?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let language = language.or_else(|| {
        build_detector(settings)
            .detect(&text)
            .map(|(language, _)| language)
    });
    file = file.with_text(text, language);
    Ok(file)
}

/// Truncate a string for tabular output.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
