//! Recognize command: run one file through the pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use console::style;
use tracing::warn;

use crate::cli::helpers::{build_arbiter, build_manager, load_file};
use crate::config::Settings;
use crate::models::Language;
use crate::services::FileProcessor;

/// Recognize entities in a file and print the index records as JSON.
pub async fn cmd_recognize(
    settings: &Settings,
    path: PathBuf,
    language: Option<&str>,
    format: Option<&str>,
) -> anyhow::Result<()> {
    let language = match language {
        Some(code) => match Language::from_code(code) {
            Some(language) => Some(language),
            None => {
                eprintln!("{} Unknown language code '{}'", style("✗").red(), code);
                return Ok(());
            }
        },
        None => None,
    };

    let client = settings.http_client()?;
    let manager = Arc::new(build_manager(settings, &client)?);
    let file = load_file(settings, &path, language, format).await?;

    let arbiter = if settings.is_ocr_format(&file.format) {
        match build_arbiter(settings, &client) {
            Ok(arbiter) => Some(Arc::new(arbiter)),
            Err(e) => {
                warn!("OCR unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let processor = FileProcessor::from_settings(settings, manager, arbiter);
    let processed = processor.process(file).await;

    if !processed.valid {
        eprintln!(
            "{} {} has no usable text or language",
            style("!").yellow(),
            path.display()
        );
    }

    let entities: Vec<_> = processed
        .entities
        .iter()
        .map(|e| e.to_document(&processed.id))
        .collect();
    let output = serde_json::json!({
        "id": processed.id,
        "file": processed.to_document(),
        "entities": entities,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
