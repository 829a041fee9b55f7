//! foia-ner: entity recognition for investigative document corpora.
//!
//! The crate sits between document extraction and indexing. Given a file's
//! plaintext and detected language it picks an NER backend, splits large
//! documents into bounded batches, runs them under a per-file concurrency cap
//! and normalizes every backend label into one [`models::EntityType`]
//! taxonomy. Image files first go through [`ocr::OcrArbiter`], which picks the
//! most trustworthy transcription out of several OCR engines.

pub mod cli;
pub mod config;
pub mod detection;
pub mod models;
pub mod ner;
pub mod ocr;
pub mod services;
pub mod text;

pub use config::{ConfigError, Settings};
pub use models::{Entity, EntityType, IngestedFile, Language, ProcessedFile};
pub use ner::{RecognitionError, RecognitionManager};
pub use ocr::{OcrArbiter, OcrError};
