//! Service layer for foia-ner processing logic.
//!
//! This module contains the file pipeline separated from UI concerns.
//! Services can be used by the CLI or embedded by an ingestion runner.

pub mod processing;

pub use processing::FileProcessor;
