//! Domain models shared by the recognition and OCR layers.

mod entity;
mod file;
mod language;

pub use entity::{dedup_tabular, Entity, EntityType};
pub use file::{IngestedFile, ProcessedFile};
pub use language::Language;
