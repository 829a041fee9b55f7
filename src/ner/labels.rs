//! Per-backend label tables.

use std::collections::HashMap;

use tracing::trace;

use crate::models::EntityType;

/// Immutable mapping from a backend's native labels to [`EntityType`].
///
/// Labels without an entry are dropped: backend vocabularies evolve
/// independently of the taxonomy, and an unknown label yields no entity.
#[derive(Debug, Clone)]
pub struct LabelMap {
    backend: &'static str,
    labels: HashMap<String, EntityType>,
}

/// NameTag labels (CoNLL and CNEC 2.0 hierarchies).
const NAMETAG_LABELS: &[(&str, EntityType)] = &[
    ("P", EntityType::Person),
    ("pc", EntityType::Person),
    ("pf", EntityType::Person),
    ("pp", EntityType::Person),
    ("p_", EntityType::Person),
    ("pm", EntityType::Person),
    ("ps", EntityType::Person),
    ("PER", EntityType::Person),
    ("T", EntityType::Datetime),
    ("A", EntityType::Location),
    ("ah", EntityType::Location),
    ("az", EntityType::Location),
    ("gs", EntityType::Location),
    ("gu", EntityType::Location),
    ("gq", EntityType::Location),
    ("gc", EntityType::Location),
    ("g_", EntityType::Location),
    ("LOC", EntityType::Location),
    ("at", EntityType::Phone),
    ("me", EntityType::Email),
    ("mi", EntityType::Link),
    ("if", EntityType::Organization),
    ("io", EntityType::Organization),
    ("ORG", EntityType::Organization),
    ("or", EntityType::Document),
    ("op", EntityType::Product),
];

/// spaCy-style labels (OntoNotes and NKJP tag sets).
const SPACY_LABELS: &[(&str, EntityType)] = &[
    ("PERSON", EntityType::Person),
    ("PER", EntityType::Person),
    ("persName", EntityType::Person),
    ("GPE", EntityType::Location),
    ("LOC", EntityType::Location),
    ("placeName", EntityType::Location),
    ("FAC", EntityType::Location),
    ("geogName", EntityType::Location),
    ("ORG", EntityType::Organization),
    ("NORP", EntityType::Organization),
    ("orgName", EntityType::Organization),
    ("PRODUCT", EntityType::Product),
    ("MONEY", EntityType::Product),
    ("WORK_OF_ART", EntityType::Product),
    ("EVENT", EntityType::Product),
    ("LAW", EntityType::Document),
    ("DATE", EntityType::Datetime),
    ("TIME", EntityType::Datetime),
];

impl LabelMap {
    pub fn new(backend: &'static str, entries: &[(&str, EntityType)]) -> Self {
        Self {
            backend,
            labels: entries
                .iter()
                .map(|(label, t)| (label.to_string(), *t))
                .collect(),
        }
    }

    pub fn nametag() -> Self {
        Self::new("nametag", NAMETAG_LABELS)
    }

    pub fn spacy() -> Self {
        Self::new("spacy", SPACY_LABELS)
    }

    /// Add or replace entries. Used once at construction from configuration.
    pub fn with_overrides(mut self, overrides: &HashMap<String, EntityType>) -> Self {
        self.labels
            .extend(overrides.iter().map(|(k, v)| (k.clone(), *v)));
        self
    }

    pub fn translate(&self, label: &str) -> Option<EntityType> {
        let mapped = self.labels.get(label).copied();
        if mapped.is_none() {
            trace!("{}: dropping unmapped label {:?}", self.backend, label);
        }
        mapped
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
