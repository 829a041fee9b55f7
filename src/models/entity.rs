//! Canonical entity record and taxonomy.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Canonical entity kinds. Every backend label is translated into one of
/// these at the adapter boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Person,
    Location,
    Datetime,
    Organization,
    Document,
    Product,
    FinancialAccount,
    CryptoAddress,
    Phone,
    Email,
    Link,
}

impl EntityType {
    pub const ALL: [EntityType; 11] = [
        EntityType::Person,
        EntityType::Location,
        EntityType::Datetime,
        EntityType::Organization,
        EntityType::Document,
        EntityType::Product,
        EntityType::FinancialAccount,
        EntityType::CryptoAddress,
        EntityType::Phone,
        EntityType::Email,
        EntityType::Link,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "person",
            EntityType::Location => "location",
            EntityType::Datetime => "datetime",
            EntityType::Organization => "organization",
            EntityType::Document => "document",
            EntityType::Product => "product",
            EntityType::FinancialAccount => "financial_account",
            EntityType::CryptoAddress => "crypto_address",
            EntityType::Phone => "phone",
            EntityType::Email => "email",
            EntityType::Link => "link",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognized entity.
///
/// Fields are private: an entity is built once by an adapter or pattern
/// recognizer and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    entity_type: EntityType,
    value: String,
    normalized_value: Option<String>,
    context: String,
    source_file: String,
}

impl Entity {
    pub fn new(
        entity_type: EntityType,
        value: impl Into<String>,
        normalized_value: Option<String>,
        context: impl Into<String>,
        source_file: impl Into<String>,
    ) -> Self {
        Self {
            entity_type,
            value: value.into(),
            normalized_value,
            context: context.into(),
            source_file: source_file.into(),
        }
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn normalized_value(&self) -> Option<&str> {
        self.normalized_value.as_deref()
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Key used for search equivalence: the normalized form when the backend
    /// produced one, the raw value otherwise.
    pub fn search_key(&self) -> &str {
        self.normalized_value.as_deref().unwrap_or(&self.value)
    }

    /// Build the index record for this entity, linked to its parent file.
    pub fn to_document(&self, file_id: &str) -> serde_json::Value {
        serde_json::json!({
            "entity_type": self.entity_type.as_str(),
            "value": self.value,
            "normalized_value": self.normalized_value,
            "context": self.context,
            "source_file": self.source_file,
            "relation": {
                "name": "entity",
                "parent": file_id,
            },
        })
    }
}

/// Drop repeated `(entity_type, search_key)` pairs, keeping the first
/// occurrence. Used for grid-like sources that repeat values structurally.
pub fn dedup_tabular(entities: Vec<Entity>) -> Vec<Entity> {
    let mut seen: HashSet<(EntityType, String)> = HashSet::new();
    entities
        .into_iter()
        .filter(|e| seen.insert((e.entity_type, e.search_key().to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(value: &str, normalized: Option<&str>) -> Entity {
        Entity::new(
            EntityType::Person,
            value,
            normalized.map(String::from),
            "ctx",
            "a.csv",
        )
    }

    #[test]
    fn test_entity_type_round_trip_names() {
        for t in EntityType::ALL {
            assert_eq!(EntityType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(EntityType::from_str("artifact"), None);
    }

    #[test]
    fn test_entity_type_serde_matches_as_str() {
        let json = serde_json::to_string(&EntityType::FinancialAccount).unwrap();
        assert_eq!(json, "\"financial_account\"");
    }

    #[test]
    fn test_dedup_tabular_uses_type_and_normalized_value() {
        let entities = vec![
            person("Novák", Some("novák")),
            person("NOVÁK", Some("novák")),
            person("Svoboda", Some("svoboda")),
            Entity::new(
                EntityType::Location,
                "Novák",
                Some("novák".into()),
                "",
                "a.csv",
            ),
        ];

        let deduped = dedup_tabular(entities);
        assert_eq!(deduped.len(), 3);
        assert_eq!(deduped[0].value(), "Novák");
        assert_eq!(deduped[2].entity_type(), EntityType::Location);
    }

    #[test]
    fn test_dedup_without_normalized_value_falls_back_to_value() {
        let deduped = dedup_tabular(vec![person("A", None), person("B", None), person("A", None)]);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn test_to_document_links_parent() {
        let doc = person("Jan", Some("jan")).to_document("file-1");
        assert_eq!(doc["entity_type"], "person");
        assert_eq!(doc["normalized_value"], "jan");
        assert_eq!(doc["relation"]["parent"], "file-1");
    }
}
