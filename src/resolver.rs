// 🔎 Entity Resolver - id → label, description, canonical link
//
// Every field uses the same fallback chain:
//   preferred language (or "<lang>wiki" site) → first entry present → default

use crate::error::{FetchError, FetchResult};
use crate::http::get_json;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const ENTITY_DATA_URL: &str = "https://www.wikidata.org/wiki/Special:EntityData";

pub const DEFAULT_LABEL: &str = "Unknown";

// ============================================================================
// RESOLVED ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntity {
    pub label: String,
    pub description: String,
    pub canonical_link: String,
}

impl ResolvedEntity {
    /// Build from one `entities[id]` object of the entity-data document
    pub fn from_entity(entity: &Value, language: &str) -> Self {
        ResolvedEntity {
            label: pick(entity.get("labels"), language, "value", DEFAULT_LABEL),
            description: pick(entity.get("descriptions"), language, "value", ""),
            canonical_link: pick(
                entity.get("sitelinks"),
                &format!("{}wiki", language),
                "url",
                "",
            ),
        }
    }
}

/// `field[preferred][key]`, else `field[<first key>][key]`, else `default`.
/// Empty strings count as absent.
fn pick(field: Option<&Value>, preferred: &str, key: &str, default: &str) -> String {
    let map = match field.and_then(Value::as_object) {
        Some(map) => map,
        None => return default.to_string(),
    };

    let text = |entry: Option<&Value>| {
        entry
            .and_then(|e| e.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    text(map.get(preferred))
        .or_else(|| text(map.values().next()))
        .unwrap_or_else(|| default.to_string())
}

// ============================================================================
// LOOKUP
// ============================================================================

#[async_trait]
pub trait EntityLookup: Send + Sync {
    async fn resolve(&self, entity_id: &str) -> FetchResult<ResolvedEntity>;
}

#[derive(Debug, Deserialize)]
struct EntityDocument {
    #[serde(default)]
    entities: serde_json::Map<String, Value>,
}

pub struct WikidataResolver {
    client: reqwest::Client,
    base_url: String,
    language: String,
    timeout: Duration,
}

impl WikidataResolver {
    pub fn new(client: reqwest::Client, language: impl Into<String>, timeout: Duration) -> Self {
        WikidataResolver {
            client,
            base_url: ENTITY_DATA_URL.to_string(),
            language: language.into(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn entity_url(&self, entity_id: &str) -> String {
        format!("{}/{}.json", self.base_url, entity_id)
    }
}

/// Pull `entities[id]` out of an entity-data document
pub fn entity_from_document(
    document: &Value,
    entity_id: &str,
    language: &str,
) -> FetchResult<ResolvedEntity> {
    let doc: EntityDocument = serde_json::from_value(document.clone())?;
    doc.entities
        .get(entity_id)
        .map(|entity| ResolvedEntity::from_entity(entity, language))
        .ok_or_else(|| FetchError::MissingEntity(entity_id.to_string()))
}

#[async_trait]
impl EntityLookup for WikidataResolver {
    async fn resolve(&self, entity_id: &str) -> FetchResult<ResolvedEntity> {
        let document: Value =
            get_json(&self.client, &self.entity_url(entity_id), self.timeout).await?;
        entity_from_document(&document, entity_id, &self.language)
    }
}

// ============================================================================
// TESTS
// ============================================================================
