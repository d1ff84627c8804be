// 🏗️ Parsers - raw source payloads → CandidateRecord
//
// Two raw shapes come in:
// - SPARQL JSON results (bulk mode): results.bindings[] of {item, itemLabel, desc, died}
// - recent-change events (streaming mode): {server_name, title, comment, ...}

use crate::types::CandidateRecord;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Prefix of entity URIs in query results
pub const ENTITY_URI_PREFIX: &str = "http://www.wikidata.org/entity/";

/// Property id for "date of death"
pub const DATE_OF_DEATH_PROPERTY: &str = "P570";

// ============================================================================
// PLACEHOLDER LABELS
// ============================================================================

static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Q\d+$").expect("placeholder regex"));

/// A label that is just the entity id ("Q12345") means the source has no
/// human-readable name yet.
pub fn is_placeholder_label(label: &str) -> bool {
    RE_PLACEHOLDER.is_match(label)
}

// ============================================================================
// ENTITY IDS
// ============================================================================

/// "http://www.wikidata.org/entity/Q42" → "Q42". Anything without the known
/// prefix falls back to the last path segment.
pub fn entity_id_from_uri(uri: &str) -> String {
    match uri.strip_prefix(ENTITY_URI_PREFIX) {
        Some(id) => id.to_string(),
        None => uri.rsplit('/').next().unwrap_or(uri).to_string(),
    }
}

// ============================================================================
// SPARQL RESULTS (bulk mode)
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SparqlResponse {
    pub results: SparqlResults,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SparqlResults {
    pub bindings: Vec<SparqlBinding>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SparqlBinding {
    pub item: SparqlTerm,

    #[serde(rename = "itemLabel", default)]
    pub item_label: Option<SparqlTerm>,

    #[serde(default)]
    pub desc: Option<SparqlTerm>,

    #[serde(default)]
    pub died: Option<SparqlTerm>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SparqlTerm {
    pub value: String,
}

impl SparqlBinding {
    pub fn to_candidate(&self) -> CandidateRecord {
        let mut record = CandidateRecord::new(
            entity_id_from_uri(&self.item.value),
            self.died.as_ref().map(|t| t.value.clone()).unwrap_or_default(),
        )
        .with_uri(self.item.value.clone());

        if let Some(label) = &self.item_label {
            record = record.with_label(label.value.clone());
        }
        if let Some(desc) = &self.desc {
            record = record.with_description(desc.value.clone());
        }
        record
    }
}

/// Candidates in the order the source returned them
pub fn candidates_from_response(response: &SparqlResponse) -> Vec<CandidateRecord> {
    response
        .results
        .bindings
        .iter()
        .map(SparqlBinding::to_candidate)
        .collect()
}

/// Date part of an xsd:dateTime ("2024-03-10T00:00:00Z"), or of a bare date
pub fn parse_death_timestamp(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

// ============================================================================
// RECENT-CHANGE EVENTS (streaming mode)
// ============================================================================

/// One message from the recent-changes feed; unknown fields are ignored
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChangeEvent {
    #[serde(default)]
    pub server_name: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub comment: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

static RE_DEATH_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\[\[Property:{}\]\]: (\d{{1,2}} [A-Z][a-z]+ \d{{1,4}})\b",
        DATE_OF_DEATH_PROPERTY
    ))
    .expect("death comment regex")
});

/// Pull "10 March 2024" out of a change comment such as
/// `/* wbcreateclaim-create:1| */ [[Property:P570]]: 10 March 2024`.
///
/// Returns the matched text and the date. None means the edit is not a
/// date-of-death edit (or the date does not exist on the calendar).
pub fn parse_death_comment(comment: &str) -> Option<(String, NaiveDate)> {
    let captures = RE_DEATH_COMMENT.captures(comment)?;
    let text = captures.get(1)?.as_str();
    let date = NaiveDate::parse_from_str(text, "%d %B %Y").ok()?;
    Some((text.to_string(), date))
}

impl ChangeEvent {
    /// The candidate this edit describes, if it is a date-of-death edit
    pub fn to_candidate(&self) -> Option<(CandidateRecord, NaiveDate)> {
        let (text, date) = parse_death_comment(&self.comment)?;
        let record = CandidateRecord::new(self.title.clone(), text)
            .with_uri(format!("{}{}", ENTITY_URI_PREFIX, self.title));
        Some((record, date))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placeholder_labels() {
        assert!(is_placeholder_label("Q12345"));
        assert!(is_placeholder_label("Q1"));
        assert!(!is_placeholder_label("Q"));
        assert!(!is_placeholder_label("Q12a"));
        assert!(!is_placeholder_label("Quentin"));
        assert!(!is_placeholder_label(" Q12"));
        assert!(!is_placeholder_label("P570"));
    }

    #[test]
    fn test_entity_id_from_uri() {
        assert_eq!(entity_id_from_uri("http://www.wikidata.org/entity/Q42"), "Q42");
        assert_eq!(entity_id_from_uri("https://example.org/thing/Q7"), "Q7");
        assert_eq!(entity_id_from_uri("Q9"), "Q9");
    }

    #[test]
    fn test_candidates_from_response_preserves_order() {
        let raw = json!({
            "head": { "vars": ["item", "itemLabel", "desc", "died"] },
            "results": { "bindings": [
                {
                    "item": { "type": "uri", "value": "http://www.wikidata.org/entity/Q2" },
                    "itemLabel": { "xml:lang": "en", "type": "literal", "value": "Jane Doe" },
                    "died": { "type": "literal", "value": "2024-03-10T00:00:00Z" }
                },
                {
                    "item": { "type": "uri", "value": "http://www.wikidata.org/entity/Q1" },
                    "itemLabel": { "type": "literal", "value": "Q1" },
                    "desc": { "type": "literal", "value": "painter" }
                }
            ]}
        });

        let response: SparqlResponse = serde_json::from_value(raw).unwrap();
        let candidates = candidates_from_response(&response);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].entity_id, "Q2");
        assert_eq!(candidates[0].label(), Some("Jane Doe"));
        assert_eq!(candidates[0].raw_timestamp_text, "2024-03-10T00:00:00Z");
        assert_eq!(candidates[1].entity_id, "Q1");
        assert_eq!(candidates[1].metadata.description.as_deref(), Some("painter"));
        assert_eq!(candidates[1].raw_timestamp_text, "");
    }

    #[test]
    fn test_parse_death_timestamp() {
        assert_eq!(
            parse_death_timestamp("2024-03-10T00:00:00Z"),
            NaiveDate::from_ymd_opt(2024, 3, 10)
        );
        assert_eq!(
            parse_death_timestamp("2024-03-10"),
            NaiveDate::from_ymd_opt(2024, 3, 10)
        );
        assert_eq!(parse_death_timestamp(""), None);
        assert_eq!(parse_death_timestamp("yesterday"), None);
    }

    #[test]
    fn test_parse_death_comment() {
        let comment = "/* wbcreateclaim-create:1| */ [[Property:P570]]: 10 March 2024";
        let (text, date) = parse_death_comment(comment).unwrap();

        assert_eq!(text, "10 March 2024");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn test_parse_death_comment_single_digit_day() {
        let comment = "/* wbsetclaim-update:2||1 */ [[Property:P570]]: 7 March 2024, #quickstatements";
        let (_, date) = parse_death_comment(comment).unwrap();

        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
    }

    #[test]
    fn test_parse_death_comment_non_matches() {
        // Date of birth, not death
        assert!(parse_death_comment("[[Property:P569]]: 10 March 2024").is_none());
        // No date at all
        assert!(parse_death_comment("/* wbsetlabel-add:1|en */ Jane Doe").is_none());
        // Not a real calendar day
        assert!(parse_death_comment("[[Property:P570]]: 31 February 2024").is_none());
        assert!(parse_death_comment("").is_none());
    }

    #[test]
    fn test_parse_death_comment_rejects_overlong_year() {
        assert!(parse_death_comment("[[Property:P570]]: 10 March 20245").is_none());
        assert!(parse_death_comment("[[Property:P570]]: 10 March 2024x").is_none());

        let (text, _) = parse_death_comment("[[Property:P570]]: 10 March 2024.").unwrap();
        assert_eq!(text, "10 March 2024");
    }

    #[test]
    fn test_change_event_to_candidate() {
        let event = ChangeEvent {
            server_name: "www.wikidata.org".to_string(),
            title: "Q123".to_string(),
            comment: "[[Property:P570]]: 9 March 2024".to_string(),
            timestamp: None,
        };

        let (record, date) = event.to_candidate().unwrap();
        assert_eq!(record.entity_id, "Q123");
        assert_eq!(record.raw_timestamp_text, "9 March 2024");
        assert_eq!(
            record.metadata.uri.as_deref(),
            Some("http://www.wikidata.org/entity/Q123")
        );
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    }
}
