use crate::error::FetchResult;
use crate::http::get_json;
use crate::parser::{candidates_from_response, SparqlResponse};
use crate::source::CandidateSource;
use crate::temporal::format_cutoff;
use crate::types::CandidateRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub const SPARQL_ENDPOINT: &str = "https://query.wikidata.org/bigdata/namespace/wdq/sparql";

/// Humans (P31 = Q5) with a date of death (P570) on or after `cutoff`,
/// newest first.
pub fn build_query(cutoff: DateTime<Utc>, language: &str) -> String {
    format!(
        "SELECT ?item ?itemLabel ?desc ?died WHERE {{ \
         ?item wdt:P31 wd:Q5 . \
         ?item wdt:P570 ?died . \
         FILTER (?died >= \"{from}\"^^xsd:dateTime) . \
         SERVICE wikibase:label {{ bd:serviceParam wikibase:language \"{language}\" }} \
         }} ORDER BY DESC(?died)",
        from = format_cutoff(cutoff),
        language = language,
    )
}

pub struct SparqlSource {
    client: reqwest::Client,
    endpoint: String,
    language: String,
    timeout: Duration,
}

impl SparqlSource {
    pub fn new(client: reqwest::Client, language: impl Into<String>, timeout: Duration) -> Self {
        SparqlSource {
            client,
            endpoint: SPARQL_ENDPOINT.to_string(),
            language: language.into(),
            timeout,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn query_url(&self, cutoff: DateTime<Utc>) -> String {
        format!(
            "{}?query={}&format=json",
            self.endpoint,
            urlencoding::encode(&build_query(cutoff, &self.language))
        )
    }
}

#[async_trait]
impl CandidateSource for SparqlSource {
    async fn fetch_candidates(&self, cutoff: DateTime<Utc>) -> FetchResult<Vec<CandidateRecord>> {
        tracing::info!(from = %format_cutoff(cutoff), "Polling query service");

        let url = self.query_url(cutoff);
        let response: SparqlResponse = get_json(&self.client, &url, self.timeout).await?;
        Ok(candidates_from_response(&response))
    }
}
