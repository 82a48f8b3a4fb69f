//! Brave web search adapter.

use crate::error::Result;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Results requested from the API per query.
const RESULT_COUNT: &str = "5";
/// Results included in the summary handed to the model.
const SUMMARY_LIMIT: usize = 3;

const MISSING_KEY_MESSAGE: &str =
    "This is a test web search result. Please provide a Brave API key to get real search results.";
const NO_RESULTS_MESSAGE: &str = "No results found for the query.";

/// Web search through the Brave Search API.
pub struct BraveSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    web: Option<WebResults>,
}

#[derive(Debug, Default, Deserialize)]
struct WebResults {
    #[serde(default)]
    results: Vec<WebResult>,
}

/// One entry of `web.results`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
}

impl BraveSearch {
    pub fn new(client: reqwest::Client, endpoint: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
        }
    }

    /// Search the web and return a formatted summary of the top results.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str) -> Result<String> {
        let Some(api_key) = &self.api_key else {
            return Ok(MISSING_KEY_MESSAGE.to_string());
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("count", RESULT_COUNT),
                ("text_decorations", "true"),
                ("search_lang", "en"),
            ])
            .header("X-Subscription-Token", api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;

        let data: SearchResponse = response.json().await?;
        let results = data.web.map(|w| w.results).unwrap_or_default();
        debug!("Brave returned {} results", results.len());

        Ok(format_results(&results))
    }
}

/// Format the first results that carry both a title and a description.
pub fn format_results(results: &[WebResult]) -> String {
    let formatted: Vec<String> = results
        .iter()
        .take(SUMMARY_LIMIT)
        .filter(|r| !r.title.is_empty() && !r.description.is_empty())
        .map(|r| {
            format!(
                "Title: {}\nSummary: {}\nSource: {}\n",
                r.title, r.description, r.url
            )
        })
        .collect();

    if formatted.is_empty() {
        NO_RESULTS_MESSAGE.to_string()
    } else {
        formatted.join("\n")
    }
}
