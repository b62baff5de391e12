//! Web search tool
//!
//! Sends the query to a configurable HTTP search endpoint and hands the
//! result text back to the model. The endpoint is treated as a black box:
//! JSON replies are flattened to text, anything else is passed through.
//! Failures are returned as `search failed: ...` text.

use async_trait::async_trait;
use reqwest::Client;
use sdk::{Tool, ToolSpec};
use std::time::Duration;
use tracing::{info, warn};

use super::string_arg;

pub const SEARCH_TOOL_NAME: &str = "search";

#[derive(Debug, Clone)]
pub struct SearchTool {
    client: Client,
    endpoint: String,
    query_param: String,
    api_key: Option<String>,
}

impl SearchTool {
    pub fn new(
        endpoint: impl Into<String>,
        query_param: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            query_param: query_param.into(),
            api_key: None,
        })
    }

    /// Send `Authorization: Bearer <key>` with every request
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.is_empty());
        self
    }

    async fn search(&self, query: &str) -> Result<String, String> {
        let mut request = self
            .client
            .get(&self.endpoint)
            .query(&[(self.query_param.as_str(), query)]);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string())?;

        if !status.is_success() {
            return Err(format!("HTTP {}: {}", status, body.trim()));
        }

        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(json) => Ok(flatten_result(&json)),
            Err(_) => Ok(body),
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::with_string_param(
            SEARCH_TOOL_NAME,
            "Search the web for up-to-date information about a concept, library or best practice",
            "query",
            "Search terms",
        )
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> String {
        let Some(query) = string_arg(arguments, "query") else {
            return "search failed: missing 'query' argument".to_string();
        };

        info!("[SEARCH] query: {}", query);

        match self.search(query).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Search failed: {}", e);
                format!("search failed: {}", e)
            }
        }
    }
}

/// Reduce a JSON search reply to the text the model needs.
fn flatten_result(json: &serde_json::Value) -> String {
    for key in ["answer", "result"] {
        if let Some(text) = json.get(key).and_then(|v| v.as_str()) {
            return text.to_string();
        }
    }

    if let Some(results) = json.get("results").and_then(|v| v.as_array()) {
        return results
            .iter()
            .map(flatten_item)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
    }

    match json {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn flatten_item(item: &serde_json::Value) -> String {
    if let Some(s) = item.as_str() {
        return s.to_string();
    }

    let field = |key: &str| item.get(key).and_then(|v| v.as_str()).unwrap_or_default();
    let body = [field("content"), field("snippet")]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or_default();

    [field("title"), body, field("url")]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
