use crate::app::ports::SearchPort;
use crate::config::SearchConfig;
use crate::error::{ResolverError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

/// Web search collaborator backed by a Tavily-style search API.
///
/// The provider's `results` value is returned verbatim; shape tolerance is
/// the enrichment stage's job.
pub struct TavilySearchClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl TavilySearchClient {
    pub fn new(config: &SearchConfig, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key,
        }
    }

    pub fn from_env(config: &SearchConfig) -> Result<Self> {
        let api_key = std::env::var("TAVILY_API_KEY")
            .map_err(|_| ResolverError::Config("TAVILY_API_KEY is not set".to_string()))?;
        Ok(Self::new(config, api_key))
    }
}

#[async_trait]
impl SearchPort for TavilySearchClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Value> {
        debug!("Searching for: {}", query);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "api_key": self.api_key,
                "query": query,
                "max_results": max_results
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ResolverError::Collaborator {
                message: format!("search provider returned {}: {}", status, body),
            });
        }

        let payload: Value = response.json().await?;
        // Tavily nests documents under "results"; pass through whatever shape
        // arrives so the caller can apply its defensive normalization.
        Ok(payload.get("results").cloned().unwrap_or(payload))
    }
}
