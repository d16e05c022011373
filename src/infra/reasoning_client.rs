use crate::app::ports::ReasoningPort;
use crate::config::ReasoningConfig;
use crate::error::{ResolverError, Result};
use async_trait::async_trait;
use metrics::histogram;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Reasoning collaborator backed by an OpenAI-compatible chat-completions
/// endpoint with JSON-object response mode.
///
/// Retries are bounded and internal; the pipeline treats the whole call as
/// one opaque collaborator invocation.
pub struct OpenAiReasoningClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_retries: u32,
}

impl OpenAiReasoningClient {
    pub fn new(config: &ReasoningConfig, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            max_retries: config.max_retries,
        }
    }

    pub fn from_env(config: &ReasoningConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ResolverError::Config("OPENAI_API_KEY is not set".to_string()))?;
        Ok(Self::new(config, api_key))
    }

    async fn call_once(&self, instructions: &str, task: &str, output_schema: &Value) -> Result<Value> {
        // json_object mode guarantees syntactically valid JSON; the schema is
        // spelled out in the system message and re-checked by the caller's
        // deserialization.
        let system_prompt = format!(
            "{}\n\nRespond with a single JSON object conforming to this schema:\n{}",
            instructions, output_schema
        );
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": task }
            ],
            "temperature": 0,
            "response_format": { "type": "json_object" }
        });

        let t_call = std::time::Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;
        histogram!("addr_reasoning_call_duration_seconds").record(t_call.elapsed().as_secs_f64());

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ResolverError::Collaborator {
                message: format!("reasoning service returned {}: {}", status, body),
            });
        }

        #[derive(Deserialize)]
        struct Message {
            content: String,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            choices: Vec<Choice>,
        }

        let api_response: ApiResponse = response.json().await?;
        let content = api_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| ResolverError::Collaborator {
                message: "reasoning service returned no choices".to_string(),
            })?;

        serde_json::from_str(&content).map_err(|e| ResolverError::Collaborator {
            message: format!("reasoning service returned non-JSON content: {}", e),
        })
    }
}

#[async_trait]
impl ReasoningPort for OpenAiReasoningClient {
    async fn evaluate(&self, instructions: &str, task: &str, output_schema: &Value) -> Result<Value> {
        let mut attempt = 0;
        loop {
            match self.call_once(instructions, task, output_schema).await {
                Ok(value) => {
                    debug!("Reasoning call succeeded on attempt {}", attempt + 1);
                    return Ok(value);
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!("Reasoning call failed (attempt {}), retrying: {}", attempt, e);
                    tokio::time::sleep(Duration::from_millis(250 * u64::from(attempt))).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
