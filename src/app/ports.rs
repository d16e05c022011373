use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Opaque judgment capability backing the enrichment, matching and
/// normalization stages.
///
/// `instructions` is the stage's fully substituted template, `task` the short
/// user-facing request, and `output_schema` the JSON schema the structured
/// result must conform to. A non-conforming response is a collaborator
/// failure, not a data-level outcome.
#[async_trait]
pub trait ReasoningPort: Send + Sync {
    async fn evaluate(&self, instructions: &str, task: &str, output_schema: &Value) -> Result<Value>;
}

/// External web search provider consumed by the enrichment stage.
///
/// The returned value may be a plain string, an ordered sequence of
/// `{url, content}` result documents, or something else entirely; callers
/// must tolerate all three shapes.
#[async_trait]
pub trait SearchPort: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Value>;
}
