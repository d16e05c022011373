use crate::app::ports::ReasoningPort;
use crate::domain::{Address, MatchOutput};
use crate::error::{ResolverError, Result};
use crate::prompts;
use crate::store::AddressStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Matching stage: presents the full candidate set alongside the target
/// address and its description to the reasoning collaborator, which decides
/// what matches.
///
/// No comparison logic lives here. This stage's obligations are limited to
/// loading the uncorrupted candidate set and threading the structured result
/// back without loss or mutation.
pub struct MatchStage {
    reasoning: Arc<dyn ReasoningPort>,
    store: Arc<dyn AddressStore>,
}

impl MatchStage {
    pub fn new(reasoning: Arc<dyn ReasoningPort>, store: Arc<dyn AddressStore>) -> Self {
        Self { reasoning, store }
    }

    pub async fn run(&self, address: &Address, description: &str) -> Result<MatchOutput> {
        let candidates = self.store.load_all().await?;
        debug!("Loaded {} candidate records for matching", candidates.len());

        let rendered_candidates = serde_json::to_string_pretty(&candidates)?;
        let instructions = prompts::match_instructions(address, description, &rendered_candidates);

        let value = self
            .reasoning
            .evaluate(&instructions, prompts::MATCH_TASK, &output_schema())
            .await?;

        let output: MatchOutput =
            serde_json::from_value(value).map_err(|e| ResolverError::Collaborator {
                message: format!("matching output did not match schema: {}", e),
            })?;

        info!("Matching returned {} record(s)", output.matched_addresses.len());
        Ok(output)
    }
}

fn output_schema() -> Value {
    let address_properties = json!({
        "city": { "type": "string" },
        "zip_code": { "type": "string" },
        "country": { "type": "string" },
        "province": { "type": "string" },
        "address_lines": { "type": "array", "items": { "type": "string" } }
    });
    json!({
        "type": "object",
        "properties": {
            "matchedAddresses": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "city": { "type": "string" },
                        "zip_code": { "type": "string" },
                        "country": { "type": "string" },
                        "province": { "type": "string" },
                        "address_lines": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["id", "city", "zip_code", "country", "province", "address_lines"]
                }
            },
            "newAddress": {
                "type": "object",
                "properties": address_properties
            }
        },
        "required": ["matchedAddresses"]
    })
}
