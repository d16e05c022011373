use crate::app::ports::ReasoningPort;
use crate::domain::{Address, IdentifiedAddress, NormalizeOutput};
use crate::error::{ResolverError, Result};
use crate::prompts;
use crate::store::AddressStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Normalization stage: has the reasoning collaborator validate and rewrite
/// the address into country-conformant form, then registers the result as a
/// new canonical record.
pub struct NormalizeStage {
    reasoning: Arc<dyn ReasoningPort>,
    store: Arc<dyn AddressStore>,
}

impl NormalizeStage {
    pub fn new(reasoning: Arc<dyn ReasoningPort>, store: Arc<dyn AddressStore>) -> Self {
        Self { reasoning, store }
    }

    pub async fn run(&self, address: &Address) -> Result<(NormalizeOutput, IdentifiedAddress)> {
        let instructions = prompts::normalize_instructions(address);
        let value = self
            .reasoning
            .evaluate(&instructions, prompts::NORMALIZE_TASK, &output_schema())
            .await?;

        let output: NormalizeOutput =
            serde_json::from_value(value).map_err(|e| ResolverError::Collaborator {
                message: format!("normalization output did not match schema: {}", e),
            })?;

        // Registration happens whether or not the collaborator flagged the
        // address; see DESIGN.md for the open policy question.
        if output.error {
            warn!("Registering address flagged error=true: {}", output.description);
        }
        let registered = self.store.register(output.normalized_address.clone()).await?;
        info!("Registered normalized address with id {}", registered.id);

        Ok((output, registered))
    }
}

fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "normalizedAddress": {
                "type": "object",
                "properties": {
                    "city": { "type": "string" },
                    "zip_code": { "type": "string" },
                    "country": { "type": "string" },
                    "province": { "type": "string" },
                    "address_lines": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["city", "zip_code", "country", "province", "address_lines"]
            },
            "description": { "type": "string" },
            "error": { "type": "boolean" }
        },
        "required": ["normalizedAddress", "description", "error"]
    })
}
