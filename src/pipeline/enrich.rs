use crate::app::ports::{ReasoningPort, SearchPort};
use crate::constants;
use crate::domain::{Address, EnrichOutput};
use crate::error::{ResolverError, Result};
use crate::prompts;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Enrichment stage: gathers corroborating context about the raw address from
/// web search and has the reasoning collaborator summarize it into a
/// free-text description.
pub struct EnrichStage {
    reasoning: Arc<dyn ReasoningPort>,
    search: Arc<dyn SearchPort>,
    max_results: usize,
}

impl EnrichStage {
    pub fn new(
        reasoning: Arc<dyn ReasoningPort>,
        search: Arc<dyn SearchPort>,
        max_results: usize,
    ) -> Self {
        Self {
            reasoning,
            search,
            max_results,
        }
    }

    pub async fn run(&self, address: &Address) -> Result<EnrichOutput> {
        let query = build_combined_address(address);
        debug!("Enrichment query: {}", query);

        let raw_results = self.search.search(&query, self.max_results).await?;
        let formatted = format_search_results(&raw_results);

        let instructions = prompts::enrich_instructions(address, &formatted);
        let value = self
            .reasoning
            .evaluate(&instructions, prompts::ENRICH_TASK, &output_schema())
            .await?;

        serde_json::from_value(value).map_err(|e| ResolverError::Collaborator {
            message: format!("enrichment output did not match schema: {}", e),
        })
    }
}

/// Builds the single combined query string: address lines, city, province
/// (only when non-empty), zip code, country.
pub fn build_combined_address(address: &Address) -> String {
    let mut components = vec![address.joined_lines(), address.city.clone()];
    if !address.province.is_empty() {
        components.push(address.province.clone());
    }
    components.push(address.zip_code.clone());
    components.push(address.country.clone());
    components.join(constants::ADDRESS_PART_SEPARATOR)
}

/// Formats the search payload for prompt substitution.
///
/// A string passes through; a sequence becomes delimited document blocks;
/// anything else degrades to an empty string rather than failing the request.
pub fn format_search_results(raw: &Value) -> String {
    match raw {
        Value::String(text) => text.clone(),
        Value::Array(docs) => docs
            .iter()
            .map(|doc| {
                let url = doc.get("url").and_then(|v| v.as_str()).unwrap_or("");
                let content = doc.get("content").and_then(|v| v.as_str()).unwrap_or("");
                format!("<document href=\"{}\"/>\n{}\n</document>", url, content)
            })
            .collect::<Vec<_>>()
            .join(constants::SEARCH_DOC_SEPARATOR),
        other => {
            warn!("Unrecognized search payload shape: {}", other);
            String::new()
        }
    }
}

fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "description": { "type": "string" }
        },
        "required": ["description"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Address;
    use serde_json::json;

    fn sample_address(province: &str) -> Address {
        Address {
            city: "Warsaw".to_string(),
            zip_code: "01234".to_string(),
            country: "PL".to_string(),
            province: province.to_string(),
            address_lines: vec!["Plac Konstytucji 12/3".to_string()],
        }
    }

    #[test]
    fn combined_address_joins_in_order() {
        let combined = build_combined_address(&sample_address("mazowieckie"));
        assert_eq!(combined, "Plac Konstytucji 12/3, Warsaw, mazowieckie, 01234, PL");
    }

    #[test]
    fn combined_address_skips_empty_province() {
        let combined = build_combined_address(&sample_address(""));
        assert_eq!(combined, "Plac Konstytucji 12/3, Warsaw, 01234, PL");
    }

    #[test]
    fn string_payload_passes_through() {
        assert_eq!(format_search_results(&json!("plain text")), "plain text");
    }

    #[test]
    fn document_sequence_is_formatted_with_separators() {
        let formatted = format_search_results(&json!([
            { "url": "https://a.example", "content": "first" },
            { "url": "https://b.example", "content": "second" }
        ]));
        assert!(formatted.starts_with("<document href=\"https://a.example\"/>\nfirst\n</document>"));
        assert!(formatted.contains("\n\n---\n\n"));
        assert!(formatted.ends_with("second\n</document>"));
    }

    #[test]
    fn empty_sequence_formats_to_empty_string() {
        assert_eq!(format_search_results(&json!([])), "");
    }

    #[test]
    fn unrecognized_payload_degrades_to_empty_string() {
        assert_eq!(format_search_results(&json!(42)), "");
        assert_eq!(format_search_results(&json!({ "weird": true })), "");
        assert_eq!(format_search_results(&Value::Null), "");
    }
}
