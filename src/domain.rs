use serde::{Deserialize, Serialize};

/// A postal address, validated or not. Fields may be empty strings while the
/// address is still pending normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    pub zip_code: String,
    pub country: String,
    pub province: String,
    pub address_lines: Vec<String>,
}

impl Address {
    /// Renders `address_lines` as a single comma-separated string for prompt
    /// substitution.
    pub fn joined_lines(&self) -> String {
        self.address_lines.join(", ")
    }
}

/// An address persisted in the record store under a stable identifier.
///
/// Identifiers take the form `{COUNTRY}_{index}`, unique per country
/// partition and globally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedAddress {
    pub id: String,
    #[serde(flatten)]
    pub address: Address,
}

/// Per-request working record threaded through the pipeline stages.
///
/// Owned by exactly one pipeline execution; stage outputs merge into it and
/// it is discarded once the terminal response is produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState {
    pub address: Address,
    #[serde(rename = "normalizedAddress")]
    pub normalized_address: Address,
    #[serde(rename = "matchedAddresses")]
    pub matched_addresses: Vec<IdentifiedAddress>,
    pub description: String,
    pub error: bool,
}

impl PipelineState {
    pub fn new(address: Address, description: Option<String>) -> Self {
        Self {
            address,
            description: description.unwrap_or_default(),
            ..Default::default()
        }
    }
}

/// Output contract of the enrichment stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichOutput {
    pub description: String,
}

/// Output contract of the matching stage.
///
/// `corrected_address` is the collaborator's suggested fix for the input when
/// nothing matched; it is recorded but does not alter routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutput {
    #[serde(rename = "matchedAddresses", default)]
    pub matched_addresses: Vec<IdentifiedAddress>,
    #[serde(rename = "newAddress", default)]
    pub corrected_address: Option<Address>,
}

/// Output contract of the normalization stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeOutput {
    #[serde(rename = "normalizedAddress")]
    pub normalized_address: Address,
    pub description: String,
    pub error: bool,
}

/// Terminal payload of one pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resolution {
    /// The address matched one or more canonical records.
    Matched {
        #[serde(rename = "matchedAddresses")]
        matched_addresses: Vec<IdentifiedAddress>,
    },
    /// No match; the normalized address was registered as a new record.
    Registered {
        #[serde(rename = "normalizedAddress")]
        normalized_address: Address,
        description: String,
        error: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identified_address_flattens_fields() {
        let rec = IdentifiedAddress {
            id: "PL_0".to_string(),
            address: Address {
                city: "Warszawa".to_string(),
                zip_code: "01-234".to_string(),
                country: "PL".to_string(),
                province: "mazowieckie".to_string(),
                address_lines: vec!["Plac Konstytucji 12/3".to_string()],
            },
        };
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["id"], "PL_0");
        assert_eq!(value["city"], "Warszawa");
        assert_eq!(value["zip_code"], "01-234");
    }

    #[test]
    fn match_output_tolerates_missing_fields() {
        let out: MatchOutput = serde_json::from_value(json!({})).unwrap();
        assert!(out.matched_addresses.is_empty());
        assert!(out.corrected_address.is_none());
    }

    #[test]
    fn resolution_serializes_to_flat_payloads() {
        let matched = Resolution::Matched {
            matched_addresses: vec![],
        };
        let value = serde_json::to_value(&matched).unwrap();
        assert!(value.get("matchedAddresses").is_some());

        let registered = Resolution::Registered {
            normalized_address: Address::default(),
            description: "ok".to_string(),
            error: false,
        };
        let value = serde_json::to_value(&registered).unwrap();
        assert!(value.get("normalizedAddress").is_some());
        assert_eq!(value["error"], false);
    }
}
