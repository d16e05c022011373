use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tempfile::tempdir;
use tokio::sync::Mutex;

use address_resolver::app::ports::{ReasoningPort, SearchPort};
use address_resolver::domain::{Address, Resolution};
use address_resolver::pipeline::AddressPipeline;
use address_resolver::store::{AddressStore, JsonFileStore};

struct ScriptedReasoning {
    responses: Mutex<VecDeque<Value>>,
}

impl ScriptedReasoning {
    fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl ReasoningPort for ScriptedReasoning {
    async fn evaluate(
        &self,
        _instructions: &str,
        _task: &str,
        _schema: &Value,
    ) -> address_resolver::error::Result<Value> {
        Ok(self
            .responses
            .lock()
            .await
            .pop_front()
            .expect("reasoning stub exhausted"))
    }
}

struct FixedSearch(Value);

#[async_trait]
impl SearchPort for FixedSearch {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> address_resolver::error::Result<Value> {
        Ok(self.0.clone())
    }
}

fn warsaw_input() -> Address {
    Address {
        city: "Warsaw".to_string(),
        zip_code: "01234".to_string(),
        country: "PL".to_string(),
        province: "mazowieckie".to_string(),
        address_lines: vec!["Plac Konstytucji 12/3".to_string()],
    }
}

fn warszawa_canonical() -> Address {
    Address {
        city: "Warszawa".to_string(),
        zip_code: "01-234".to_string(),
        country: "PL".to_string(),
        province: "Mazowieckie".to_string(),
        address_lines: vec!["Plac Konstytucji 12/3".to_string()],
    }
}

#[tokio::test]
async fn test_match_against_file_backed_store() -> Result<()> {
    let temp_dir = tempdir()?;
    let store_path = temp_dir.path().join("addresses.json");
    let store = Arc::new(JsonFileStore::new(&store_path));
    let seeded = store.register(warszawa_canonical()).await?;
    assert_eq!(seeded.id, "PL_0");

    let mut matched_record = serde_json::to_value(warszawa_canonical())?;
    matched_record["id"] = json!("PL_0");
    let reasoning = Arc::new(ScriptedReasoning::new(vec![
        json!({ "description": "zip code likely 01-234, city exonym of Warszawa" }),
        json!({ "matchedAddresses": [matched_record] }),
    ]));
    let search = Arc::new(FixedSearch(json!([
        { "url": "https://example.com/a", "content": "Plac Konstytucji, Warszawa" }
    ])));
    let pipeline = AddressPipeline::new(reasoning, search, store.clone(), 3);

    let resolution = pipeline.resolve(warsaw_input(), None).await?;
    match resolution {
        Resolution::Matched { matched_addresses } => {
            assert_eq!(matched_addresses.len(), 1);
            assert_eq!(matched_addresses[0].id, "PL_0");
        }
        other => panic!("expected a match, got {other:?}"),
    }

    // The store on disk is untouched by a matched run.
    let records = JsonFileStore::new(&store_path).load_all().await?;
    assert_eq!(records.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_registration_persists_to_disk() -> Result<()> {
    let temp_dir = tempdir()?;
    let store_path = temp_dir.path().join("addresses.json");
    let store = Arc::new(JsonFileStore::new(&store_path));

    let normalized = warszawa_canonical();
    let reasoning = Arc::new(ScriptedReasoning::new(vec![
        json!({ "description": "" }),
        json!({ "matchedAddresses": [] }),
        json!({
            "normalizedAddress": serde_json::to_value(&normalized)?,
            "description": "replaced exonym Warsaw with Warszawa, added zip hyphen",
            "error": false
        }),
    ]));
    let search = Arc::new(FixedSearch(json!([])));
    let pipeline = AddressPipeline::new(reasoning, search, store, 3);

    let resolution = pipeline.resolve(warsaw_input(), None).await?;
    match resolution {
        Resolution::Registered {
            normalized_address,
            error,
            ..
        } => {
            assert_eq!(normalized_address, normalized);
            assert!(!error);
        }
        other => panic!("expected a registration, got {other:?}"),
    }

    // Reload through a fresh handle: exactly one new record, id PL_0.
    let records = JsonFileStore::new(&store_path).load_all().await?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "PL_0");
    assert_eq!(records[0].address, normalized);
    Ok(())
}

#[tokio::test]
async fn test_resolution_payload_shapes() -> Result<()> {
    let temp_dir = tempdir()?;
    let store = Arc::new(JsonFileStore::new(temp_dir.path().join("addresses.json")));

    let reasoning = Arc::new(ScriptedReasoning::new(vec![
        json!({ "matchedAddresses": [] }),
        json!({
            "normalizedAddress": serde_json::to_value(warszawa_canonical())?,
            "description": "normalized",
            "error": false
        }),
    ]));
    let search = Arc::new(FixedSearch(json!([])));
    let pipeline = AddressPipeline::new(reasoning, search, store, 3);

    // Caller-supplied description enters at the matching stage.
    let resolution = pipeline
        .resolve(warsaw_input(), Some("zip is missing a hyphen".to_string()))
        .await?;

    // Wire shape matches the entry point contract.
    let payload = serde_json::to_value(&resolution)?;
    assert!(payload.get("normalizedAddress").is_some());
    assert!(payload.get("description").is_some());
    assert_eq!(payload["error"], false);
    Ok(())
}
