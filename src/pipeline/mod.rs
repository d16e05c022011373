// Address resolution pipeline: enrichment, matching, decision gate,
// normalization.

pub mod enrich;
pub mod matching;
pub mod normalize;

use crate::app::ports::{ReasoningPort, SearchPort};
use crate::domain::{Address, PipelineState, Resolution};
use crate::error::Result;
use crate::pipeline::enrich::EnrichStage;
use crate::pipeline::matching::MatchStage;
use crate::pipeline::normalize::NormalizeStage;
use crate::store::AddressStore;
use metrics::{counter, histogram};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// States of the resolution state machine. Decision is the only branch
/// point; Terminal is reached from Decision (match found) or Normalization
/// (no match, address registered).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Enrichment,
    Matching,
    Decision,
    Normalization,
    Terminal,
}

/// Pure transition function over the per-request state.
pub fn next_stage(stage: Stage, state: &PipelineState) -> Stage {
    match stage {
        Stage::Enrichment => Stage::Matching,
        Stage::Matching => Stage::Decision,
        Stage::Decision => {
            if state.matched_addresses.is_empty() {
                Stage::Normalization
            } else {
                Stage::Terminal
            }
        }
        Stage::Normalization => Stage::Terminal,
        Stage::Terminal => Stage::Terminal,
    }
}

/// Wires the stages into the resolution graph and executes it per request.
///
/// Each request owns its own `PipelineState`; requests may run concurrently
/// and only meet at the record store, whose `register` is atomic.
pub struct AddressPipeline {
    enrich: EnrichStage,
    matching: MatchStage,
    normalize: NormalizeStage,
}

impl AddressPipeline {
    pub fn new(
        reasoning: Arc<dyn ReasoningPort>,
        search: Arc<dyn SearchPort>,
        store: Arc<dyn AddressStore>,
        max_search_results: usize,
    ) -> Self {
        Self {
            enrich: EnrichStage::new(reasoning.clone(), search, max_search_results),
            matching: MatchStage::new(reasoning.clone(), store.clone()),
            normalize: NormalizeStage::new(reasoning, store),
        }
    }

    /// Resolves one raw address to a terminal outcome.
    ///
    /// A caller-supplied description skips enrichment and enters the graph
    /// at the matching stage.
    #[instrument(skip(self, address, description), fields(request_id = %Uuid::new_v4()))]
    pub async fn resolve(
        &self,
        address: Address,
        description: Option<String>,
    ) -> Result<Resolution> {
        counter!("addr_pipeline_runs_total").increment(1);
        let t_run = std::time::Instant::now();

        let mut stage = if description.is_some() {
            Stage::Matching
        } else {
            Stage::Enrichment
        };
        let mut state = PipelineState::new(address, description);

        loop {
            debug!("Entering stage {:?}", stage);
            match stage {
                Stage::Enrichment => {
                    let output = self.enrich.run(&state.address).await?;
                    state.description = output.description;
                }
                Stage::Matching => {
                    let output = self.matching.run(&state.address, &state.description).await?;
                    if let Some(corrected) = &output.corrected_address {
                        debug!("Collaborator suggested corrected address: {:?}", corrected);
                    }
                    state.matched_addresses = output.matched_addresses;
                }
                Stage::Decision => {
                    // Pure gate, no side effects; routing happens below.
                }
                Stage::Normalization => {
                    let (output, registered) = self.normalize.run(&state.address).await?;
                    state.normalized_address = output.normalized_address;
                    state.description = output.description;
                    state.error = output.error;
                    counter!("addr_pipeline_registrations_total").increment(1);
                    debug!("New canonical record: {}", registered.id);
                }
                Stage::Terminal => break,
            }
            stage = next_stage(stage, &state);
        }

        histogram!("addr_pipeline_run_duration_seconds").record(t_run.elapsed().as_secs_f64());

        if state.matched_addresses.is_empty() {
            info!("Resolution complete: registered new record (error={})", state.error);
            Ok(Resolution::Registered {
                normalized_address: state.normalized_address,
                description: state.description,
                error: state.error,
            })
        } else {
            counter!("addr_pipeline_matches_total").increment(1);
            info!(
                "Resolution complete: matched {} existing record(s)",
                state.matched_addresses.len()
            );
            Ok(Resolution::Matched {
                matched_addresses: state.matched_addresses,
            })
        }
    }
}
