//! Orchestrator error type

use scbench_core::DiscoveryError;
use scbench_harness::HarnessError;
use scbench_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("no tools selected")]
    NoTools,

    #[error("no cases match filter '{filter}'")]
    NoCases { filter: String },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
