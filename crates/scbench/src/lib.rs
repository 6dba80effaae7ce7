//! scbench: run verification tools over a labeled corpus and record how they do
//!
//! The library side holds the orchestrator; the building blocks live in
//! `scbench-core` (cases, configuration, results), `scbench-harness`
//! (subprocess execution) and `scbench-store` (persistence).

mod error;
mod orchestrator;

pub use error::*;
pub use orchestrator::*;

pub use scbench_core as core;
pub use scbench_harness as harness;
pub use scbench_store as store;
