//! Core types for scbench
//!
//! This crate provides the pieces every other part of the harness builds on:
//! - `Case`: one labeled verification obligation discovered from build output
//! - `CaseDiscovery`: turns a directory of compiled artifacts into cases
//! - `CaseResult` / `ResultSet`: outcomes of running tools against cases
//! - `BenchConfig`: the explicit configuration threaded through a run
//! - `reserve`: collision-free file names in a shared output directory

mod case;
mod config;
mod discovery;
mod error;
mod result;
mod staging;

pub use case::*;
pub use config::*;
pub use discovery::*;
pub use error::*;
pub use result::*;
pub use staging::*;
