//! Execution harness for scbench
//!
//! Runs one verification tool against one case at a time, through an
//! external resource-limiting wrapper, and turns what comes back into a
//! `CaseResult`. Text scraping is confined to two places: `parse_report`
//! for wrapper statistics and `parse_verdict` for the tool's answer.

mod error;
mod execution;
mod probe;
mod report;
mod tool;
mod verdict;

pub use error::*;
pub use execution::*;
pub use probe::*;
pub use report::*;
pub use tool::*;
pub use verdict::*;
