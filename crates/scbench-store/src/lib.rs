//! Result persistence for scbench
//!
//! Every run is written twice: a JSON document keyed by run id and a flat
//! CSV table with one row per (run, case). Both come from the same
//! `ResultRecord` projection, and the newest pair is also published under a
//! stable `results-latest` name.

mod document;
mod error;
mod publish;
mod record;
mod summary;
mod table;

pub use document::*;
pub use error::*;
pub use publish::*;
pub use record::*;
pub use summary::*;
pub use table::*;
