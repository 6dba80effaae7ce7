//! Harness error types

use scbench_core::StagingError;
use std::path::PathBuf;
use thiserror::Error;

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that abort a run
///
/// Per-case problems such as a limit being hit or a missing verdict line do
/// not show up here; they become an `Unknown` result instead.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// No report file name could be claimed
    #[error(transparent)]
    Staging(#[from] StagingError),

    /// The wrapper program could not be resolved
    #[error("resource-limiting wrapper '{}' not found: {reason}", program.display())]
    WrapperNotFound { program: PathBuf, reason: String },

    /// A tool script is missing from the tools directory
    #[error("{tool}: script {} not found", path.display())]
    ToolNotFound { tool: String, path: PathBuf },

    /// The version probe failed, so results could not be attributed
    #[error("{tool}: version probe failed: {reason}")]
    VersionProbe { tool: String, reason: String },

    /// A build or setup step failed
    #[error("setup step '{command}' failed: {reason}")]
    Setup { command: String, reason: String },

    /// A tool printed a verdict outside the legal set
    #[error("{tool} printed unexpected verdict '{token}' for {case}")]
    UnexpectedVerdict {
        tool: String,
        case: String,
        token: String,
    },
}
