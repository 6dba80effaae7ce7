//! Error types for case discovery

use std::path::PathBuf;
use thiserror::Error;

/// Result type for discovery operations
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Errors that abort case discovery
///
/// Every variant is fatal: a corpus that cannot be classified is an authoring
/// bug, not something a run should paper over.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The artifacts directory could not be read
    #[error("cannot read artifacts directory {path}: {source}")]
    ArtifactsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An individual artifact could not be read
    #[error("cannot read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact is not valid build output
    #[error("malformed artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An artifact carries neither an AST path nor a compilation target
    #[error("artifact {0} does not record its source file")]
    MissingSourcePath(PathBuf),

    /// Source file is outside both the safe and unsafe roots
    #[error("solidity file is not in the safe or unsafe directories: {0}")]
    UnlabeledSource(String),

    /// Source file is outside both harness-convention directories
    #[error("solidity file is neither in 'ds-test' nor in '1tx-abstract' directory: {0}")]
    UnknownHarness(String),

    /// The test-name filter is not a valid regular expression
    #[error("invalid test filter: {0}")]
    InvalidFilter(#[from] regex::Error),
}

/// Errors claiming a file name in the output directory
#[derive(Debug, Error)]
pub enum StagingError {
    /// Filesystem error other than a name collision
    #[error("cannot create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every candidate name is taken
    #[error(
        "no free file name for '{stem}' in {dir} after {attempts} attempts; clean the output directory"
    )]
    Exhausted {
        dir: PathBuf,
        stem: String,
        attempts: u32,
    },
}
