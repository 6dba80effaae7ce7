//! Configuration for a benchmark run
//!
//! One `BenchConfig` value is built by the CLI and passed explicitly into
//! discovery, execution and persistence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Compiler version used when building the corpus
pub const DEFAULT_SOLC_VERSION: &str = "0.8.19";

/// A command run once before cases are executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupStep {
    /// Program to execute
    pub program: PathBuf,
    /// Arguments passed to the program
    pub args: Vec<String>,
}

impl SetupStep {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Render as a shell-like command line for logs
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// How the resource-limiting wrapper is invoked
///
/// `args` may contain the placeholders `{timeout}` (seconds), `{memory}`
/// (MB) and `{report}` (path of the statistics file). The tool command line
/// is appended after the expanded arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperConfig {
    /// Wrapper executable; bare names are looked up on `PATH`
    pub program: PathBuf,
    /// Argument template
    pub args: Vec<String>,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("tools/limit.sh"),
            args: vec![
                "{timeout}".to_string(),
                "{memory}".to_string(),
                "{report}".to_string(),
            ],
        }
    }
}

impl WrapperConfig {
    /// Expand the argument template for one invocation
    pub fn expand_args(&self, timeout_secs: u64, memory_mb: u64, report: &Path) -> Vec<String> {
        let report = report.display().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{timeout}", &timeout_secs.to_string())
                    .replace("{memory}", &memory_mb.to_string())
                    .replace("{report}", &report)
            })
            .collect()
    }
}

/// Configuration for one orchestrator run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Seed for the case permutation
    pub seed: u64,

    /// Wall-clock budget per (tool, case) invocation
    #[serde(with = "duration_secs")]
    pub timeout: Duration,

    /// Memory ceiling per invocation, in MB
    pub memory_limit_mb: u64,

    /// Keep at most this many cases after shuffling
    pub max_cases: Option<usize>,

    /// Regex matched against `source:contract:function`
    pub filter: String,

    /// Skip the corpus build and per-tool setup steps
    pub skip_build: bool,

    /// Ask tools to dump their solver queries
    pub dump_smt: bool,

    /// Root of the benchmark corpus; tools run with this as working directory
    pub project_dir: PathBuf,

    /// Compiled artifacts, relative to `project_dir` unless absolute
    pub artifacts_dir: PathBuf,

    /// Destination of wrapper reports and result files
    pub output_dir: PathBuf,

    /// Directory holding the tool scripts
    pub tools_dir: PathBuf,

    /// Source prefixes that are libraries or shared infrastructure, not cases
    pub excluded_prefixes: Vec<String>,

    /// Command compiling the corpus before discovery
    pub build_step: Option<SetupStep>,

    /// Resource-limiting wrapper
    pub wrapper: WrapperConfig,

    /// Extra arguments appended per tool name
    pub tool_args: BTreeMap<String, Vec<String>>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            timeout: Duration::from_secs(25),
            memory_limit_mb: 16 * 1024,
            max_cases: None,
            filter: ".*".to_string(),
            skip_build: false,
            dump_smt: false,
            project_dir: PathBuf::from("."),
            artifacts_dir: PathBuf::from("out"),
            output_dir: PathBuf::from("."),
            tools_dir: PathBuf::from("tools"),
            excluded_prefixes: vec!["lib".to_string(), "src/common".to_string()],
            build_step: Some(
                SetupStep::new("forge").with_args(["build", "--use", DEFAULT_SOLC_VERSION]),
            ),
            wrapper: WrapperConfig::default(),
            tool_args: BTreeMap::new(),
        }
    }
}

impl BenchConfig {
    /// Resolve a configured path against the project directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    pub fn artifacts_path(&self) -> PathBuf {
        self.resolve(&self.artifacts_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output_dir)
    }

    pub fn tools_path(&self) -> PathBuf {
        self.resolve(&self.tools_dir)
    }

    /// Timeout in whole seconds, as passed to tools and the wrapper
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs().max(1)
    }

    /// Extra arguments configured for a tool
    pub fn extra_args_for(&self, tool: &str) -> &[String] {
        self.tool_args.get(tool).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Durations are written as whole seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
