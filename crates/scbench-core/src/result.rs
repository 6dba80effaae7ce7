//! Result types for (tool, case) executions

use crate::case::{Case, Expected};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Verify Unknown never counts as solved
    #[kani::proof]
    fn proof_unknown_is_unsolved() {
        kani::assert(!Verdict::Unknown.is_solved(), "Unknown is not solved");
        kani::assert(
            Verdict::Unknown.correctness(Expected::Safe).is_none(),
            "Unknown has no correctness",
        );
    }

    /// Verify a solved verdict is correct exactly when it matches
    #[kani::proof]
    fn proof_solved_correctness() {
        kani::assert(
            Verdict::Safe.correctness(Expected::Safe) == Some(true),
            "safe/safe is correct",
        );
        kani::assert(
            Verdict::Unsafe.correctness(Expected::Safe) == Some(false),
            "unsafe/safe is incorrect",
        );
    }
}

/// Verdict reported by a tool
///
/// This is a closed set: tokens outside it are a defect of the tool, never a
/// fourth kind of outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Safe,
    Unsafe,
    Unknown,
}

impl Verdict {
    /// Parse a verdict token as written after `result:`
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "safe" => Some(Self::Safe),
            "unsafe" => Some(Self::Unsafe),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Unsafe => "unsafe",
            Self::Unknown => "unknown",
        }
    }

    /// The tool reached a definitive answer
    pub fn is_solved(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// `None` when unsolved, otherwise whether the verdict matches the label
    pub fn correctness(&self, expected: Expected) -> Option<bool> {
        match self {
            Self::Safe => Some(expected == Expected::Safe),
            Self::Unsafe => Some(expected == Expected::Unsafe),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Budget the wrapper reported as exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitKind {
    Time,
    Memory,
}

impl LimitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of running one tool against one case
///
/// Created once per execution and never re-scored; `solved` and `correct`
/// are always derived from `verdict` and the case label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    /// Case that was executed
    pub case: Case,

    /// Parsed verdict
    pub verdict: Verdict,

    /// Wall-clock time of the whole invocation, wrapper included
    pub elapsed_secs: f64,

    /// Peak resident memory reported by the wrapper
    pub peak_memory_mb: Option<f64>,

    /// CPU utilisation reported by the wrapper
    pub cpu_percent: Option<u32>,

    /// Exit status of the tool as seen by the wrapper
    pub exit_status: Option<i32>,

    /// Budget the wrapper reported as exceeded
    pub limit_exceeded: Option<LimitKind>,

    /// Timeout in effect for this run
    pub timeout_secs: u64,

    /// Memory ceiling in effect for this run
    pub memory_limit_mb: u64,

    /// Captured output for post-hoc debugging
    pub raw_output: String,
}

impl CaseResult {
    /// Verdict is not Unknown
    pub fn solved(&self) -> bool {
        self.verdict.is_solved()
    }

    /// `None` when unsolved, otherwise verdict == expected
    pub fn correct(&self) -> Option<bool> {
        self.verdict.correctness(self.case.expected)
    }
}

impl fmt::Display for CaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self.correct() {
            Some(true) => "correct",
            Some(false) => "INCORRECT",
            None => "unsolved",
        };
        write!(
            f,
            "{} -> {} ({}, {:.2}s)",
            self.case.id, self.verdict, mark, self.elapsed_secs
        )
    }
}

/// Identifier of one tool's pass over the case set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunId {
    pub tool: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
}

impl RunId {
    pub fn new(tool: impl Into<String>, version: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            tool: tool.into(),
            version: version.into(),
            started_at,
        }
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Versions like "hevm 0.53.0 [abc]" must stay a single token
        let version: String = self
            .version
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        write!(
            f,
            "{}-{}-{}",
            self.tool,
            version,
            self.started_at.format("%Y%m%dT%H%M%SZ")
        )
    }
}

/// Results of one tool run, in execution order
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRun {
    pub run_id: RunId,
    pub results: Vec<CaseResult>,
}

impl ToolRun {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            results: Vec::new(),
        }
    }

    pub fn solved(&self) -> usize {
        self.results.iter().filter(|r| r.solved()).count()
    }

    pub fn correct(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.correct() == Some(true))
            .count()
    }
}

/// All tool runs of one orchestrator invocation, tool-major
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub runs: Vec<ToolRun>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, run: ToolRun) {
        self.runs.push(run);
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Total number of results across all runs
    pub fn result_count(&self) -> usize {
        self.runs.iter().map(|r| r.results.len()).sum()
    }

    /// Iterate `(run, result)` pairs in tool-major order
    pub fn iter_results(&self) -> impl Iterator<Item = (&RunId, &CaseResult)> {
        self.runs
            .iter()
            .flat_map(|run| run.results.iter().map(move |r| (&run.run_id, r)))
    }
}
