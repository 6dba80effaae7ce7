//! Flat projection of a case result

use scbench_core::{CaseResult, Expected, LimitKind, RunId, Verdict};
use serde::{Deserialize, Serialize};

/// One persisted row: a case result plus the run it belongs to
///
/// Field order is the column order of the CSV table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub run_id: String,
    pub case_id: String,
    pub source_file: String,
    pub contract: String,
    pub function: String,
    pub signature: String,
    pub legacy_harness: bool,
    pub expected: Expected,
    pub verdict: Verdict,
    pub solved: bool,
    pub correct: Option<bool>,
    pub elapsed_secs: f64,
    pub timeout_secs: u64,
    pub memory_limit_mb: u64,
    pub peak_memory_mb: Option<f64>,
    pub cpu_percent: Option<u32>,
    pub exit_status: Option<i32>,
    pub limit_exceeded: Option<LimitKind>,
    pub raw_output: String,
}

impl ResultRecord {
    pub fn from_result(run_id: &RunId, result: &CaseResult) -> Self {
        Self {
            run_id: run_id.to_string(),
            case_id: result.case.id.to_string(),
            source_file: result.case.source_file().to_string(),
            contract: result.case.contract().to_string(),
            function: result.case.function().to_string(),
            signature: result.case.signature.clone(),
            legacy_harness: result.case.legacy_harness,
            expected: result.case.expected,
            verdict: result.verdict,
            solved: result.solved(),
            correct: result.correct(),
            elapsed_secs: result.elapsed_secs,
            timeout_secs: result.timeout_secs,
            memory_limit_mb: result.memory_limit_mb,
            peak_memory_mb: result.peak_memory_mb,
            cpu_percent: result.cpu_percent,
            exit_status: result.exit_status,
            limit_exceeded: result.limit_exceeded,
            raw_output: result.raw_output.clone(),
        }
    }

    /// Solved with a verdict that contradicts the label
    pub fn is_incorrect(&self) -> bool {
        self.correct == Some(false)
    }
}
