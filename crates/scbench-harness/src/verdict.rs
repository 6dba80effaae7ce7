//! Verdict scraping from tool output

use crate::report::WrapperReport;
use scbench_core::Verdict;
use tracing::warn;

/// Prefix of the line a tool prints to announce its answer
pub const VERDICT_PREFIX: &str = "result:";

/// What the first `result:` line of a tool's stdout said
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerdictLine {
    /// A legal verdict
    Found(Verdict),
    /// No `result:` line at all
    Missing,
    /// A `result:` line whose token is outside the legal set
    Invalid(String),
}

/// Scan stdout for the first `result: <token>` line
pub fn parse_verdict(stdout: &str) -> VerdictLine {
    for line in stdout.lines() {
        let Some(rest) = line.trim().strip_prefix(VERDICT_PREFIX) else {
            continue;
        };
        let token = rest.trim();
        return match Verdict::from_token(token) {
            Some(v) => VerdictLine::Found(v),
            None => VerdictLine::Invalid(token.to_string()),
        };
    }
    VerdictLine::Missing
}

/// Combine the verdict line with the wrapper report
///
/// A tripped limit means anything printed before the kill is discarded,
/// including a malformed token. Otherwise `Err` carries the offending token.
pub fn classify(line: VerdictLine, report: &WrapperReport) -> Result<Verdict, String> {
    if let Some(limit) = report.limit_exceeded {
        if let VerdictLine::Invalid(token) = &line {
            warn!(
                "Ignoring verdict token '{}' printed before the {} limit fired",
                token,
                limit.as_str()
            );
        }
        return Ok(Verdict::Unknown);
    }
    match line {
        VerdictLine::Invalid(token) => Err(token),
        VerdictLine::Found(v) => Ok(v),
        VerdictLine::Missing => Ok(Verdict::Unknown),
    }
}
