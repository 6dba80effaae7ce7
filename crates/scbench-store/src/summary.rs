//! Per-run summaries of a results document

use crate::document::ResultDocument;
use scbench_core::{LimitKind, Verdict};
use std::fmt;

/// Counts for one run, plus the cases it got wrong
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: String,
    pub total: usize,
    pub solved: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub timeouts: usize,
    /// `case_id` and verdict of every incorrect result, in run order
    pub incorrect_cases: Vec<(String, Verdict)>,
}

impl RunSummary {
    pub fn unsolved(&self) -> usize {
        self.total - self.solved
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} cases, {} solved, {} correct, {} incorrect, {} unsolved ({} timeouts)",
            self.run_id,
            self.total,
            self.solved,
            self.correct,
            self.incorrect,
            self.unsolved(),
            self.timeouts
        )?;
        for (case_id, verdict) in &self.incorrect_cases {
            write!(f, "\n  incorrect: {case_id} (reported {verdict})")?;
        }
        Ok(())
    }
}

/// Summarize every run of a document, in document order
pub fn summarize(document: &ResultDocument) -> Vec<RunSummary> {
    document
        .runs
        .iter()
        .map(|(run_id, records)| {
            let mut summary = RunSummary {
                run_id: run_id.clone(),
                total: records.len(),
                ..Default::default()
            };
            for r in records {
                if r.solved {
                    summary.solved += 1;
                }
                if r.limit_exceeded == Some(LimitKind::Time) {
                    summary.timeouts += 1;
                }
                match r.correct {
                    Some(true) => summary.correct += 1,
                    Some(false) => {
                        summary.incorrect += 1;
                        summary.incorrect_cases.push((r.case_id.clone(), r.verdict));
                    }
                    None => {}
                }
            }
            summary
        })
        .collect()
}
