//! JSON results document
//!
//! The document is a single object mapping run id to the list of records of
//! that run. Runs keep their execution order on write and on read.

use crate::error::{StoreError, StoreResult};
use crate::record::ResultRecord;
use scbench_core::ResultSet;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Records grouped by run, in run order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultDocument {
    pub runs: Vec<(String, Vec<ResultRecord>)>,
}

impl ResultDocument {
    /// Project a result set into its persisted form
    pub fn from_result_set(set: &ResultSet) -> Self {
        let runs = set
            .runs
            .iter()
            .map(|run| {
                let records = run
                    .results
                    .iter()
                    .map(|r| ResultRecord::from_result(&run.run_id, r))
                    .collect();
                (run.run_id.to_string(), records)
            })
            .collect();
        Self { runs }
    }

    /// All records, run-major
    pub fn records(&self) -> impl Iterator<Item = &ResultRecord> {
        self.runs.iter().flat_map(|(_, records)| records.iter())
    }

    pub fn record_count(&self) -> usize {
        self.runs.iter().map(|(_, r)| r.len()).sum()
    }

    /// Regroup flat records (e.g. table rows) by run id, keeping first-seen order
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ResultRecord>,
    {
        let mut runs: Vec<(String, Vec<ResultRecord>)> = Vec::new();
        for record in records {
            match runs.iter_mut().find(|(id, _)| *id == record.run_id) {
                Some((_, group)) => group.push(record),
                None => runs.push((record.run_id.clone(), vec![record])),
            }
        }
        Self { runs }
    }
}

impl Serialize for ResultDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.runs.iter().map(|(id, records)| (id, records)))
    }
}

impl<'de> Deserialize<'de> for ResultDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = ResultDocument;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from run id to result records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut runs = Vec::new();
                while let Some(entry) = map.next_entry::<String, Vec<ResultRecord>>()? {
                    runs.push(entry);
                }
                Ok(ResultDocument { runs })
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

/// Write the document as pretty-printed JSON
pub fn write_document<W: Write>(document: &ResultDocument, writer: W) -> StoreResult<()> {
    serde_json::to_writer_pretty(writer, document)?;
    Ok(())
}

pub fn read_document<R: Read>(reader: R) -> StoreResult<ResultDocument> {
    Ok(serde_json::from_reader(reader)?)
}

/// Load a results document from disk
pub fn load_document(path: &Path) -> StoreResult<ResultDocument> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    read_document(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use scbench_core::{Case, CaseResult, RunId, ToolRun, Verdict};

    fn run(tool: &str, verdicts: &[Verdict]) -> ToolRun {
        let mut run = ToolRun::new(RunId::new(
            tool,
            "1.0",
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        ));
        for (i, verdict) in verdicts.iter().enumerate() {
            run.results.push(CaseResult {
                case: Case::new(
                    "src/safe/ds-test/A.sol",
                    "A",
                    format!("prove_{i}"),
                    format!("prove_{i}()"),
                )
                .unwrap(),
                verdict: *verdict,
                elapsed_secs: 0.5 + i as f64,
                peak_memory_mb: Some(64.0),
                cpu_percent: None,
                exit_status: Some(0),
                limit_exceeded: None,
                timeout_secs: 25,
                memory_limit_mb: 1024,
                raw_output: String::new(),
            });
        }
        run
    }

    fn set() -> ResultSet {
        let mut set = ResultSet::new();
        // Non-alphabetical tool order to catch accidental key sorting
        set.push(run("kontrol", &[Verdict::Safe, Verdict::Unknown]));
        set.push(run("hevm", &[Verdict::Unsafe]));
        set
    }

    #[test]
    fn test_keys_in_run_order() {
        let doc = ResultDocument::from_result_set(&set());
        let mut buf = Vec::new();
        write_document(&doc, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let kontrol = text.find("\"kontrol-1.0-20240102T030405Z\"").unwrap();
        let hevm = text.find("\"hevm-1.0-20240102T030405Z\"").unwrap();
        assert!(kontrol < hevm);
    }

    #[test]
    fn test_read_back_preserves_order_and_values() {
        let doc = ResultDocument::from_result_set(&set());
        let mut buf = Vec::new();
        write_document(&doc, &mut buf).unwrap();
        let back = read_document(buf.as_slice()).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.runs[0].0, "kontrol-1.0-20240102T030405Z");
        assert_eq!(back.record_count(), 3);
    }

    #[test]
    fn test_from_records_regroups() {
        let doc = ResultDocument::from_result_set(&set());
        let flat: Vec<ResultRecord> = doc.records().cloned().collect();
        assert_eq!(ResultDocument::from_records(flat), doc);
    }

    #[test]
    fn test_empty_document() {
        let doc = ResultDocument::default();
        let mut buf = Vec::new();
        write_document(&doc, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{}");
    }

    #[test]
    fn test_rejects_non_map() {
        assert!(matches!(
            read_document("[1, 2]".as_bytes()),
            Err(StoreError::Json(_))
        ));
    }
}
