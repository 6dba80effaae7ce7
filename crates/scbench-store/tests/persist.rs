//! Persisting a result set and reading both forms back

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use scbench_core::{Case, CaseResult, LimitKind, ResultSet, RunId, ToolRun, Verdict};
use scbench_store::{
    load_document, persist, read_table, summarize, write_table, ResultDocument, LATEST_CSV,
};
use std::fs::{self, File};
use tempfile::TempDir;

fn case(source: &str, function: &str) -> Case {
    Case::new(source, "C", function, format!("{function}(uint256)")).unwrap()
}

fn result(case: Case, verdict: Verdict) -> CaseResult {
    CaseResult {
        case,
        verdict,
        elapsed_secs: 0.75,
        peak_memory_mb: Some(128.5),
        cpu_percent: Some(98),
        exit_status: Some(0),
        limit_exceeded: None,
        timeout_secs: 25,
        memory_limit_mb: 16384,
        raw_output: "STDOUT:\nresult: ok\nSTDERR:\n".to_string(),
    }
}

fn result_set() -> ResultSet {
    let started = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
    let safe = case("src/safe/ds-test/A.sol", "prove_a");
    let unsafe_ = case("src/unsafe/1tx-abstract/B.sol", "check_b");

    let mut hevm = ToolRun::new(RunId::new("hevm", "hevm 0.53.0", started));
    hevm.results.push(result(safe.clone(), Verdict::Safe));
    let mut timed_out = result(unsafe_.clone(), Verdict::Unknown);
    timed_out.limit_exceeded = Some(LimitKind::Time);
    timed_out.peak_memory_mb = None;
    timed_out.cpu_percent = None;
    timed_out.exit_status = Some(124);
    timed_out.raw_output = "STDOUT:\n\nSTDERR:\nkilled, \"timeout\"\r\n".to_string();
    hevm.results.push(timed_out);

    let mut halmos = ToolRun::new(RunId::new("halmos", "0.1.13", started));
    halmos.results.push(result(safe, Verdict::Unsafe));
    halmos.results.push(result(unsafe_, Verdict::Unsafe));

    let mut set = ResultSet::new();
    set.push(hevm);
    set.push(halmos);
    set
}

#[test]
fn test_both_forms_match_the_result_set() {
    let dir = TempDir::new().unwrap();
    let set = result_set();
    let manifest = persist(&set, dir.path()).unwrap();
    assert_eq!(manifest.record_count, 4);

    let expected = ResultDocument::from_result_set(&set);

    let from_json = load_document(&manifest.json).unwrap();
    assert_eq!(from_json, expected);

    let rows = read_table(File::open(&manifest.csv).unwrap()).unwrap();
    assert_eq!(ResultDocument::from_records(rows), expected);
}

#[test]
fn test_latest_alias_matches_newest_files() {
    let dir = TempDir::new().unwrap();
    persist(&ResultSet::new(), dir.path()).unwrap();
    let manifest = persist(&result_set(), dir.path()).unwrap();
    assert_eq!(
        fs::read(&manifest.csv).unwrap(),
        fs::read(dir.path().join(LATEST_CSV)).unwrap()
    );
    let latest = load_document(&manifest.latest_json).unwrap();
    assert_eq!(latest.record_count(), 4);
}

#[test]
fn test_summary_of_persisted_document() {
    let dir = TempDir::new().unwrap();
    let manifest = persist(&result_set(), dir.path()).unwrap();
    let summaries = summarize(&load_document(&manifest.latest_json).unwrap());

    assert_eq!(summaries[0].run_id, "hevm-hevm_0.53.0-20240506T070809Z");
    assert_eq!(summaries[0].correct, 1);
    assert_eq!(summaries[0].timeouts, 1);
    assert_eq!(summaries[1].run_id, "halmos-0.1.13-20240506T070809Z");
    assert_eq!(summaries[1].incorrect, 1);
    assert_eq!(
        summaries[1].incorrect_cases[0].0,
        "src/safe/ds-test/A.sol:C:prove_a"
    );
}

#[test]
fn test_concurrent_persists_never_collide() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let root = root.clone();
            std::thread::spawn(move || persist(&result_set(), &root).unwrap())
        })
        .collect();
    let mut json_files: Vec<_> = handles.into_iter().map(|h| h.join().unwrap().json).collect();
    json_files.sort();
    json_files.dedup();
    assert_eq!(json_files.len(), 4);
    assert_eq!(
        load_document(&root.join("results-latest.json"))
            .unwrap()
            .record_count(),
        4
    );
}

proptest! {
    #[test]
    fn table_preserves_arbitrary_output(raw in ".*", extra in "[ -~\n\r\"]{0,40}") {
        let started = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut run = ToolRun::new(RunId::new("kontrol", "1.0", started));
        let mut r = result(case("src/safe/ds-test/A.sol", "prove_a"), Verdict::Unknown);
        r.raw_output = format!("{raw}{extra}");
        run.results.push(r);
        let mut set = ResultSet::new();
        set.push(run);

        let doc = ResultDocument::from_result_set(&set);
        let mut buf = Vec::new();
        write_table(&doc, &mut buf).unwrap();
        let rows = read_table(buf.as_slice()).unwrap();
        prop_assert_eq!(ResultDocument::from_records(rows), doc);
    }
}
