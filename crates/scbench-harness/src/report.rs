//! Parsing of the wrapper's statistics report
//!
//! The default wrapper writes GNU `time -v` output plus a marker line when a
//! limit is hit. `runlim` style lines are accepted as well so either kind of
//! wrapper can be configured without touching the harness.

use regex::Regex;
use scbench_core::LimitKind;
use std::sync::OnceLock;

/// Marker written by the wrapper when the wall-clock limit fired
pub const TIME_LIMIT_MARKER: &str = "Time limit exceeded";
/// Marker written by the wrapper when the memory ceiling fired
pub const MEMORY_LIMIT_MARKER: &str = "Memory limit exceeded";

/// Statistics recovered from one wrapper report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrapperReport {
    pub peak_memory_mb: Option<f64>,
    pub cpu_percent: Option<u32>,
    pub exit_status: Option<i32>,
    pub limit_exceeded: Option<LimitKind>,
}

struct Patterns {
    max_rss_kb: Regex,
    cpu_percent: Regex,
    exit_status: Regex,
    signal: Regex,
    runlim_space_mb: Regex,
    runlim_result: Regex,
    runlim_status: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("report pattern is valid");
        Patterns {
            max_rss_kb: re(r"^\s*Maximum resident set size \(kbytes\):\s*(\d+)\s*$"),
            cpu_percent: re(r"^\s*Percent of CPU this job got:\s*(\d+)%\s*$"),
            exit_status: re(r"^\s*Exit status:\s*(-?\d+)\s*$"),
            signal: re(r"^\s*Command terminated by signal\s+(\d+)\s*$"),
            runlim_space_mb: re(r"^\[runlim\] space:\s*([0-9.]+)\s*MB\s*$"),
            runlim_result: re(r"^\[runlim\] result:\s*(-?\d+)\s*$"),
            runlim_status: re(r"^\[runlim\] status:\s*out of (time|memory)\s*$"),
        }
    })
}

fn capture<T: std::str::FromStr>(re: &Regex, line: &str) -> Option<T> {
    re.captures(line)?.get(1)?.as_str().parse().ok()
}

/// Parse a wrapper report; unknown lines are ignored and missing fields stay `None`
pub fn parse_report(text: &str) -> WrapperReport {
    let p = patterns();
    let mut report = WrapperReport::default();
    let mut signal: Option<i32> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed == TIME_LIMIT_MARKER {
            report.limit_exceeded = Some(LimitKind::Time);
        } else if trimmed == MEMORY_LIMIT_MARKER {
            report.limit_exceeded.get_or_insert(LimitKind::Memory);
        } else if let Some(kb) = capture::<u64>(&p.max_rss_kb, line) {
            // 0 kB means the platform did not measure it
            report.peak_memory_mb = (kb > 0).then(|| kb as f64 / 1024.0);
        } else if let Some(pct) = capture(&p.cpu_percent, line) {
            report.cpu_percent = Some(pct);
        } else if let Some(code) = capture(&p.exit_status, line) {
            report.exit_status = Some(code);
        } else if let Some(sig) = capture::<i32>(&p.signal, line) {
            signal = Some(sig);
        } else if let Some(mb) = capture::<f64>(&p.runlim_space_mb, line) {
            report.peak_memory_mb = (mb > 0.0).then_some(mb);
        } else if let Some(code) = capture(&p.runlim_result, line) {
            report.exit_status = Some(code);
        } else if let Some(caps) = p.runlim_status.captures(line) {
            report.limit_exceeded = Some(match &caps[1] {
                "time" => LimitKind::Time,
                _ => LimitKind::Memory,
            });
        }
    }

    // GNU time prints "Exit status: 0" after a signal; use the shell convention instead
    if let Some(sig) = signal {
        report.exit_status = Some(128 + sig);
    }
    report
}
