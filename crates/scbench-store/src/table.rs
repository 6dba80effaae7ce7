//! CSV results table
//!
//! One header row, then one row per record. Fields containing a comma, a
//! double quote or a line break are quoted with embedded quotes doubled
//! (RFC 4180). Absent values are empty fields; booleans are `1`/`0`.

use crate::document::ResultDocument;
use crate::error::{StoreError, StoreResult};
use crate::record::ResultRecord;
use scbench_core::{Expected, LimitKind, Verdict};
use std::io::{Read, Write};
use std::str::FromStr;

/// Column names, in order
pub const TABLE_COLUMNS: [&str; 19] = [
    "run_id",
    "case_id",
    "source_file",
    "contract",
    "function",
    "signature",
    "legacy_harness",
    "expected",
    "verdict",
    "solved",
    "correct",
    "elapsed_secs",
    "timeout_secs",
    "memory_limit_mb",
    "peak_memory_mb",
    "cpu_percent",
    "exit_status",
    "limit_exceeded",
    "raw_output",
];

fn flag(b: bool) -> String {
    String::from(if b { "1" } else { "0" })
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn to_row(r: &ResultRecord) -> [String; 19] {
    [
        r.run_id.clone(),
        r.case_id.clone(),
        r.source_file.clone(),
        r.contract.clone(),
        r.function.clone(),
        r.signature.clone(),
        flag(r.legacy_harness),
        r.expected.as_str().to_string(),
        r.verdict.as_str().to_string(),
        flag(r.solved),
        opt(r.correct.map(flag)),
        r.elapsed_secs.to_string(),
        r.timeout_secs.to_string(),
        r.memory_limit_mb.to_string(),
        opt(r.peak_memory_mb),
        opt(r.cpu_percent),
        opt(r.exit_status),
        opt(r.limit_exceeded.map(|l| l.as_str())),
        r.raw_output.clone(),
    ]
}

fn needs_quotes(field: &str) -> bool {
    field.contains([',', '"', '\n', '\r'])
}

fn write_row<W: Write, S: AsRef<str>>(w: &mut W, fields: &[S]) -> std::io::Result<()> {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        let field = field.as_ref();
        if needs_quotes(field) {
            write!(w, "\"{}\"", field.replace('"', "\"\""))?;
        } else {
            w.write_all(field.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

/// Write every record of the document, run-major
pub fn write_table<W: Write>(document: &ResultDocument, mut writer: W) -> std::io::Result<()> {
    write_row(&mut writer, &TABLE_COLUMNS[..])?;
    for record in document.records() {
        write_row(&mut writer, &to_row(record)[..])?;
    }
    writer.flush()
}

/// Split CSV text into rows, returning each row with its starting line number
fn split_rows(text: &str) -> StoreResult<Vec<(usize, Vec<String>)>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => {
                    if c == '\n' {
                        line += 1;
                    }
                    field.push(c);
                }
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push((row_line, std::mem::take(&mut row)));
                line += 1;
                row_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(StoreError::Table {
            line: row_line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push((row_line, row));
    }
    Ok(rows)
}

fn parse_flag(s: &str) -> Result<bool, String> {
    match s {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(format!("expected 0 or 1, got '{other}'")),
    }
}

fn parse_opt<T>(s: &str, parse: impl Fn(&str) -> Result<T, String>) -> Result<Option<T>, String> {
    if s.is_empty() {
        Ok(None)
    } else {
        parse(s).map(Some)
    }
}

fn parse_num<T: FromStr>(s: &str) -> Result<T, String> {
    s.parse().map_err(|_| format!("invalid number '{s}'"))
}

fn parse_expected(s: &str) -> Result<Expected, String> {
    match s {
        "safe" => Ok(Expected::Safe),
        "unsafe" => Ok(Expected::Unsafe),
        other => Err(format!("invalid expected label '{other}'")),
    }
}

fn parse_limit(s: &str) -> Result<LimitKind, String> {
    match s {
        "time" => Ok(LimitKind::Time),
        "memory" => Ok(LimitKind::Memory),
        other => Err(format!("invalid limit '{other}'")),
    }
}

fn from_row(f: &[String]) -> Result<ResultRecord, String> {
    if f.len() != TABLE_COLUMNS.len() {
        return Err(format!(
            "expected {} fields, found {}",
            TABLE_COLUMNS.len(),
            f.len()
        ));
    }
    Ok(ResultRecord {
        run_id: f[0].clone(),
        case_id: f[1].clone(),
        source_file: f[2].clone(),
        contract: f[3].clone(),
        function: f[4].clone(),
        signature: f[5].clone(),
        legacy_harness: parse_flag(&f[6])?,
        expected: parse_expected(&f[7])?,
        verdict: Verdict::from_token(&f[8])
            .ok_or_else(|| format!("invalid verdict '{}'", f[8]))?,
        solved: parse_flag(&f[9])?,
        correct: parse_opt(&f[10], parse_flag)?,
        elapsed_secs: parse_num(&f[11])?,
        timeout_secs: parse_num(&f[12])?,
        memory_limit_mb: parse_num(&f[13])?,
        peak_memory_mb: parse_opt(&f[14], parse_num)?,
        cpu_percent: parse_opt(&f[15], parse_num)?,
        exit_status: parse_opt(&f[16], parse_num)?,
        limit_exceeded: parse_opt(&f[17], parse_limit)?,
        raw_output: f[18].clone(),
    })
}

/// Read a table written by `write_table`
pub fn read_table<R: Read>(mut reader: R) -> StoreResult<Vec<ResultRecord>> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| StoreError::io("<table>", e))?;

    let mut rows = split_rows(&text)?.into_iter();
    match rows.next() {
        Some((_, header)) if header == TABLE_COLUMNS => {}
        Some((line, _)) => {
            return Err(StoreError::Table {
                line,
                reason: "unexpected header".to_string(),
            })
        }
        None => {
            return Err(StoreError::Table {
                line: 1,
                reason: "missing header".to_string(),
            })
        }
    }

    rows.map(|(line, fields)| {
        from_row(&fields).map_err(|reason| StoreError::Table { line, reason })
    })
    .collect()
}
