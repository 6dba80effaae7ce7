//! Writing result files and the `results-latest` alias
//!
//! Each persist claims fresh `results-<timestamp>-<n>` names with an
//! exclusive create, so concurrent runs sharing an output directory never
//! overwrite each other. The latest alias is replaced by copying into a
//! temporary file and renaming it over the old one.

use crate::document::{write_document, ResultDocument};
use crate::error::{StoreError, StoreResult};
use crate::table::write_table;
use chrono::Utc;
use scbench_core::{reserve, ResultSet, StagedFile};
use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const LATEST_JSON: &str = "results-latest.json";
pub const LATEST_CSV: &str = "results-latest.csv";

/// Files written by one `persist` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub latest_json: PathBuf,
    pub latest_csv: PathBuf,
    pub record_count: usize,
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Wrote {} results to:", self.record_count)?;
        writeln!(f, "  {}", self.json.display())?;
        writeln!(f, "  {}", self.csv.display())?;
        writeln!(f, "  {}", self.latest_json.display())?;
        write!(f, "  {}", self.latest_csv.display())
    }
}

/// Write into a staged file, flush it to disk and keep it
fn write_staged<F>(mut staged: StagedFile, write: F) -> StoreResult<PathBuf>
where
    F: FnOnce(&mut BufWriter<fs::File>) -> StoreResult<()>,
{
    let path = staged.path().to_path_buf();
    let file = staged
        .take_file()
        .ok_or_else(|| StoreError::io(&path, std::io::ErrorKind::NotFound.into()))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    let file = writer
        .into_inner()
        .map_err(|e| StoreError::io(&path, e.into_error()))?;
    file.sync_all().map_err(|e| StoreError::io(&path, e))?;
    Ok(staged.persist())
}

/// Point `alias` at a copy of `source`, replacing any previous alias atomically
pub fn publish_latest(source: &Path, alias: &Path) -> StoreResult<()> {
    let dir = alias.parent().unwrap_or_else(|| Path::new("."));
    let stem = format!(
        ".{}",
        alias
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );
    let mut tmp = reserve(dir, &stem, "tmp")?;
    drop(tmp.take_file());
    fs::copy(source, tmp.path()).map_err(|e| StoreError::io(tmp.path(), e))?;
    fs::rename(tmp.path(), alias).map_err(|e| StoreError::io(alias, e))?;
    // The temporary name is gone after the rename; keep the guard from
    // removing a file someone else may have claimed under it since.
    tmp.persist();
    debug!("Published {} as {}", source.display(), alias.display());
    Ok(())
}

/// Persist a result set as JSON and CSV and refresh the latest aliases
pub fn persist(set: &ResultSet, output_dir: &Path) -> StoreResult<Manifest> {
    let document = ResultDocument::from_result_set(set);
    let stem = format!("results-{}", Utc::now().format("%Y%m%dT%H%M%SZ"));

    let json = write_staged(reserve(output_dir, &stem, "json")?, |w| {
        write_document(&document, &mut *w)?;
        w.write_all(b"\n").map_err(|e| StoreError::io("<json>", e))
    })?;
    let csv = write_staged(reserve(output_dir, &stem, "csv")?, |w| {
        write_table(&document, &mut *w).map_err(|e| StoreError::io("<csv>", e))
    })?;

    let latest_json = output_dir.join(LATEST_JSON);
    let latest_csv = output_dir.join(LATEST_CSV);
    publish_latest(&json, &latest_json)?;
    publish_latest(&csv, &latest_csv)?;

    info!(
        "Persisted {} results to {}",
        document.record_count(),
        json.display()
    );
    Ok(Manifest {
        json,
        csv,
        latest_json,
        latest_csv,
        record_count: document.record_count(),
    })
}
