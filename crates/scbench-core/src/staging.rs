//! Collision-free file names in a shared output directory
//!
//! Several runs may share one output directory, so names are claimed with an
//! exclusive create (`O_CREAT | O_EXCL`) rather than by checking for
//! existence first. Candidates are `<stem>-<n>.<ext>` for increasing `n`.

use crate::error::StagingError;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Upper bound on numeric suffixes tried before giving up
pub const MAX_RESERVE_ATTEMPTS: u32 = 1000;

/// A file claimed in the output directory
///
/// The file is removed when the guard is dropped unless `persist` was called.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    file: Option<File>,
    keep: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the open handle, e.g. to write into it or to close it early
    pub fn take_file(&mut self) -> Option<File> {
        self.file.take()
    }

    /// Keep the file on disk and return its path
    pub fn persist(mut self) -> PathBuf {
        self.keep = true;
        self.file = None;
        self.path.clone()
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.keep {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Claim a fresh `<stem>-<n>.<ext>` file in `dir`, creating `dir` if needed
pub fn reserve(dir: &Path, stem: &str, ext: &str) -> Result<StagedFile, StagingError> {
    fs::create_dir_all(dir).map_err(|source| StagingError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for n in 0..MAX_RESERVE_ATTEMPTS {
        let path = dir.join(format!("{stem}-{n}.{ext}"));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => {
                return Ok(StagedFile {
                    path,
                    file: Some(file),
                    keep: false,
                })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(StagingError::Io { path, source }),
        }
    }

    Err(StagingError::Exhausted {
        dir: dir.to_path_buf(),
        stem: stem.to_string(),
        attempts: MAX_RESERVE_ATTEMPTS,
    })
}
