//! Persisted set of already-archived URLs.
//!
//! The backing file is plain UTF-8, one URL per line, append-only. It is read
//! in full on open and each `record` is flushed to disk before returning, so a
//! crash loses at most the article in flight. Deleting a line by hand makes
//! that URL eligible again on the next run.

use crate::error::{Result, ScribeError};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug)]
pub struct DedupStore {
    path: PathBuf,
    seen: HashSet<String>,
}

impl DedupStore {
    /// Load the store. A missing file is an empty store; the file is only
    /// created by the first `record`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let seen = match std::fs::read_to_string(&path) {
            Ok(raw) => raw
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => HashSet::new(),
            Err(source) => return Err(ScribeError::DedupLoad { path, source }),
        };
        info!("Loaded {} archived URLs from {}", seen.len(), path.display());
        Ok(Self { path, seen })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url.trim())
    }

    /// Append `url` to the store and flush it to disk. Recording a URL that is
    /// already present is a no-op.
    pub fn record(&mut self, url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() || self.seen.contains(url) {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ScribeError::io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ScribeError::io(&self.path, e))?;
        writeln!(file, "{}", url)
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_data())
            .map_err(|e| ScribeError::io(&self.path, e))?;
        self.seen.insert(url.to_string());
        debug!("Recorded {} in {}", url, self.path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
