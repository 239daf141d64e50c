//! Directory traversal and file selection.
//!
//! Walks every regular file under the scan root, stats it, and keeps the
//! files that survive the age and size thresholds. A file that cannot be
//! statted (permissions, deleted mid-scan, broken symlink) is logged and
//! skipped; only an unreadable root aborts the scan.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::filter::Filters;

/// A file discovered during traversal, with the metadata the filters need.
/// Lives only for the duration of one scan.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    pub size: u64,
    pub mtime: SystemTime,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot scan '{root}': {source}")]
    RootUnreadable {
        root: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Recursively collect every eligible file under `root`.
///
/// Symlinks are not followed. The result is sorted by path so a single
/// run's selection is deterministic.
pub fn scan(root: &Path, filters: &Filters) -> Result<Vec<Candidate>, ScanError> {
    let root_meta = std::fs::metadata(root).map_err(|source| ScanError::RootUnreadable {
        root: root.to_path_buf(),
        source,
    })?;
    if !root_meta.is_dir() {
        return Err(ScanError::RootUnreadable {
            root: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    let now = SystemTime::now();
    let mut selected = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(path = %entry.path().display(), error = %err, "skipping: cannot stat");
                continue;
            }
        };
        let mtime = match metadata.modified() {
            Ok(mtime) => mtime,
            Err(err) => {
                warn!(path = %entry.path().display(), error = %err, "skipping: no mtime");
                continue;
            }
        };
        if filters.is_eligible(metadata.len(), mtime, now) {
            selected.push(Candidate {
                path: entry.into_path(),
                size: metadata.len(),
                mtime,
            });
        } else {
            debug!(path = %entry.path().display(), "filtered out");
        }
    }

    selected.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(selected)
}
