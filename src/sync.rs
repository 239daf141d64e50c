//! Upload dispatch: remote key derivation and the bounded worker pool.
//!
//! The file list is fixed before dispatch starts; at most `concurrency`
//! uploads are in flight at once and completions arrive in no particular
//! order. A per-file failure is logged and counted, never cancels the rest
//! of the pool, and never errors the dispatch call itself — the caller
//! decides what the aggregated [`SyncReport`] means for the exit code.

use std::path::{Component, Path, PathBuf};

use futures::stream::{self, StreamExt};
use tracing::{error, info};

use crate::contract::ObjectStore;

/// Aggregated outcome of one dispatch run.
///
/// `attempted == succeeded + failed` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Derive the remote object key for a local file.
///
/// The key is the path relative to the filesystem root (`/`), not the
/// scanned directory: `/home/user/data/f.txt` becomes
/// `home/user/data/f.txt` regardless of which subtree was scanned.
/// Relative inputs are absolutized against the current directory first;
/// separators are normalized to `/`.
pub fn remote_key(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut parts: Vec<String> = Vec::new();
    for component in absolute.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    parts.join("/")
}

/// Upload every file through `store`, at most `concurrency` at a time.
pub async fn upload_all<S>(store: &S, files: &[PathBuf], concurrency: usize) -> SyncReport
where
    S: ObjectStore + ?Sized,
{
    let concurrency = concurrency.max(1);
    let outcomes: Vec<bool> = stream::iter(files)
        .map(|path| async move {
            let key = remote_key(path);
            match store.upload_file(path, &key).await {
                Ok(()) => {
                    info!(path = %path.display(), key = %key, "uploaded");
                    true
                }
                Err(err) => {
                    error!(path = %path.display(), error = %err, "upload failed");
                    false
                }
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let succeeded = outcomes.iter().filter(|ok| **ok).count();
    SyncReport {
        attempted: files.len(),
        succeeded,
        failed: files.len() - succeeded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_key_is_relative_to_filesystem_root() {
        assert_eq!(remote_key(Path::new("/a/b/c.txt")), "a/b/c.txt");
        assert_eq!(
            remote_key(Path::new("/home/user/data/file.txt")),
            "home/user/data/file.txt"
        );
    }

    #[test]
    fn remote_key_absolutizes_relative_paths() {
        let cwd = std::env::current_dir().unwrap();
        let expected = remote_key(&cwd.join("some/file.txt"));
        assert_eq!(remote_key(Path::new("some/file.txt")), expected);
        assert!(expected.ends_with("some/file.txt"));
        assert!(!expected.starts_with('/'));
    }

    #[test]
    fn remote_key_normalizes_dot_segments() {
        assert_eq!(remote_key(Path::new("/a/b/../c/./d.txt")), "a/c/d.txt");
    }
}
