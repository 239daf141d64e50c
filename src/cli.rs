//! Command-line surface and orchestration entrypoint.
//!
//! [`run`] is the whole pipeline — parse thresholds, scan, connect, dispatch
//! — extracted from `main` so integration tests can drive it directly.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use crate::b2::B2Client;
use crate::contract::StorageError;
use crate::filter::{parse_age, parse_size, Filters};
use crate::scanner;
use crate::sync::{upload_all, SyncReport};

/// One-way sync of a local directory to a Backblaze B2 bucket.
#[derive(Parser, Debug)]
#[clap(
    name = "b2sync",
    version,
    about = "Upload a local directory tree to a B2 bucket, filtered by file age and size"
)]
pub struct Cli {
    /// Local source directory to sync from
    pub source_dir: PathBuf,

    /// Bucket locator, e.g. b2://my-bucket
    pub b2_bucket: String,

    /// Only sync files modified within this age (e.g. 30d, 1y, 6h, 45m)
    #[clap(long)]
    pub max_age: Option<String>,

    /// Only sync files at least this large (e.g. 10MB, 512KB, or raw bytes)
    #[clap(long)]
    pub min_size: Option<String>,

    /// Maximum number of concurrent uploads
    #[clap(long, default_value_t = 10)]
    pub threads: usize,
}

/// Extract the bucket name from a `scheme://bucket-name` locator.
pub fn bucket_name(locator: &str) -> Result<&str, StorageError> {
    locator
        .split_once("://")
        .map(|(_, name)| name)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| StorageError::InvalidLocator(locator.to_string()))
}

/// Run one full synchronisation: scan, authorize, dispatch, summarise.
///
/// Threshold parse errors, an unreadable scan root, and auth/bucket
/// failures abort immediately. Per-file upload failures do not — they are
/// aggregated into the report, and if any occurred the summary is logged
/// first and an error returned so the process exits non-zero.
pub async fn run(cli: Cli) -> Result<SyncReport> {
    let max_age = cli.max_age.as_deref().map(parse_age).transpose()?;
    let min_size = cli
        .min_size
        .as_deref()
        .map(parse_size)
        .transpose()?
        .unwrap_or(0);
    let filters = Filters { max_age, min_size };

    let candidates = scanner::scan(&cli.source_dir, &filters)?;
    info!(count = candidates.len(), "found files to sync");

    let bucket = bucket_name(&cli.b2_bucket)?;
    let store = B2Client::connect_from_env(bucket).await?;

    let files: Vec<PathBuf> = candidates.into_iter().map(|c| c.path).collect();
    let report = upload_all(&store, &files, cli.threads).await;

    info!(
        attempted = report.attempted,
        succeeded = report.succeeded,
        failed = report.failed,
        "synchronization complete"
    );
    if report.failed > 0 {
        anyhow::bail!("{} of {} uploads failed", report.failed, report.attempted);
    }
    Ok(report)
}
