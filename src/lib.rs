//! b2sync: one-way sync of a local directory tree to a Backblaze B2
//! bucket, with age and size filters and a bounded pool of concurrent
//! uploads.
//!
//! A run is a single pass: scan the source directory, keep the files that
//! satisfy the thresholds, authorize against B2, upload every survivor
//! (remote keys are the path relative to the filesystem root), and report
//! counts. No state is kept between runs and nothing is ever downloaded.

pub mod b2;
pub mod cli;
pub mod contract;
pub mod filter;
pub mod scanner;
pub mod sync;
