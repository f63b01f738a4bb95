//! CLI command implementations.
//!
//! Each command returns the process exit code on completion. Fatal problems
//! come back as `Err` and are mapped to an exit code by `main`.

pub mod publish;
pub mod reindex;
pub mod run;
pub mod shadow;
pub mod stats;
pub mod sync;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

use media_indexer::catalog::SolrCatalog;
use media_indexer::config::{self, IndexerConfig};
use media_indexer::publish::SolrPublisher;
use media_indexer::sync::SyncStats;

/// Exit status for a pass with per-record errors.
pub const EXIT_ERRORS: i32 = 1;

pub fn load_config(path: &Path) -> Result<IndexerConfig> {
    let config = config::load(path)?;
    tracing::debug!("Loaded settings from {}", path.display());
    Ok(config)
}

pub fn catalog(config: &IndexerConfig) -> Result<SolrCatalog> {
    SolrCatalog::from_config(config)
}

pub fn publisher(config: &IndexerConfig) -> Result<SolrPublisher> {
    SolrPublisher::from_config(config)
}

/// Human form of a pass window.
fn describe_window(since: Option<&DateTime<Utc>>) -> String {
    match since {
        Some(at) => format!("changes since {}", at.format("%Y-%m-%d %H:%M")),
        None => "a full reindex".to_string(),
    }
}

/// End-of-pass summary text, and whether it reports a failure.
fn sync_summary(stats: &SyncStats) -> (String, bool) {
    let window = describe_window(stats.since.as_ref());
    if stats.cancelled {
        (
            format!(
                "Cancelled after {} of {} records ({} errors) while processing {}; checkpoint unchanged.",
                stats.indexed + stats.errors,
                stats.listed,
                stats.errors,
                window
            ),
            true,
        )
    } else if stats.errors > 0 {
        (
            format!(
                "{} errors while updating records, {} other index records created/updated as a result of {}.",
                stats.errors, stats.indexed, window
            ),
            true,
        )
    } else {
        (
            format!(
                "{} index records created/updated as a result of {}.",
                stats.indexed, window
            ),
            false,
        )
    }
}

/// Print the end-of-pass summary and pick the exit code.
pub fn report_sync(stats: &SyncStats) -> i32 {
    match sync_summary(stats) {
        (line, true) => {
            eprintln!("{}", line);
            EXIT_ERRORS
        }
        (line, false) => {
            println!("{}", line);
            0
        }
    }
}
