//! Sync engine - one incremental pass from catalog to staged documents.
//!
//! "Do X": Find the media objects that changed since the last checkpoint,
//! turn each into an index document with its collection and section context,
//! stage it (and optionally publish it), then advance the checkpoint.
//!
//! A record that fails is logged, counted and skipped; it never stops the
//! pass. Configuration problems (an unresolvable blacklist entry) and failures
//! to list the catalog or read/write the checkpoint abort the pass.
//!
//! # Example
//!
//! ```ignore
//! use media_indexer::sync;
//!
//! let settings = sync::SyncSettings::from_config(&config);
//! let stats = sync::run(&settings, &catalog, None, &CancelFlag::new())?;
//! println!("{} indexed, {} errors", stats.indexed, stats.errors);
//! ```

mod internal;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::cancel::CancelFlag;
use crate::catalog::Catalog;
use crate::config::IndexerConfig;
use crate::publish::IndexPublisher;

/// What a pass needs to know about this installation.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub staging_dir: PathBuf,
    pub checkpoint_file: PathBuf,
    /// Configured blacklist entries (ids or legacy aliases)
    pub blacklist: Vec<String>,
    pub id_prefix: String,
    pub public_base_url: String,
    /// 1 = sequential in catalog order
    pub workers: usize,
    /// Ignore the checkpoint and list every record
    pub full: bool,
}

impl SyncSettings {
    pub fn from_config(config: &IndexerConfig) -> Self {
        Self {
            staging_dir: config.staging_dir(),
            checkpoint_file: config.checkpoint_path(),
            blacklist: config.blacklist_entries(),
            id_prefix: config.sync.id_prefix.clone(),
            public_base_url: config.public_base_url().to_string(),
            workers: config.sync.workers.max(1),
            full: false,
        }
    }
}

/// Stats returned from a pass.
#[derive(Debug, Default)]
pub struct SyncStats {
    /// Start of the window covered (None = everything)
    pub since: Option<DateTime<Utc>>,
    /// Records listed by the catalog
    pub listed: usize,
    /// Documents staged
    pub indexed: usize,
    /// Staged documents that were blacklisted
    pub blacklisted: usize,
    /// Documents accepted by the index (publish mode)
    pub published: usize,
    /// Per-record failures
    pub errors: usize,
    /// Identifiers of failed records
    pub failed: Vec<String>,
    /// Pass stopped early; checkpoint untouched
    pub cancelled: bool,
    /// Whether the closing commit succeeded (publish mode)
    pub committed: bool,
}

/// Result of staging one record.
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub id: String,
    pub path: PathBuf,
    pub blacklisted: bool,
    pub published: bool,
}

/// Run one pass.
///
/// With a publisher, every staged document is also submitted and a single
/// commit follows the pass.
pub fn run(
    settings: &SyncSettings,
    catalog: &dyn Catalog,
    publisher: Option<&dyn IndexPublisher>,
    cancel: &CancelFlag,
) -> Result<SyncStats> {
    internal::sync_pass(settings, catalog, publisher, cancel)
}

/// Stage (and optionally publish and commit) a single record by identifier.
pub fn index_one(
    settings: &SyncSettings,
    catalog: &dyn Catalog,
    publisher: Option<&dyn IndexPublisher>,
    id: &str,
) -> Result<RecordOutcome> {
    internal::index_single(settings, catalog, publisher, id)
}
