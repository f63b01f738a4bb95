use anyhow::Result;
use std::path::Path;

use media_indexer::cancel::CancelFlag;
use media_indexer::publish::IndexPublisher;
use media_indexer::sync::{self, SyncSettings, SyncStats};
use media_indexer::{lock, IndexerConfig};

/// One incremental pass, optionally publishing as it goes.
pub fn execute(config_path: &Path, full: bool, publish: bool) -> Result<i32> {
    let config = super::load_config(config_path)?;
    let _guard = lock::acquire(&config.checkpoint_path())?;

    let stats = pass(&config, full, publish, &CancelFlag::new())?;
    if publish {
        println!(
            "Published {} documents{}",
            stats.published,
            if stats.committed { " and committed" } else { "" }
        );
    }
    Ok(super::report_sync(&stats))
}

/// Sync pass shared with `run`. The caller holds the run lock.
pub(super) fn pass(
    config: &IndexerConfig,
    full: bool,
    publish: bool,
    cancel: &CancelFlag,
) -> Result<SyncStats> {
    let catalog = super::catalog(config)?;
    let publisher = if publish {
        Some(super::publisher(config)?)
    } else {
        None
    };

    let mut settings = SyncSettings::from_config(config);
    settings.full = full;

    sync::run(
        &settings,
        &catalog,
        publisher.as_ref().map(|p| p as &dyn IndexPublisher),
        cancel,
    )
}
