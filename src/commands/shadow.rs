use anyhow::Result;
use std::path::Path;

use media_indexer::cancel::CancelFlag;
use media_indexer::repository::FedoraRepository;
use media_indexer::shadow::{self, ShadowStats};
use media_indexer::{lock, IndexerConfig};

pub fn execute(config_path: &Path) -> Result<i32> {
    let config = super::load_config(config_path)?;
    let _guard = lock::acquire(&config.checkpoint_path())?;

    let stats = pass(&config, &CancelFlag::new())?;
    println!(
        "{} staged documents checked, {} newly hidden, {} errors",
        stats.scanned, stats.shadowed, stats.errors
    );
    Ok(if stats.errors > 0 || stats.cancelled {
        super::EXIT_ERRORS
    } else {
        0
    })
}

/// Shadow pass shared with `run`. The caller holds the run lock.
pub(super) fn pass(config: &IndexerConfig, cancel: &CancelFlag) -> Result<ShadowStats> {
    let repository = FedoraRepository::from_config(config)?;
    shadow::reconcile(
        &config.staging_dir(),
        &config.sync.id_prefix,
        &repository,
        cancel,
    )
}
