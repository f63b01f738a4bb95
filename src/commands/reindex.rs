use anyhow::Result;
use std::path::Path;

use media_indexer::lock;
use media_indexer::publish::IndexPublisher;
use media_indexer::sync::{self, SyncSettings};

/// Rebuild, stage, publish and commit one record.
pub fn execute(config_path: &Path, id: &str) -> Result<i32> {
    let config = super::load_config(config_path)?;
    let _guard = lock::acquire(&config.checkpoint_path())?;

    let catalog = super::catalog(&config)?;
    let publisher = super::publisher(&config)?;
    let settings = SyncSettings::from_config(&config);

    let outcome = sync::index_one(&settings, &catalog, Some(&publisher as &dyn IndexPublisher), id)?;
    println!(
        "Indexed {}{} -> {}",
        outcome.id,
        if outcome.blacklisted { " (blacklisted)" } else { "" },
        outcome.path.display()
    );
    Ok(0)
}
