use anyhow::Result;
use std::path::Path;

use media_indexer::cancel::CancelFlag;
use media_indexer::lock;

/// Default command: incremental sync, then shadow reconciliation.
pub fn execute(config_path: &Path) -> Result<i32> {
    let config = super::load_config(config_path)?;
    let _guard = lock::acquire(&config.checkpoint_path())?;
    let cancel = CancelFlag::new();

    let stats = super::sync::pass(&config, false, false, &cancel)?;
    let exit = super::report_sync(&stats);
    if stats.cancelled {
        return Ok(exit);
    }

    let shadowed = super::shadow::pass(&config, &cancel)?;
    if shadowed.errors > 0 {
        eprintln!(
            "{} errors while checking staged documents, {} newly hidden.",
            shadowed.errors, shadowed.shadowed
        );
        return Ok(super::EXIT_ERRORS);
    }
    Ok(exit)
}
