use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use media_indexer::cancel::CancelFlag;
use media_indexer::publish::{self, IndexPublisher};
use media_indexer::staging;

/// Publish staged documents (every one with `all`) and commit.
pub fn execute(config_path: &Path, all: bool, files: Vec<PathBuf>) -> Result<i32> {
    let config = super::load_config(config_path)?;
    let publisher = super::publisher(&config)?;

    let paths = if all {
        staging::list_artifacts(&config.staging_dir())?
    } else if files.is_empty() {
        bail!("Nothing to publish: name staged files or pass --all");
    } else {
        files
    };

    println!("Publishing {} staged documents...", paths.len());
    let stats = publish::publish_batch(&publisher, &paths, &CancelFlag::new());
    println!(
        "{} published, {} errors{}",
        stats.published,
        stats.errors,
        if stats.committed { ", committed" } else { "" }
    );

    let commit_failed = stats.published > 0 && !stats.committed;
    Ok(if stats.errors > 0 || commit_failed || stats.cancelled {
        super::EXIT_ERRORS
    } else {
        0
    })
}

pub fn commit(config_path: &Path) -> Result<i32> {
    let config = super::load_config(config_path)?;
    super::publisher(&config)?.commit()?;
    println!("Committed");
    Ok(0)
}

pub fn optimize(config_path: &Path) -> Result<i32> {
    let config = super::load_config(config_path)?;
    super::publisher(&config)?.optimize()?;
    println!("Optimized");
    Ok(0)
}
