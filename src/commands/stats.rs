use anyhow::Result;
use std::path::Path;

use media_indexer::cancel::CancelFlag;
use media_indexer::repository::FedoraRepository;
use media_indexer::stats;

/// Print the public holdings report.
pub fn execute(config_path: &Path) -> Result<i32> {
    let config = super::load_config(config_path)?;
    let catalog = super::catalog(&config)?;
    let repository = FedoraRepository::from_config(&config)?;

    let report = stats::public_holdings(
        &catalog,
        &repository,
        &config.blacklist_entries(),
        &CancelFlag::new(),
    )?;
    if report.cancelled {
        eprintln!("Cancelled; counts below are partial");
    }
    println!("Title count:      {}", report.titles);
    println!("Media File count: {}", report.media_files);
    println!("Byte count:       {}", report.bytes);
    if report.errors > 0 {
        eprintln!("{} parts or records could not be counted", report.errors);
        return Ok(super::EXIT_ERRORS);
    }
    Ok(if report.cancelled { super::EXIT_ERRORS } else { 0 })
}
