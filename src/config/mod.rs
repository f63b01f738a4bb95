//! Indexer configuration
//!
//! One TOML file describes where the repository, catalog and index live,
//! where staged documents and the run checkpoint are kept, and which
//! collections are blacklisted.
//!
//! # Example
//!
//! ```no_run
//! use media_indexer::config;
//! use std::path::Path;
//!
//! let config = config::load(Path::new("/etc/media-indexer.toml"))?;
//! println!("Staging into {}", config.staging_dir().display());
//! # Ok::<(), anyhow::Error>(())
//! ```

mod internal;

use anyhow::Result;
use std::path::Path;

pub use internal::{
    CatalogSection, IndexSection, IndexerConfig, RepositorySection, StagingSection, SyncSection,
};

/// Load settings from `path` and check required keys.
///
/// Missing or blank required keys fail with `IndexerError::Config`.
pub fn load(path: &Path) -> Result<IndexerConfig> {
    internal::load(path)
}

/// Parse settings from TOML text (no validation).
pub fn parse(contents: &str) -> Result<IndexerConfig> {
    internal::parse(contents)
}
