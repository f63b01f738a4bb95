//! Internal implementation for config module
//!
//! Handles the indexer's TOML settings file: section types, defaults,
//! required-key validation and path expansion.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::IndexerError;

// =============================================================================
// Config Types
// =============================================================================

/// Indexer settings loaded from a TOML file.
/// Every section is optional in the file; required keys are checked by `validate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexerConfig {
    #[serde(default)]
    pub repository: RepositorySection,
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub index: IndexSection,
    #[serde(default)]
    pub staging: StagingSection,
    #[serde(default)]
    pub sync: SyncSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositorySection {
    /// Base URL of the metadata repository
    #[serde(default)]
    pub url: String,
    /// Basic auth user (blank = anonymous)
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSection {
    /// Base URL of the catalog's Solr core
    #[serde(default)]
    pub url: String,
    /// Rows requested per catalog page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    100
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            url: String::new(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSection {
    /// Update handler of the discovery index
    #[serde(default)]
    pub update_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagingSection {
    /// Directory holding one add document per record
    #[serde(default)]
    pub directory: String,
    /// File holding the last successful run time
    #[serde(default)]
    pub checkpoint_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSection {
    /// Comma-separated collection identifiers whose members are always hidden
    #[serde(default)]
    pub collection_blacklist: String,
    /// Public base URL used for links and thumbnails
    #[serde(default)]
    pub public_base_url: String,
    /// Namespace prefix for index identifiers
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    /// Worker threads for transforming records (1 = sequential)
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Per-request HTTP timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_id_prefix() -> String {
    "avalon:".to_string()
}
fn default_workers() -> usize {
    1
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            collection_blacklist: String::new(),
            public_base_url: String::new(),
            id_prefix: default_id_prefix(),
            workers: default_workers(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl IndexerConfig {
    /// Blacklist entries, trimmed, blanks dropped.
    pub fn blacklist_entries(&self) -> Vec<String> {
        self.sync
            .collection_blacklist
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn staging_dir(&self) -> PathBuf {
        expand(&self.staging.directory)
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        expand(&self.staging.checkpoint_file)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.sync.timeout_secs.max(1))
    }

    /// Public base URL without a trailing slash.
    pub fn public_base_url(&self) -> &str {
        self.sync.public_base_url.trim_end_matches('/')
    }

    /// Check the keys every command needs.
    pub fn validate(&self) -> Result<()> {
        require("repository.url", &self.repository.url)?;
        require("catalog.url", &self.catalog.url)?;
        require("staging.directory", &self.staging.directory)?;
        require("staging.checkpoint_file", &self.staging.checkpoint_file)?;
        require("sync.public_base_url", &self.sync.public_base_url)?;
        if self.catalog.page_size == 0 {
            return Err(IndexerError::config("catalog.page_size must be at least 1").into());
        }
        if self.sync.workers == 0 {
            return Err(IndexerError::config("sync.workers must be at least 1").into());
        }
        Ok(())
    }

    /// The index update URL, required only by commands that talk to the index.
    pub fn update_url(&self) -> Result<&str> {
        require("index.update_url", &self.index.update_url)?;
        Ok(self.index.update_url.as_str())
    }
}

fn require(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(IndexerError::config(format!("required setting \"{}\" not set", key)).into());
    }
    Ok(())
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

// =============================================================================
// Load
// =============================================================================

/// Parse settings from TOML text without validating.
pub fn parse(contents: &str) -> Result<IndexerConfig> {
    toml::from_str(contents).map_err(|e| IndexerError::config(e.to_string()).into())
}

/// Load and validate settings from a file
pub fn load(path: &Path) -> Result<IndexerConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read indexer config: {}", path.display()))?;

    let config = parse(&contents)
        .with_context(|| format!("Failed to parse indexer config: {}", path.display()))?;
    config.validate()?;
    Ok(config)
}
