//! Staged add documents and the run checkpoint.
//!
//! One XML file per record lives in the staging directory, named from the
//! record's preferred identifier with `:` replaced by `_`. The checkpoint is a
//! single RFC 3339 timestamp in its own file.
//!
//! # Layout
//!
//! ```text
//! <staging.directory>/
//! ├── avalon_1234.xml      # migrated record (legacy id avalon:1234)
//! └── k930bx03f.xml        # record with no legacy id
//! <staging.checkpoint_file>
//! ```

mod checkpoint;

pub use checkpoint::{format_checkpoint, load_checkpoint, parse_checkpoint, save_checkpoint};

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::document::IndexDocument;

/// Staged artifact names: one path segment, `.xml` suffix, no dot files.
fn artifact_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9][A-Za-z0-9_\-]*)\.xml$").expect("static artifact pattern")
    })
}

/// File name for a record's staged document.
pub fn artifact_name(preferred_id: &str) -> String {
    format!("{}.xml", preferred_id.replace(':', "_"))
}

pub fn artifact_path(dir: &Path, preferred_id: &str) -> PathBuf {
    dir.join(artifact_name(preferred_id))
}

/// Write (or overwrite) a record's staged document.
pub fn write_artifact(dir: &Path, preferred_id: &str, doc: &IndexDocument) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create staging directory {}", dir.display()))?;

    let path = artifact_path(dir, preferred_id);
    write_atomic(&path, &doc.to_xml())?;
    Ok(path)
}

/// Replace a file's contents via a sibling `<name>.tmp` and a rename.
/// Readers see the old bytes or the new ones, never a partial write.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .with_context(|| format!("No file name in {}", path.display()))?;
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, contents).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move new contents into {}", path.display()))?;
    Ok(())
}

/// Staged artifacts in the directory, sorted by name.
pub fn list_artifacts(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*.xml");
    let entries = glob::glob(&pattern.to_string_lossy())
        .with_context(|| format!("Bad staging path {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file() && is_artifact(path))
        .collect();
    paths.sort();
    Ok(paths)
}

fn is_artifact(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| artifact_pattern().is_match(n))
}

/// Identifier a staged file was named after.
///
/// Reverses `artifact_name` for the configured namespace: with prefix
/// `avalon:`, `avalon_1234.xml` came from `avalon:1234`. Other names map to
/// their stem. Returns None for files that are not staged artifacts.
pub fn identifier_from_artifact(path: &Path, id_prefix: &str) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = artifact_pattern().captures(name)?.get(1)?.as_str();

    let normalized_prefix = id_prefix.replace(':', "_");
    if !id_prefix.is_empty() && normalized_prefix != id_prefix {
        if let Some(rest) = stem.strip_prefix(&normalized_prefix) {
            if !rest.is_empty() {
                return Some(format!("{}{}", id_prefix, rest));
            }
        }
    }
    Some(stem.to_string())
}
