//! Run checkpoint: when the last completed pass started.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::path::Path;

pub fn format_checkpoint(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_checkpoint(text: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(text.trim())
        .with_context(|| format!("Unreadable checkpoint \"{}\"", text.trim()))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Last checkpoint, or None when no pass has completed yet.
pub fn load_checkpoint(path: &Path) -> Result<Option<DateTime<Utc>>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read checkpoint {}", path.display()))?;
    parse_checkpoint(&text)
        .with_context(|| format!("Corrupt checkpoint file {}", path.display()))
        .map(Some)
}

/// Overwrite the checkpoint. A crash mid-write leaves the previous value.
pub fn save_checkpoint(path: &Path, at: &DateTime<Utc>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    super::write_atomic(path, &format_checkpoint(at))
        .with_context(|| format!("Failed to write checkpoint {}", path.display()))
}
