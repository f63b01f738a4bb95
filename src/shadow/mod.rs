//! Shadow reconciliation - hide staged documents whose source record is gone.
//!
//! "Do X": Walk the staging directory, ask the repository whether each
//! document's record still exists, and flip `shadowed_location_facet` to
//! `HIDDEN` for the ones it confirms are gone. Nothing is ever deleted.
//!
//! Only a confirmed absence shadows a document. A failed existence check is
//! reported as an error and the file is left exactly as it was.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cancel::CancelFlag;
use crate::document::{
    replace_single_field, IndexDocument, Visibility, FIELD_REPOSITORY_ID, FIELD_VISIBILITY,
};
use crate::repository::Repository;
use crate::staging;

/// Stats returned from a reconciliation pass.
#[derive(Debug, Default)]
pub struct ShadowStats {
    /// Staged documents examined
    pub scanned: usize,
    /// Already hidden, skipped without a lookup
    pub already_hidden: usize,
    /// Newly hidden because the record is gone
    pub shadowed: usize,
    pub errors: usize,
    pub failed: Vec<PathBuf>,
    pub cancelled: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    AlreadyHidden,
    Present,
    Shadowed,
}

/// Reconcile every staged document in `dir` against `repository`.
pub fn reconcile(
    dir: &Path,
    id_prefix: &str,
    repository: &dyn Repository,
    cancel: &CancelFlag,
) -> Result<ShadowStats> {
    let mut stats = ShadowStats::default();

    for path in staging::list_artifacts(dir)? {
        if cancel.is_cancelled() {
            stats.cancelled = true;
            break;
        }
        let Some(file_id) = staging::identifier_from_artifact(&path, id_prefix) else {
            continue;
        };
        stats.scanned += 1;

        match reconcile_file(&path, &file_id, repository) {
            Ok(Verdict::AlreadyHidden) => stats.already_hidden += 1,
            Ok(Verdict::Present) => {}
            Ok(Verdict::Shadowed) => {
                stats.shadowed += 1;
                tracing::info!("Shadowed {} ({})", file_id, path.display());
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!("Unable to reconcile {}: {:#}", path.display(), e);
                stats.failed.push(path);
            }
        }
    }

    tracing::info!(
        "Shadow pass: {} scanned, {} shadowed, {} errors",
        stats.scanned,
        stats.shadowed,
        stats.errors
    );
    Ok(stats)
}

fn reconcile_file(path: &Path, file_id: &str, repository: &dyn Repository) -> Result<Verdict> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let doc = IndexDocument::from_xml(&text)?;

    let count = doc.count(FIELD_VISIBILITY);
    if count != 1 {
        bail!("expected one {} field, found {}", FIELD_VISIBILITY, count);
    }
    if doc.visibility() == Some(Visibility::Hidden) {
        return Ok(Verdict::AlreadyHidden);
    }

    // Migrated records are staged under their legacy id
    let id = doc.first(FIELD_REPOSITORY_ID).unwrap_or(file_id);
    let present = repository
        .exists(id)
        .with_context(|| format!("Existence check for {} failed", id))?;
    if present {
        return Ok(Verdict::Present);
    }

    let rewritten = replace_single_field(&text, FIELD_VISIBILITY, Visibility::Hidden.as_str())?;
    staging::write_atomic(path, &rewritten)?;
    Ok(Verdict::Shadowed)
}
