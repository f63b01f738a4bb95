//! Public holdings report.
//!
//! Counts the published titles outside blacklisted collections, how many
//! media files they hold, and how many bytes those files take. Sizes come from
//! the `file_size` element of each part's `descMetadata` datastream.

use anyhow::{Context, Result};

use crate::cancel::CancelFlag;
use crate::catalog::{Catalog, SourceRecord};
use crate::repository::Repository;
use crate::resolver::{BlacklistSet, CollectionResolver};

const SIZE_DATASTREAM: &str = "descMetadata";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct HoldingsReport {
    pub titles: usize,
    pub media_files: usize,
    pub bytes: u64,
    /// Records or parts that could not be counted
    pub errors: usize,
    /// Stopped early; totals are partial
    pub cancelled: bool,
}

/// Walk every catalog record and total the public holdings.
pub fn public_holdings(
    catalog: &dyn Catalog,
    repository: &dyn Repository,
    blacklist_entries: &[String],
    cancel: &CancelFlag,
) -> Result<HoldingsReport> {
    let resolver = CollectionResolver::new(catalog);
    let blacklist = BlacklistSet::build(blacklist_entries, &resolver)?;
    let docs = catalog
        .list_changed_since(None)
        .context("Failed to list records")?;

    let mut report = HoldingsReport::default();
    for doc in &docs {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        let record = match SourceRecord::from_doc(doc) {
            Ok(record) => record,
            Err(e) => {
                report.errors += 1;
                tracing::error!("Skipping record: {:#}", e);
                continue;
            }
        };
        let in_blacklist = record
            .collection_id
            .as_deref()
            .is_some_and(|c| blacklist.contains(c));
        if !record.published || in_blacklist {
            continue;
        }

        report.titles += 1;
        for part in &record.section_ids {
            report.media_files += 1;
            match part_size(repository, part) {
                Ok(size) => report.bytes += size,
                Err(e) => {
                    report.errors += 1;
                    tracing::error!("No size for {} of {}: {:#}", part, record.id, e);
                }
            }
        }
    }
    Ok(report)
}

fn part_size(repository: &dyn Repository, part: &str) -> Result<u64> {
    let bytes = repository.datastream(part, SIZE_DATASTREAM)?;
    let text = String::from_utf8(bytes).context("descMetadata is not UTF-8")?;
    file_size(&text)
}

/// Value of the first `file_size` element.
fn file_size(xml: &str) -> Result<u64> {
    let doc = roxmltree::Document::parse(xml).context("Failed to parse descMetadata")?;
    let raw = doc
        .descendants()
        .find(|n| n.has_tag_name("file_size"))
        .and_then(|n| n.text())
        .context("descMetadata has no file_size")?;
    raw.trim()
        .parse()
        .with_context(|| format!("file_size \"{}\" is not a byte count", raw))
}
