//! Internal implementation for the sync pass.

use anyhow::{Context, Result};
use chrono::Utc;
use rayon::prelude::*;
use std::path::Path;

use super::{RecordOutcome, SyncSettings, SyncStats};
use crate::cancel::CancelFlag;
use crate::catalog::{get_record, Catalog, CatalogDoc, SourceRecord, FIELD_ID, FIELD_LEGACY_ID};
use crate::document::{self, TransformContext};
use crate::error::IndexerError;
use crate::publish::IndexPublisher;
use crate::resolver::{BlacklistSet, CollectionResolver};
use crate::staging;

// ============================================================================
// Per-record environment
// ============================================================================

/// Everything a worker needs to turn one record into a staged document.
/// Shared by reference across the pool.
struct RecordEnv<'a> {
    catalog: &'a dyn Catalog,
    resolver: &'a CollectionResolver<'a>,
    blacklist: &'a BlacklistSet,
    transform: TransformContext<'a>,
    staging_dir: &'a Path,
    publisher: Option<&'a dyn IndexPublisher>,
}

/// What happened to one listed record.
enum Slot {
    Done(RecordOutcome),
    Failed(String),
    /// Not attempted because the pass was cancelled
    Skipped,
}

fn process_record(record: &SourceRecord, env: &RecordEnv<'_>) -> Result<RecordOutcome> {
    let collection_id = record
        .collection_id
        .as_deref()
        .ok_or_else(|| IndexerError::MissingCollection("<none>".to_string()))?;
    let blacklisted = env.blacklist.contains(collection_id);

    tracing::info!(
        "Generating add doc for {}{} belonging to collection {}",
        if blacklisted { "blacklisted " } else { "" },
        record.id,
        collection_id
    );

    let collection = env
        .resolver
        .resolve(collection_id)?
        .ok_or_else(|| IndexerError::MissingCollection(collection_id.to_string()))?;

    let parts = record
        .section_ids
        .iter()
        .map(|section| {
            get_record(env.catalog, section)
                .with_context(|| format!("Failed to fetch section {}", section))
        })
        .collect::<Result<Vec<_>>>()?;

    let doc = document::build(record, &collection, blacklisted, &parts, &env.transform)?;
    let path = staging::write_artifact(env.staging_dir, record.preferred_id(), &doc)?;
    tracing::debug!("Staged {}", path.display());

    let published = match env.publisher {
        Some(publisher) => {
            publisher
                .publish(&doc.to_xml())
                .with_context(|| format!("Failed to publish {}", path.display()))?;
            true
        }
        None => false,
    };

    Ok(RecordOutcome {
        id: record.id.clone(),
        path,
        blacklisted,
        published,
    })
}

fn process_doc(doc: &CatalogDoc, env: &RecordEnv<'_>) -> Slot {
    let label = doc.id().unwrap_or("<unknown>").to_string();
    match SourceRecord::from_doc(doc).and_then(|record| process_record(&record, env)) {
        Ok(outcome) => Slot::Done(outcome),
        Err(e) => {
            tracing::error!("Unable to index {}: {:#}", label, e);
            Slot::Failed(label)
        }
    }
}

// ============================================================================
// Pass
// ============================================================================

pub(crate) fn sync_pass(
    settings: &SyncSettings,
    catalog: &dyn Catalog,
    publisher: Option<&dyn IndexPublisher>,
    cancel: &CancelFlag,
) -> Result<SyncStats> {
    let since = if settings.full {
        None
    } else {
        staging::load_checkpoint(&settings.checkpoint_file)?
    };
    // Upper bound of the window; becomes the next checkpoint
    let started = Utc::now();

    match &since {
        Some(at) => tracing::info!("Indexing records changed since {}", staging::format_checkpoint(at)),
        None => tracing::info!("Indexing all records"),
    }

    let docs = catalog
        .list_changed_since(since)
        .context("Failed to list changed records")?;
    tracing::info!("{} records to index", docs.len());

    let mut stats = SyncStats {
        since,
        listed: docs.len(),
        ..Default::default()
    };

    let resolver = CollectionResolver::new(catalog);
    // Resolved on first use; nothing listed means nothing to resolve
    let blacklist = if docs.is_empty() {
        BlacklistSet::default()
    } else {
        BlacklistSet::build(&settings.blacklist, &resolver)?
    };

    let env = RecordEnv {
        catalog,
        resolver: &resolver,
        blacklist: &blacklist,
        transform: TransformContext {
            id_prefix: &settings.id_prefix,
            public_base_url: &settings.public_base_url,
        },
        staging_dir: &settings.staging_dir,
        publisher,
    };

    let slots = if settings.workers > 1 {
        run_parallel(&docs, &env, settings.workers, cancel)?
    } else {
        run_sequential(&docs, &env, cancel)
    };

    for slot in slots {
        match slot {
            Slot::Done(outcome) => {
                stats.indexed += 1;
                if outcome.blacklisted {
                    stats.blacklisted += 1;
                }
                if outcome.published {
                    stats.published += 1;
                }
            }
            Slot::Failed(id) => {
                stats.errors += 1;
                stats.failed.push(id);
            }
            Slot::Skipped => stats.cancelled = true,
        }
    }

    if stats.cancelled {
        tracing::warn!(
            "Pass cancelled after {} of {} records, checkpoint left unchanged",
            stats.indexed + stats.errors,
            stats.listed
        );
        return Ok(stats);
    }

    staging::save_checkpoint(&settings.checkpoint_file, &started)?;

    if let Some(publisher) = publisher {
        if stats.published > 0 {
            match publisher.commit() {
                Ok(()) => stats.committed = true,
                Err(e) => tracing::error!("Commit failed: {:#}", e),
            }
        }
    }

    Ok(stats)
}

fn run_sequential(docs: &[CatalogDoc], env: &RecordEnv<'_>, cancel: &CancelFlag) -> Vec<Slot> {
    let mut slots = Vec::with_capacity(docs.len());
    for doc in docs {
        if cancel.is_cancelled() {
            slots.push(Slot::Skipped);
            break;
        }
        slots.push(process_doc(doc, env));
    }
    slots
}

fn run_parallel(
    docs: &[CatalogDoc],
    env: &RecordEnv<'_>,
    workers: usize,
    cancel: &CancelFlag,
) -> Result<Vec<Slot>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("Failed to start worker pool")?;

    Ok(pool.install(|| {
        docs.par_iter()
            .map(|doc| {
                if cancel.is_cancelled() {
                    Slot::Skipped
                } else {
                    process_doc(doc, env)
                }
            })
            .collect()
    }))
}

// ============================================================================
// Single record
// ============================================================================

fn find_media_object(catalog: &dyn Catalog, id: &str) -> Result<SourceRecord> {
    for field in [FIELD_ID, FIELD_LEGACY_ID] {
        let docs = catalog.find(field, id)?;
        match docs.as_slice() {
            [doc] => return SourceRecord::from_doc(doc),
            [] => {}
            many => {
                return Err(IndexerError::malformed(
                    id,
                    format!("{} catalog records match {}", many.len(), field),
                )
                .into())
            }
        }
    }
    Err(IndexerError::NotFound(id.to_string()).into())
}

pub(crate) fn index_single(
    settings: &SyncSettings,
    catalog: &dyn Catalog,
    publisher: Option<&dyn IndexPublisher>,
    id: &str,
) -> Result<RecordOutcome> {
    let record = find_media_object(catalog, id)?;
    let resolver = CollectionResolver::new(catalog);
    let blacklist = BlacklistSet::build(&settings.blacklist, &resolver)?;

    let env = RecordEnv {
        catalog,
        resolver: &resolver,
        blacklist: &blacklist,
        transform: TransformContext {
            id_prefix: &settings.id_prefix,
            public_base_url: &settings.public_base_url,
        },
        staging_dir: &settings.staging_dir,
        publisher,
    };

    let outcome =
        process_record(&record, &env).with_context(|| format!("Unable to index {}", id))?;

    if let Some(publisher) = publisher {
        publisher.commit()?;
    }
    Ok(outcome)
}
