//! Error taxonomy for the indexer.
//!
//! Most functions return `anyhow::Result`. The kinds below ride inside
//! `anyhow::Error` and are recovered with `downcast_ref` wherever behavior
//! depends on what went wrong (fatal vs per-record, lock held, confirmed absence).

use thiserror::Error;

/// Typed failures the pipeline needs to tell apart.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Missing or unusable setting, or an unresolvable blacklist entry. Fatal.
    #[error("configuration error: {0}")]
    Config(String),

    /// An audio section was followed by a video section.
    #[error("section {section} is moving image but follows audio section {after}")]
    SectionOrdering { section: String, after: String },

    /// The record's owning collection could not be resolved.
    #[error("collection {0} could not be resolved")]
    MissingCollection(String),

    /// A catalog field was present but could not be interpreted.
    #[error("malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },

    /// The repository confirmed the object does not exist.
    #[error("object {0} not found")]
    NotFound(String),

    /// The repository answered with a status that is neither success nor absence.
    #[error("repository returned {status} for {id}")]
    RepositoryStatus { id: String, status: u16 },

    /// The search index refused a submitted document or administrative action.
    #[error("index rejected {action}: {status}")]
    IndexRejected { action: String, status: String },

    /// Another process holds the run lock.
    #[error("another instance is already running (PID {0})")]
    LockHeld(u32),
}

impl IndexerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// True when `err` (or anything in its chain) is a configuration error.
pub fn is_config_error(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| matches!(cause.downcast_ref::<IndexerError>(), Some(IndexerError::Config(_))))
}

/// Returns the PID of the holder when `err` is a lock conflict.
pub fn lock_holder(err: &anyhow::Error) -> Option<u32> {
    err.chain().find_map(|cause| match cause.downcast_ref::<IndexerError>() {
        Some(IndexerError::LockHeld(pid)) => Some(*pid),
        _ => None,
    })
}
