//! Catalog access for changed and referenced records.
//!
//! "Do X": List the media objects that changed since a point in time, and look
//! up single records (collections, sections) by an exact field value.
//!
//! # Design
//!
//! - **Catalog**: trait seam, so the orchestrator and resolver can run against
//!   an in-memory fake in tests
//! - **SolrCatalog**: the production implementation over HTTP
//! - **collect_pages**: transport-free paging loop shared by all queries
//!
//! # Example
//!
//! ```ignore
//! use media_indexer::catalog::{Catalog, SolrCatalog};
//!
//! let catalog = SolrCatalog::from_config(&config)?;
//! for doc in catalog.list_changed_since(None)? {
//!     println!("{:?}", doc.id());
//! }
//! ```

mod paging;
mod solr;
mod types;

pub use paging::{collect_pages, Page};
pub use solr::{changed_since_query, field_query, solr_date, SolrCatalog};
pub use types::*;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::error::IndexerError;

/// Read-only access to the metadata catalog.
pub trait Catalog: Send + Sync {
    /// Media objects modified at or after `since` (None = every media object),
    /// in catalog order.
    fn list_changed_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<CatalogDoc>>;

    /// Every document whose `field` exactly equals `value`.
    fn find(&self, field: &str, value: &str) -> Result<Vec<CatalogDoc>>;
}

/// Fetch exactly one record by current identifier.
///
/// Zero matches is `IndexerError::NotFound`; several matches is malformed.
pub fn get_record(catalog: &dyn Catalog, id: &str) -> Result<SourceRecord> {
    let mut docs = catalog.find(FIELD_ID, id)?;
    match docs.len() {
        0 => Err(IndexerError::NotFound(id.to_string()).into()),
        1 => SourceRecord::from_doc(&docs.remove(0)),
        n => Err(IndexerError::malformed(id, format!("{} catalog records share this id", n)).into()),
    }
}
