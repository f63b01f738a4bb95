//! Collection lookups and the collection blacklist.
//!
//! "Do X": Turn a collection identifier (current or legacy alias) into its
//! record, once per run, and decide whether a collection's members must be
//! hidden.
//!
//! Results are memoised for the life of the resolver, which is one pass.
//! Negative answers are cached too; transport errors are not.

use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::catalog::{Catalog, CollectionRecord, FIELD_ID, FIELD_LEGACY_ID};
use crate::error::IndexerError;

/// Per-run collection lookup with a shared cache.
///
/// Safe to share across worker threads: lookups take the read lock, misses
/// take the write lock to publish their result.
pub struct CollectionResolver<'a> {
    catalog: &'a dyn Catalog,
    cache: RwLock<HashMap<String, Option<CollectionRecord>>>,
}

impl<'a> CollectionResolver<'a> {
    pub fn new(catalog: &'a dyn Catalog) -> Self {
        Self {
            catalog,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve by exact identifier, falling back to the legacy alias.
    ///
    /// Zero or several matches on both fields means not found.
    pub fn resolve(&self, identifier: &str) -> Result<Option<CollectionRecord>> {
        if let Some(hit) = self.cache.read().get(identifier) {
            return Ok(hit.clone());
        }

        let resolved = self.lookup(identifier)?;
        self.cache
            .write()
            .insert(identifier.to_string(), resolved.clone());
        Ok(resolved)
    }

    fn lookup(&self, identifier: &str) -> Result<Option<CollectionRecord>> {
        for field in [FIELD_ID, FIELD_LEGACY_ID] {
            let docs = self
                .catalog
                .find(field, identifier)
                .with_context(|| format!("Failed to look up collection {}", identifier))?;
            match docs.as_slice() {
                [doc] => return CollectionRecord::from_doc(doc).map(Some),
                [] => {}
                many => tracing::warn!(
                    "{} collections match {}:{}, treating as unresolved",
                    many.len(),
                    field,
                    identifier
                ),
            }
        }
        Ok(None)
    }

    /// Number of memoised lookups (hits and misses).
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }
}

/// Collections whose members are always indexed as hidden.
#[derive(Debug, Clone, Default)]
pub struct BlacklistSet {
    ids: HashSet<String>,
}

impl BlacklistSet {
    /// Resolve every configured entry. Any entry that cannot be resolved is a
    /// configuration error.
    pub fn build(entries: &[String], resolver: &CollectionResolver<'_>) -> Result<Self> {
        let mut ids = HashSet::new();
        for entry in entries {
            let collection = resolver
                .resolve(entry)
                .with_context(|| format!("Failed to resolve blacklisted collection {}", entry))?
                .ok_or_else(|| {
                    IndexerError::config(format!(
                        "blacklisted collection \"{}\" could not be resolved",
                        entry
                    ))
                })?;

            ids.insert(entry.clone());
            ids.insert(collection.id);
            if let Some(old_id) = collection.old_id {
                ids.insert(old_id);
            }
        }
        tracing::debug!("Blacklist holds {} identifiers", ids.len());
        Ok(Self { ids })
    }

    pub fn contains(&self, collection_id: &str) -> bool {
        self.ids.contains(collection_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogDoc, FIELD_NAME, FIELD_UNIT};
    use crate::error::is_config_error;
    use chrono::{DateTime, Utc};
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct FakeCatalog {
        docs: Vec<CatalogDoc>,
        finds: Mutex<usize>,
    }

    impl Catalog for FakeCatalog {
        fn list_changed_since(&self, _: Option<DateTime<Utc>>) -> Result<Vec<CatalogDoc>> {
            Ok(self.docs.clone())
        }

        fn find(&self, field: &str, value: &str) -> Result<Vec<CatalogDoc>> {
            *self.finds.lock() += 1;
            Ok(self
                .docs
                .iter()
                .filter(|d| d.strings(field).iter().any(|v| v == value))
                .cloned()
                .collect())
        }
    }

    fn collection(id: &str, legacy: &str, name: &str) -> CatalogDoc {
        CatalogDoc::from_pairs([
            (FIELD_ID, json!(id)),
            (FIELD_LEGACY_ID, json!([legacy])),
            (FIELD_NAME, json!(name)),
            (FIELD_UNIT, json!("Special Collections")),
        ])
    }

    fn catalog() -> FakeCatalog {
        FakeCatalog {
            docs: vec![
                collection("c1", "avalon:1", "Staff Training"),
                collection("c2", "avalon:2011", "Lectures"),
                collection("dup-a", "avalon:77", "Copy A"),
                collection("dup-b", "avalon:77", "Copy B"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_by_primary_id() {
        let catalog = catalog();
        let resolver = CollectionResolver::new(&catalog);
        let found = resolver.resolve("c2").unwrap().unwrap();
        assert_eq!(found.name.as_deref(), Some("Lectures"));
        assert_eq!(*catalog.finds.lock(), 1);
    }

    #[test]
    fn test_resolve_by_legacy_alias() {
        let catalog = catalog();
        let resolver = CollectionResolver::new(&catalog);
        let found = resolver.resolve("avalon:2011").unwrap().unwrap();
        assert_eq!(found.id, "c2");
        assert_eq!(*catalog.finds.lock(), 2);
    }

    #[test]
    fn test_ambiguous_alias_is_not_found() {
        let catalog = catalog();
        let resolver = CollectionResolver::new(&catalog);
        assert!(resolver.resolve("avalon:77").unwrap().is_none());
    }

    #[test]
    fn test_results_are_memoised() {
        let catalog = catalog();
        let resolver = CollectionResolver::new(&catalog);
        resolver.resolve("c1").unwrap();
        resolver.resolve("c1").unwrap();
        resolver.resolve("missing").unwrap();
        resolver.resolve("missing").unwrap();
        // c1: one find; missing: two finds, once
        assert_eq!(*catalog.finds.lock(), 3);
        assert_eq!(resolver.cached(), 2);
    }

    #[test]
    fn test_blacklist_covers_id_and_alias() {
        let catalog = catalog();
        let resolver = CollectionResolver::new(&catalog);
        let blacklist = BlacklistSet::build(&["avalon:1".to_string()], &resolver).unwrap();
        assert!(blacklist.contains("avalon:1"));
        assert!(blacklist.contains("c1"));
        assert!(!blacklist.contains("c2"));
    }

    #[test]
    fn test_unresolvable_blacklist_entry_is_config_error() {
        let catalog = catalog();
        let resolver = CollectionResolver::new(&catalog);
        let err = BlacklistSet::build(&["c1".to_string(), "avalon:404".to_string()], &resolver)
            .unwrap_err();
        assert!(is_config_error(&err));
    }
}
