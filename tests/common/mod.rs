//! In-memory stand-ins for the catalog, repository and index.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use media_indexer::catalog::{
    Catalog, CatalogDoc, FIELD_ASPECT_RATIO, FIELD_COLLECTION, FIELD_DURATION,
    FIELD_HAS_THUMBNAIL, FIELD_HIDDEN, FIELD_ID, FIELD_LEGACY_ID, FIELD_NAME, FIELD_PUBLISHER,
    FIELD_RESOURCE_TYPE, FIELD_SECTIONS, FIELD_TITLE, FIELD_UNIT,
};
use media_indexer::publish::IndexPublisher;
use media_indexer::repository::Repository;
use media_indexer::sync::SyncSettings;
use media_indexer::IndexerError;

/// Catalog backed by a document list. Media objects are the documents that
/// have a collection; `list_changed_since` ignores the window.
#[derive(Default)]
pub struct MemoryCatalog {
    pub docs: Mutex<Vec<CatalogDoc>>,
    pub fail_listing: bool,
}

impl MemoryCatalog {
    pub fn new(docs: Vec<CatalogDoc>) -> Self {
        Self {
            docs: Mutex::new(docs),
            fail_listing: false,
        }
    }

    pub fn remove(&self, id: &str) {
        self.docs.lock().unwrap().retain(|d| d.id() != Some(id));
    }
}

impl Catalog for MemoryCatalog {
    fn list_changed_since(&self, _since: Option<DateTime<Utc>>) -> Result<Vec<CatalogDoc>> {
        if self.fail_listing {
            return Err(anyhow!("connection refused"));
        }
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|d| !d.strings(FIELD_COLLECTION).is_empty())
            .cloned()
            .collect())
    }

    fn find(&self, field: &str, value: &str) -> Result<Vec<CatalogDoc>> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.strings(field).iter().any(|v| v == value))
            .cloned()
            .collect())
    }
}

pub fn collection(id: &str, old_id: Option<&str>, name: &str, unit: &str) -> CatalogDoc {
    let mut doc = CatalogDoc::from_pairs([
        (FIELD_ID, json!(id)),
        (FIELD_NAME, json!(name)),
        (FIELD_UNIT, json!(unit)),
    ]);
    if let Some(old) = old_id {
        doc.0.insert(FIELD_LEGACY_ID.to_string(), json!([old]));
    }
    doc
}

/// Builder for media object catalog documents.
pub struct Media {
    fields: Vec<(&'static str, Value)>,
}

impl Media {
    pub fn new(id: &str, collection: &str) -> Self {
        Self {
            fields: vec![
                (FIELD_ID, json!(id)),
                (FIELD_COLLECTION, json!([collection])),
                (FIELD_PUBLISHER, json!("archivist1")),
                (FIELD_TITLE, json!([format!("Title of {}", id)])),
            ],
        }
    }

    pub fn legacy(mut self, old_id: &str) -> Self {
        self.fields.push((FIELD_LEGACY_ID, json!([old_id])));
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.fields.retain(|(k, _)| *k != FIELD_PUBLISHER);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.fields.push((FIELD_HIDDEN, json!(true)));
        self
    }

    pub fn duration(mut self, raw: &str) -> Self {
        self.fields.push((FIELD_DURATION, json!(raw)));
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.fields.retain(|(k, _)| *k != FIELD_TITLE);
        self.fields.push((FIELD_TITLE, json!([title])));
        self
    }

    pub fn kind(mut self, label: &str) -> Self {
        self.fields.push((FIELD_RESOURCE_TYPE, json!([label])));
        self
    }

    pub fn sections(mut self, ids: &[&str]) -> Self {
        self.fields.push((FIELD_SECTIONS, json!(ids)));
        self
    }

    pub fn doc(self) -> CatalogDoc {
        CatalogDoc::from_pairs(self.fields)
    }
}

/// A section (master file) record.
pub fn part(id: &str, kind: &str, duration_ms: u64, thumbnail: bool) -> CatalogDoc {
    CatalogDoc::from_pairs([
        (FIELD_ID, json!(id)),
        (FIELD_RESOURCE_TYPE, json!([kind])),
        (FIELD_DURATION, json!(duration_ms.to_string())),
        (FIELD_HAS_THUMBNAIL, json!(thumbnail)),
        (FIELD_ASPECT_RATIO, json!("2.4")),
    ])
}

/// Repository answering from a table; ids not listed simulate an outage.
#[derive(Default)]
pub struct TableRepository {
    pub present: Mutex<HashMap<String, bool>>,
}

impl TableRepository {
    pub fn set(&self, id: &str, present: bool) {
        self.present.lock().unwrap().insert(id.to_string(), present);
    }
}

impl Repository for TableRepository {
    fn get(&self, id: &str) -> Result<Vec<u8>> {
        Err(IndexerError::NotFound(id.to_string()).into())
    }

    fn datastream(&self, id: &str, _name: &str) -> Result<Vec<u8>> {
        self.get(id)
    }

    fn exists(&self, id: &str) -> Result<bool> {
        match self.present.lock().unwrap().get(id) {
            Some(present) => Ok(*present),
            None => Err(IndexerError::RepositoryStatus {
                id: id.to_string(),
                status: 504,
            }
            .into()),
        }
    }
}

/// Publisher that records what it receives; ids in `reject` are refused.
#[derive(Default)]
pub struct RecordingPublisher {
    pub documents: Mutex<Vec<String>>,
    pub commits: Mutex<usize>,
    pub reject: Vec<String>,
}

impl IndexPublisher for RecordingPublisher {
    fn publish(&self, add_xml: &str) -> Result<()> {
        if self.reject.iter().any(|id| add_xml.contains(id.as_str())) {
            return Err(IndexerError::IndexRejected {
                action: "add".to_string(),
                status: "400 Bad Request".to_string(),
            }
            .into());
        }
        self.documents.lock().unwrap().push(add_xml.to_string());
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        *self.commits.lock().unwrap() += 1;
        Ok(())
    }

    fn optimize(&self) -> Result<()> {
        Ok(())
    }
}

pub fn settings(root: &Path) -> SyncSettings {
    SyncSettings {
        staging_dir: root.join("add-docs"),
        checkpoint_file: root.join("last-run"),
        blacklist: Vec::new(),
        id_prefix: "avalon:".to_string(),
        public_base_url: "https://media.example.edu".to_string(),
        workers: 1,
        full: false,
    }
}
