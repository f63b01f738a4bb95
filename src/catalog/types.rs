//! Domain types for catalog records.
//!
//! `CatalogDoc` is the raw field map a catalog returns; `SourceRecord` and
//! `CollectionRecord` are typed views built from it one record at a time so
//! that a malformed record fails on its own.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::IndexerError;

// ============================================================================
// Catalog field names
// ============================================================================

pub const FIELD_ID: &str = "id";
pub const FIELD_LEGACY_ID: &str = "identifier_ssim";
pub const FIELD_COLLECTION: &str = "isMemberOfCollection_ssim";
pub const FIELD_DURATION: &str = "duration_ssi";
pub const FIELD_RESOURCE_TYPE: &str = "avalon_resource_type_ssim";
pub const FIELD_PUBLISHER: &str = "avalon_publisher_ssi";
pub const FIELD_HIDDEN: &str = "hidden_bsi";
pub const FIELD_HAS_THUMBNAIL: &str = "has_thumbnail?_bs";
pub const FIELD_SECTIONS: &str = "section_id_ssim";
pub const FIELD_TITLE: &str = "title_tesim";
pub const FIELD_ASPECT_RATIO: &str = "display_aspect_ratio_ssi";
pub const FIELD_NAME: &str = "name_ssi";
pub const FIELD_UNIT: &str = "unit_ssi";

/// One document as returned by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogDoc(pub Map<String, Value>);

impl CatalogDoc {
    /// Current identifier, if the document carries one.
    pub fn id(&self) -> Option<&str> {
        self.0.get(FIELD_ID).and_then(first).and_then(Value::as_str)
    }

    /// All values of a field; scalars count as a single value.
    pub fn values(&self, field: &str) -> Vec<&Value> {
        match self.0.get(field) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().collect(),
            Some(v) => vec![v],
        }
    }

    /// First value of a field rendered as text.
    pub fn first_string(&self, field: &str) -> Option<String> {
        self.values(field).into_iter().find_map(as_text)
    }

    /// All values of a field rendered as text, in stored order.
    pub fn strings(&self, field: &str) -> Vec<String> {
        self.values(field).into_iter().filter_map(as_text).collect()
    }

    /// First value of a field read as a boolean (`true` or `"true"`).
    pub fn first_bool(&self, field: &str) -> bool {
        match self.values(field).first() {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Build from `(field, value)` pairs. Handy for fakes and tests.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

fn first(v: &Value) -> Option<&Value> {
    match v {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// What kind of media a record (or section) holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    MovingImage,
    AudioRecording,
    Other,
}

impl ResourceType {
    /// Classify catalog resource type labels. Moving image wins when both appear.
    pub fn classify<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels: Vec<String> = labels
            .into_iter()
            .map(|l| l.as_ref().to_ascii_lowercase())
            .collect();
        let has = |wanted: &str| labels.iter().any(|l| l == wanted);
        if has("moving image") {
            ResourceType::MovingImage
        } else if has("sound recording") {
            ResourceType::AudioRecording
        } else {
            ResourceType::Other
        }
    }
}

/// A media object (or one of its sections) as known to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: String,
    /// Legacy identifier, present only for migrated records
    pub old_id: Option<String>,
    pub collection_id: Option<String>,
    /// Milliseconds
    pub duration: Option<u64>,
    pub resource_type: ResourceType,
    pub published: bool,
    /// Undiscoverable but reachable by direct link
    pub hidden: bool,
    pub has_thumbnail: bool,
    /// Child part identifiers in playback order
    pub section_ids: Vec<String>,
    pub title: Option<String>,
    pub aspect_ratio: Option<String>,
}

impl SourceRecord {
    /// Typed view of a catalog document.
    pub fn from_doc(doc: &CatalogDoc) -> Result<Self> {
        let id = doc
            .id()
            .ok_or_else(|| IndexerError::malformed("<unknown>", "document has no id"))?
            .to_string();

        let duration = match doc.first_string(FIELD_DURATION) {
            None => None,
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                IndexerError::malformed(&id, format!("duration \"{}\" is not milliseconds", raw))
            })?),
        };

        Ok(Self {
            old_id: doc.first_string(FIELD_LEGACY_ID).filter(|s| !s.is_empty()),
            collection_id: doc.first_string(FIELD_COLLECTION),
            duration,
            resource_type: ResourceType::classify(doc.strings(FIELD_RESOURCE_TYPE)),
            published: doc.strings(FIELD_PUBLISHER).iter().any(|p| !p.is_empty()),
            hidden: doc.first_bool(FIELD_HIDDEN),
            has_thumbnail: doc.first_bool(FIELD_HAS_THUMBNAIL),
            section_ids: doc.strings(FIELD_SECTIONS),
            title: doc.first_string(FIELD_TITLE),
            aspect_ratio: doc.first_string(FIELD_ASPECT_RATIO),
            id,
        })
    }

    /// Identifier used for index ids and staged file names: legacy first.
    pub fn preferred_id(&self) -> &str {
        self.old_id.as_deref().unwrap_or(&self.id)
    }
}

/// A collection (unit) that owns media objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub id: String,
    pub old_id: Option<String>,
    pub name: Option<String>,
    pub unit: Option<String>,
}

impl CollectionRecord {
    pub fn from_doc(doc: &CatalogDoc) -> Result<Self> {
        let id = doc
            .id()
            .ok_or_else(|| IndexerError::malformed("<unknown>", "collection has no id"))?
            .to_string();
        Ok(Self {
            id,
            old_id: doc.first_string(FIELD_LEGACY_ID).filter(|s| !s.is_empty()),
            name: doc.first_string(FIELD_NAME),
            unit: doc.first_string(FIELD_UNIT),
        })
    }
}
