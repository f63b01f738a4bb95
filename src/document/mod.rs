//! Search index documents.
//!
//! An `IndexDocument` is an ordered list of named fields; a name may repeat.
//! Documents are built by `transform::build`, serialised as Solr add XML by
//! `to_xml`, and read back with `from_xml` when staged artifacts are revisited.

mod transform;
mod xml;

pub use transform::{
    build, correct_aspect_ratio, format_duration, index_id, thumbnail_url, visibility_for,
    TransformContext,
};
pub use xml::replace_single_field;

use anyhow::Result;
use std::fmt;
use std::str::FromStr;

pub const FIELD_ID: &str = "id";
pub const FIELD_REPOSITORY_ID: &str = "repository_id_display";
pub const FIELD_VISIBILITY: &str = "shadowed_location_facet";

/// Discovery state of a record in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    /// Reachable by link, absent from search results
    Undiscoverable,
    Hidden,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Visible => "VISIBLE",
            Visibility::Undiscoverable => "UNDISCOVERABLE",
            Visibility::Hidden => "HIDDEN",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "VISIBLE" => Ok(Visibility::Visible),
            "UNDISCOVERABLE" => Ok(Visibility::Undiscoverable),
            "HIDDEN" => Ok(Visibility::Hidden),
            other => anyhow::bail!("unknown visibility \"{}\"", other),
        }
    }
}

/// One `(name, value, boost)` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexDocument {
    fields: Vec<Field>,
}

impl IndexDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.fields.push(Field {
            name: name.to_string(),
            value: value.into(),
            boost: None,
        });
    }

    pub fn push_boosted(&mut self, name: &str, value: impl Into<String>, boost: f32) {
        self.fields.push(Field {
            name: name.to_string(),
            value: value.into(),
            boost: Some(boost),
        });
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Values of every field called `name`, in document order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.name == name)
            .map(|f| f.value.as_str())
            .collect()
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn count(&self, name: &str) -> usize {
        self.fields.iter().filter(|f| f.name == name).count()
    }

    pub fn id(&self) -> Option<&str> {
        self.first(FIELD_ID)
    }

    /// Visibility, when exactly one well-formed visibility field is present.
    pub fn visibility(&self) -> Option<Visibility> {
        match self.values(FIELD_VISIBILITY).as_slice() {
            [single] => single.parse().ok(),
            _ => None,
        }
    }

    /// Solr add XML for this document.
    pub fn to_xml(&self) -> String {
        xml::render(self)
    }

    /// Parse a single-document Solr add XML.
    pub fn from_xml(text: &str) -> Result<Self> {
        xml::parse(text)
    }
}
