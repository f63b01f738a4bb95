//! Record to index document transformation.
//!
//! Pure: everything the document needs (collection, parts, blacklist verdict)
//! is resolved by the caller and passed in.

use anyhow::Result;

use super::{IndexDocument, Visibility, FIELD_ID, FIELD_REPOSITORY_ID, FIELD_VISIBILITY};
use crate::catalog::{CollectionRecord, ResourceType, SourceRecord};
use crate::error::IndexerError;

/// Relevance boost for collection and unit text.
const CONTEXT_BOOST: f32 = 0.25;

/// Aspect ratio reported for ripped DVDs; no real video has it.
const BOGUS_ASPECT_RATIO: &str = "2.4";
const DVD_ASPECT_RATIO: &str = "1.779";

/// Installation settings the transformer needs.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// Namespace prefix for index ids, e.g. `avalon:`
    pub id_prefix: &'a str,
    /// Public base URL without a trailing slash
    pub public_base_url: &'a str,
}

/// Build the index document for one media object.
///
/// `parts` must be the records for `record.section_ids`, in the same order.
/// An audio section followed by a video section rejects the whole document.
pub fn build(
    record: &SourceRecord,
    collection: &CollectionRecord,
    blacklisted: bool,
    parts: &[SourceRecord],
    ctx: &TransformContext<'_>,
) -> Result<IndexDocument> {
    if parts.len() != record.section_ids.len() {
        return Err(IndexerError::malformed(
            &record.id,
            format!(
                "{} sections listed but {} part records supplied",
                record.section_ids.len(),
                parts.len()
            ),
        )
        .into());
    }
    check_section_order(&record.section_ids, parts)?;

    let mut doc = IndexDocument::new();

    let id = index_id(record, ctx.id_prefix);
    doc.push(FIELD_ID, id.clone());
    doc.push("id_text", id);
    doc.push(FIELD_REPOSITORY_ID, record.id.clone());

    if let Some(title) = &record.title {
        doc.push("title_display", title.clone());
        doc.push("title_text", title.clone());
    }
    doc.push(
        "url_display",
        format!("{}/media_objects/{}", ctx.public_base_url, record.id),
    );
    if let Some(ms) = record.duration {
        doc.push("duration_display", format_duration(ms));
    }

    doc.push("format_facet", "Online");
    doc.push("format_text", "Online");
    match record.resource_type {
        ResourceType::MovingImage => {
            doc.push("format_facet", "Online Video");
            doc.push("format_text", "Online Video");
            doc.push("format_facet", "Video");
        }
        ResourceType::AudioRecording => {
            doc.push("format_facet", "Streaming Audio");
            doc.push("format_text", "Streaming Audio");
            doc.push("format_text", "Sound Recording");
        }
        ResourceType::Other => {}
    }

    doc.push(FIELD_VISIBILITY, visibility_for(record, blacklisted).as_str());

    if let Some(name) = &collection.name {
        doc.push("digital_collection_facet", name.clone());
        doc.push_boosted("digital_collection_text", name.clone(), CONTEXT_BOOST);
    }
    if let Some(unit) = &collection.unit {
        doc.push("unit_display", unit.clone());
        doc.push_boosted("unit_text", unit.clone(), CONTEXT_BOOST);
    }

    if let Some((section_id, _)) = record
        .section_ids
        .iter()
        .zip(parts)
        .find(|(_, part)| part.has_thumbnail)
    {
        doc.push("thumbnail_url_display", thumbnail_url(ctx, section_id));
    }

    for (section_id, part) in record.section_ids.iter().zip(parts) {
        doc.push("part_pid_display", section_id.clone());
        if let Some(ms) = part.duration {
            doc.push("part_duration_display", format_duration(ms));
        }
        if let Some(ratio) = correct_aspect_ratio(part.aspect_ratio.as_deref()) {
            doc.push("display_aspect_ratio_display", ratio);
        }
        doc.push(
            "part_label_display",
            part.title.clone().unwrap_or_else(|| section_id.clone()),
        );
    }

    Ok(doc)
}

fn check_section_order(section_ids: &[String], parts: &[SourceRecord]) -> Result<()> {
    let mut first_audio: Option<&str> = None;
    for (section_id, part) in section_ids.iter().zip(parts) {
        match (part.resource_type, first_audio) {
            (ResourceType::AudioRecording, None) => first_audio = Some(section_id),
            (ResourceType::MovingImage, Some(after)) => {
                return Err(IndexerError::SectionOrdering {
                    section: section_id.clone(),
                    after: after.to_string(),
                }
                .into());
            }
            _ => {}
        }
    }
    Ok(())
}

/// Index id: legacy identifier when present, else the current one, namespaced.
pub fn index_id(record: &SourceRecord, prefix: &str) -> String {
    let id = record.preferred_id();
    if id.starts_with(prefix) {
        id.to_string()
    } else {
        format!("{}{}", prefix, id)
    }
}

/// Blacklist beats publication, publication beats the hidden flag.
pub fn visibility_for(record: &SourceRecord, blacklisted: bool) -> Visibility {
    if blacklisted || !record.published {
        Visibility::Hidden
    } else if record.hidden {
        Visibility::Undiscoverable
    } else {
        Visibility::Visible
    }
}

/// `H:MM:SS` from an hour up, `MM:SS` below. Truncates.
pub fn format_duration(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1000) % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

pub fn correct_aspect_ratio(raw: Option<&str>) -> Option<String> {
    raw.map(|ratio| {
        if ratio == BOGUS_ASPECT_RATIO {
            DVD_ASPECT_RATIO.to_string()
        } else {
            ratio.to_string()
        }
    })
}

pub fn thumbnail_url(ctx: &TransformContext<'_>, section_id: &str) -> String {
    format!("{}/master_files/{}/thumbnail", ctx.public_base_url, section_id)
}
