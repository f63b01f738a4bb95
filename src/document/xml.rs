//! Solr add XML codec.
//!
//! Output is deterministic: same fields, same bytes.

use anyhow::{bail, Context, Result};

use super::{Field, IndexDocument};

pub(super) fn render(doc: &IndexDocument) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<add>\n  <doc>\n");
    for field in doc.fields() {
        out.push_str("    ");
        out.push_str(&render_field(field));
        out.push('\n');
    }
    out.push_str("  </doc>\n</add>\n");
    out
}

fn render_field(field: &Field) -> String {
    match field.boost {
        Some(boost) => format!(
            "<field name=\"{}\" boost=\"{}\">{}</field>",
            escape(&field.name),
            boost,
            escape(&field.value)
        ),
        None => format!(
            "<field name=\"{}\">{}</field>",
            escape(&field.name),
            escape(&field.value)
        ),
    }
}

/// Characters XML 1.0 allows in content.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Escape markup and drop characters no XML parser would accept.
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars().filter(|c| is_xml_char(*c)) {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

pub(super) fn parse(text: &str) -> Result<IndexDocument> {
    let xml = roxmltree::Document::parse(text).context("Failed to parse add document")?;
    let root = xml.root_element();
    if !root.has_tag_name("add") {
        bail!("expected <add> root, found <{}>", root.tag_name().name());
    }
    let doc_node = root
        .children()
        .find(|n| n.has_tag_name("doc"))
        .context("add document has no <doc>")?;

    let mut doc = IndexDocument::new();
    for node in doc_node.children().filter(|n| n.has_tag_name("field")) {
        let name = node.attribute("name").context("field without a name")?;
        let value = node.text().unwrap_or("");
        match node.attribute("boost") {
            Some(raw) => {
                let boost = raw
                    .parse::<f32>()
                    .with_context(|| format!("bad boost \"{}\" on field {}", raw, name))?;
                doc.push_boosted(name, value, boost);
            }
            None => doc.push(name, value),
        }
    }
    Ok(doc)
}

/// Replace the value of the one field called `name`, leaving every other byte
/// of `text` untouched.
///
/// Fails when the field is missing or repeated.
pub fn replace_single_field(text: &str, name: &str, value: &str) -> Result<String> {
    let xml = roxmltree::Document::parse(text).context("Failed to parse add document")?;
    let matches: Vec<_> = xml
        .descendants()
        .filter(|n| n.has_tag_name("field") && n.attribute("name") == Some(name))
        .collect();

    let node = match matches.as_slice() {
        [single] => *single,
        [] => bail!("no {} field present", name),
        many => bail!("{} {} fields present", many.len(), name),
    };

    let range = node.range();
    let replacement = match node.attribute("boost") {
        Some(raw) => format!(
            "<field name=\"{}\" boost=\"{}\">{}</field>",
            escape(name),
            escape(raw),
            escape(value)
        ),
        None => format!("<field name=\"{}\">{}</field>", escape(name), escape(value)),
    };

    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..range.start]);
    out.push_str(&replacement);
    out.push_str(&text[range.end..]);
    Ok(out)
}
