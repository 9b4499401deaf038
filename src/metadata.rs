use crate::dom::Dom;
use crate::error::Result;
use crate::types::{ArticleMetadata, UNKNOWN, UNKNOWN_DATE};
use std::time::Duration;
use tracing::{debug, warn};

/// Where one metadata field is read from.
#[derive(Debug, Clone, Copy)]
pub struct FieldQuery {
    pub selector: &'static str,
    pub attribute: Option<&'static str>,
}

pub const TITLE: FieldQuery = FieldQuery {
    selector: "h1",
    attribute: None,
};

pub const SECTION: FieldQuery = FieldQuery {
    selector: r#"meta[property="article:section"]"#,
    attribute: Some("content"),
};

pub const AUTHOR: FieldQuery = FieldQuery {
    selector: r#"meta[name="author"]"#,
    attribute: Some("content"),
};

pub const PUBLISHED: FieldQuery = FieldQuery {
    selector: r#"meta[property="article:published_time"]"#,
    attribute: Some("content"),
};

pub struct MetadataExtractor {
    timeout: Duration,
}

impl MetadataExtractor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Read article metadata, substituting fallbacks for anything missing.
    pub async fn extract<D: Dom + ?Sized>(&self, dom: &mut D) -> Result<ArticleMetadata> {
        if !dom.wait_for(TITLE.selector, self.timeout).await? {
            warn!(
                "Title element '{}' did not appear within {:?}; continuing",
                TITLE.selector, self.timeout
            );
        }

        let title = read(dom, TITLE).await?;
        let section = read(dom, SECTION).await?;
        let author = read(dom, AUTHOR).await?;
        let published = read(dom, PUBLISHED).await?;

        let metadata = ArticleMetadata {
            section: section.unwrap_or_else(|| UNKNOWN.to_string()),
            title: title.unwrap_or_else(|| UNKNOWN.to_string()),
            author: author.unwrap_or_else(|| UNKNOWN.to_string()),
            published_at: published
                .map(|ts| filesystem_timestamp(&ts))
                .unwrap_or_else(|| UNKNOWN_DATE.to_string()),
        };
        debug!("Extracted metadata: {:?}", metadata);
        Ok(metadata)
    }
}

async fn read<D: Dom + ?Sized>(dom: &mut D, field: FieldQuery) -> Result<Option<String>> {
    let value = dom.query_first(field.selector, field.attribute).await?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// Strip the trailing zone marker (`Z` or `±hh:mm`) and swap `:` for `-`.
pub fn filesystem_timestamp(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = if trimmed.contains('T') {
        strip_zone(trimmed)
    } else {
        trimmed
    };
    stripped.replace(':', "-")
}

fn strip_zone(ts: &str) -> &str {
    if let Some(rest) = ts.strip_suffix('Z').or_else(|| ts.strip_suffix('z')) {
        return rest;
    }
    for len in [6, 5] {
        if ts.len() <= len || !ts.is_char_boundary(ts.len() - len) {
            continue;
        }
        let (rest, zone) = ts.split_at(ts.len() - len);
        if !zone.is_ascii() {
            continue;
        }
        let bytes = zone.as_bytes();
        let signed = bytes[0] == b'+' || bytes[0] == b'-';
        let digits = bytes[1..].iter().filter(|b| b.is_ascii_digit()).count() == 4;
        let shaped = len == 5 || bytes[3] == b':';
        if signed && digits && shaped {
            return rest;
        }
    }
    ts
}
