use crate::browser::BrowserSession;
use crate::error::{Result, ScribeError};
use crate::types::{ArticleMetadata, PdfOptions};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Leaves room for ` (NNN).pdf` under the common 255-byte name limit.
const MAX_STEM_BYTES: usize = 200;
const EMPTY_STEM: &str = "untitled";

/// Make `name` safe to use as a file name on any common filesystem.
///
/// `:` and `/` become `-`; `?`, quotes and anything other than alphanumerics,
/// spaces, `-`, `_`, `[` and `]` are dropped; whitespace runs collapse to one
/// space, and the result is cut to a byte budget on a character boundary.
/// Applying it twice gives the same result as applying it once.
pub fn sanitize_filename(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter_map(|c| match c {
            ':' | '/' | '\\' => Some('-'),
            c if c.is_alphanumeric() => Some(c),
            c if c.is_whitespace() => Some(' '),
            '-' | '_' | '[' | ']' => Some(c),
            _ => None,
        })
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_to_bytes(&collapsed, MAX_STEM_BYTES).trim().to_string()
}

fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let end = (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0);
    &s[..end]
}

/// `{published} [{section}] {title} - {author}`, sanitized.
pub fn crawl_file_stem(meta: &ArticleMetadata) -> String {
    sanitize_filename(&format!(
        "{} [{}] {} - {}",
        meta.published_at, meta.section, meta.title, meta.author
    ))
}

/// `{timestamp}_{title}`, sanitized.
pub fn interactive_file_stem(now: DateTime<Local>, title: &str) -> String {
    sanitize_filename(&format!("{}_{}", now.format("%Y-%m-%d_%H-%M"), title))
}

/// First of `stem.pdf`, `stem (2).pdf`, ... that does not exist yet.
pub fn unique_pdf_path(dir: &Path, stem: &str) -> PathBuf {
    let stem = if stem.is_empty() { EMPTY_STEM } else { stem };
    let first = dir.join(format!("{}.pdf", stem));
    if !first.exists() {
        return first;
    }
    (2u32..)
        .map(|n| dir.join(format!("{} ({}).pdf", stem, n)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Renders the current page to an e-reader sized PDF and writes it out.
#[derive(Debug, Clone)]
pub struct Archiver {
    output_dir: PathBuf,
    options: PdfOptions,
}

impl Archiver {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            options: PdfOptions::e_reader(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn archive<B: BrowserSession + ?Sized>(
        &self,
        session: &mut B,
        stem: &str,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ScribeError::io(&self.output_dir, e))?;
        let path = unique_pdf_path(&self.output_dir, stem);

        info!("Saving PDF -> {}", path.display());
        let bytes = session.print_to_pdf(&self.options).await?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ScribeError::io(&path, e))?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}
