use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const UNKNOWN: &str = "Unknown";
pub const UNKNOWN_DATE: &str = "UnknownDate";

/// Normalization strictness for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupMode {
    #[default]
    Gentle,
    Aggressive,
}

impl std::fmt::Display for CleanupMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanupMode::Gentle => f.write_str("gentle"),
            CleanupMode::Aggressive => f.write_str("aggressive"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Interactive,
    Crawl,
}

/// Fields read from an article page, used only to name the archived file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub section: String,
    pub title: String,
    pub author: String,
    pub published_at: String,
}

impl Default for ArticleMetadata {
    fn default() -> Self {
        Self {
            section: UNKNOWN.to_string(),
            title: UNKNOWN.to_string(),
            author: UNKNOWN.to_string(),
            published_at: UNKNOWN_DATE.to_string(),
        }
    }
}

/// Print geometry passed to the browser's print-to-PDF capability (inches).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfOptions {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub print_background: bool,
    pub scale: f64,
}

impl PdfOptions {
    /// Page geometry for a 10.3" e-reader screen.
    pub fn e_reader() -> Self {
        Self {
            paper_width: 5.8,
            paper_height: 8.3,
            margin_top: 0.4,
            margin_bottom: 0.4,
            margin_left: 0.4,
            margin_right: 0.4,
            print_background: true,
            scale: 0.9,
        }
    }
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self::e_reader()
    }
}

/// What happened to one discovered link during a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleOutcome {
    Archived { url: String, path: PathBuf },
    Skipped { url: String },
    Failed { url: String, reason: String },
}

impl ArticleOutcome {
    pub fn url(&self) -> &str {
        match self {
            ArticleOutcome::Archived { url, .. }
            | ArticleOutcome::Skipped { url }
            | ArticleOutcome::Failed { url, .. } => url,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub discovered: usize,
    pub outcomes: Vec<ArticleOutcome>,
}

impl CrawlReport {
    pub fn record(&mut self, outcome: ArticleOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn archived(&self) -> usize {
        self.count(|o| matches!(o, ArticleOutcome::Archived { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ArticleOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ArticleOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&ArticleOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Summary of what a normalization pass did to the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub removed: usize,
    pub isolated: Option<String>,
    pub hidden: usize,
}
