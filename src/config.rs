use crate::error::{Result, ScribeError};
use crate::types::{CleanupMode, RunMode};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const CONFIG_ENV: &str = "PAGE_SCRIBE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_LINK_SELECTOR: &str = r#"a[href*="/article/"]"#;
pub const DEFAULT_DEDUP_FILE: &str = "archived_urls.txt";
pub const DEFAULT_METADATA_TIMEOUT_SECS: u64 = 15;

/// Run configuration, loaded once at startup and handed to each component.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub output_dir: PathBuf,
    pub user_data_dir: PathBuf,
    pub profile_name: String,
    #[serde(default)]
    pub cleanup_mode: CleanupMode,
    #[serde(default)]
    pub extension_path: Option<PathBuf>,
    #[serde(default)]
    pub run_mode: RunMode,
    #[serde(default)]
    pub listing_url: Option<String>,
    #[serde(default = "default_link_selector")]
    pub article_link_selector: String,
    /// Optional regex a harvested URL must match to count as an article.
    #[serde(default)]
    pub article_url_pattern: Option<String>,
    #[serde(default)]
    pub dedup_file: Option<PathBuf>,
    #[serde(default)]
    pub headless: bool,
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,
}

fn default_link_selector() -> String {
    DEFAULT_LINK_SELECTOR.to_string()
}

fn default_metadata_timeout() -> u64 {
    DEFAULT_METADATA_TIMEOUT_SECS
}

impl Config {
    /// Resolve the config path from the environment, falling back to `config.json`.
    pub fn path_from_env() -> PathBuf {
        std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ScribeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|e| match e {
            ScribeError::ConfigParse { source, .. } => ScribeError::ConfigParse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(raw).map_err(|source| ScribeError::ConfigParse {
                path: PathBuf::new(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ScribeError::Config("output_dir must not be empty".into()));
        }
        if self.user_data_dir.as_os_str().is_empty() {
            return Err(ScribeError::Config("user_data_dir must not be empty".into()));
        }
        if self.profile_name.trim().is_empty() {
            return Err(ScribeError::Config("profile_name must not be empty".into()));
        }
        if self.article_link_selector.trim().is_empty() {
            return Err(ScribeError::Config(
                "article_link_selector must not be empty".into(),
            ));
        }
        if self.run_mode == RunMode::Crawl {
            self.listing_url()?;
        }
        self.article_url_regex()?;
        Ok(())
    }

    pub fn article_url_regex(&self) -> Result<Option<Regex>> {
        self.article_url_pattern
            .as_deref()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    ScribeError::Config(format!("article_url_pattern '{}' is invalid: {}", p, e))
                })
            })
            .transpose()
    }

    /// The listing page crawled for article links. Only required in crawl mode.
    pub fn listing_url(&self) -> Result<Url> {
        let raw = self
            .listing_url
            .as_deref()
            .ok_or_else(|| ScribeError::Config("listing_url is required in crawl mode".into()))?;
        let url = Url::parse(raw)
            .map_err(|e| ScribeError::Config(format!("listing_url '{}' is invalid: {}", raw, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ScribeError::Config(format!(
                "listing_url '{}' must use http or https",
                raw
            )));
        }
        Ok(url)
    }

    pub fn dedup_path(&self) -> PathBuf {
        self.dedup_file
            .clone()
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_DEDUP_FILE))
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }
}
