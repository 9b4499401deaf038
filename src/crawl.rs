//! Unattended archiving of every article linked from a listing page.

use crate::archiver::{crawl_file_stem, Archiver};
use crate::browser::BrowserSession;
use crate::config::Config;
use crate::dedup::DedupStore;
use crate::dom::{js_str, LiveDom};
use crate::error::{Result, ScribeError};
use crate::human::act_human;
use crate::metadata::MetadataExtractor;
use crate::normalizer::Normalizer;
use crate::pacing::{Pacer, Situation};
use crate::types::{ArticleOutcome, CrawlReport};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use url::Url;

/// Script returning the `href` of every anchor matching `selector`, in
/// document order.
pub fn harvest_script(selector: &str) -> String {
    format!(
        "Array.from(document.querySelectorAll({}), a => a.getAttribute('href')).filter(h => h)",
        js_str(selector)
    )
}

/// Resolve raw hrefs against the listing page. Keeps http(s) only, drops
/// fragments and repeats, preserves first-seen order.
pub fn resolve_links(base: &Url, hrefs: &[String], filter: Option<&Regex>) -> Vec<String> {
    let mut seen = HashSet::new();
    hrefs
        .iter()
        .filter_map(|href| match base.join(href.trim()) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!("Ignoring unparseable link {:?}: {}", href, e);
                None
            }
        })
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|mut url| {
            url.set_fragment(None);
            String::from(url)
        })
        .filter(|url| filter.map_or(true, |re| re.is_match(url)))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

pub struct Crawler {
    listing_url: Url,
    link_selector: String,
    link_filter: Option<Regex>,
    normalizer: Normalizer,
    extractor: MetadataExtractor,
    archiver: Archiver,
    pacer: Pacer,
}

impl Crawler {
    pub fn from_config(config: &Config, pacer: Pacer) -> Result<Self> {
        Ok(Self {
            listing_url: config.listing_url()?,
            link_selector: config.article_link_selector.clone(),
            link_filter: config.article_url_regex()?,
            normalizer: Normalizer::new(config.cleanup_mode),
            extractor: MetadataExtractor::new(config.metadata_timeout()),
            archiver: Archiver::new(&config.output_dir),
            pacer,
        })
    }

    pub fn listing_url(&self) -> &Url {
        &self.listing_url
    }

    /// Archive every unseen article on the listing page. Only a failure to
    /// load or read the listing itself ends the run with an error; per
    /// article failures are logged and reported.
    pub async fn run<B: BrowserSession + ?Sized>(
        &self,
        session: &mut B,
        store: &mut DedupStore,
    ) -> Result<CrawlReport> {
        info!("Opening listing {}", self.listing_url);
        session.navigate(self.listing_url.as_str()).await?;
        self.pacer.pause(Situation::ListingSettle).await;
        if let Err(e) = act_human(session, &self.pacer).await {
            warn!("Human emulation on listing failed: {}", e);
        }

        let links = self.harvest(session).await?;
        info!("Found {} article links", links.len());

        let mut report = CrawlReport {
            discovered: links.len(),
            ..CrawlReport::default()
        };

        for (i, url) in links.into_iter().enumerate() {
            if store.contains(&url) {
                info!("[{}/{}] Already archived, skipping {}", i + 1, report.discovered, url);
                report.record(ArticleOutcome::Skipped { url });
                continue;
            }

            info!("[{}/{}] Processing {}", i + 1, report.discovered, url);
            let outcome = match self.process(session, store, &url).await {
                Ok(path) => ArticleOutcome::Archived { url, path },
                Err(e) => {
                    error!("Failed to archive {}: {}", url, e);
                    ArticleOutcome::Failed {
                        url,
                        reason: e.to_string(),
                    }
                }
            };
            report.record(outcome);

            if let Err(e) = session.navigate(self.listing_url.as_str()).await {
                warn!("Could not return to listing: {}", e);
            }
            self.pacer.pause(Situation::BetweenArticles).await;
        }

        info!(
            "Crawl finished: {} archived, {} skipped, {} failed",
            report.archived(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }

    async fn harvest<B: BrowserSession + ?Sized>(&self, session: &mut B) -> Result<Vec<String>> {
        let value = session
            .execute_script(&harvest_script(&self.link_selector))
            .await?;
        let hrefs: Vec<String> = match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(ScribeError::Script(format!(
                    "link harvest returned {} instead of a list",
                    other
                )))
            }
        };
        Ok(resolve_links(
            &self.listing_url,
            &hrefs,
            self.link_filter.as_ref(),
        ))
    }

    async fn process<B: BrowserSession + ?Sized>(
        &self,
        session: &mut B,
        store: &mut DedupStore,
        url: &str,
    ) -> Result<PathBuf> {
        session.navigate(url).await?;
        act_human(session, &self.pacer).await?;

        let stem = {
            let mut dom = LiveDom::new(&mut *session);
            let metadata = self.extractor.extract(&mut dom).await?;
            let report = self.normalizer.normalize(&mut dom).await?;
            debug!("Normalized {}: {:?}", url, report);
            crawl_file_stem(&metadata)
        };

        self.pacer.pause(Situation::BeforePrint).await;
        let path = self.archiver.archive(session, &stem).await?;
        store.record(url)?;
        info!("Archived {} -> {}", url, path.display());
        Ok(path)
    }
}
