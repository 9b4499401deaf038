use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use page_scribe::archiver::Archiver;
use page_scribe::browser::release;
use page_scribe::normalizer::Normalizer;
use page_scribe::pacing::Pacer;
use page_scribe::{
    ArticleOutcome, ChromeSession, Config, Crawler, DedupStore, Interactive, RunMode,
    TerminalPrompt,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = Config::path_from_env();
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Starting page-scribe ({:?} mode)", config.run_mode);
    info!("Output directory: {}", config.output_dir.display());
    info!("Cleanup mode: {}", config.cleanup_mode);

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    match config.run_mode {
        RunMode::Interactive => run_interactive(&config).await,
        RunMode::Crawl => run_crawl(&config).await,
    }
}

async fn run_interactive(config: &Config) -> anyhow::Result<()> {
    let interactive = Interactive::new(
        Normalizer::new(config.cleanup_mode),
        Archiver::new(&config.output_dir),
        Pacer::human(),
    );

    let mut session = ChromeSession::launch(config)
        .await
        .context("Failed to launch browser")?;
    let mut prompt = TerminalPrompt::new();
    let result = interactive.run(&mut session, &mut prompt).await;
    let saved = release(&mut session, result).await?;
    info!("Saved {} page(s)", saved);
    println!("Goodbye!");
    Ok(())
}

async fn run_crawl(config: &Config) -> anyhow::Result<()> {
    let crawler = Crawler::from_config(config, Pacer::human())?;
    let dedup_path = config.dedup_path();
    let mut store = DedupStore::open(&dedup_path)
        .with_context(|| format!("Failed to open dedup store {}", dedup_path.display()))?;

    let mut session = ChromeSession::launch(config)
        .await
        .context("Failed to launch browser")?;
    let result = crawler.run(&mut session, &mut store).await;
    let report = release(&mut session, result)
        .await
        .with_context(|| format!("Crawl of {} aborted", crawler.listing_url()))?;
    for outcome in report.outcomes.iter() {
        if let ArticleOutcome::Failed { url, reason } = outcome {
            error!("Not archived: {} ({})", url, reason);
        }
    }
    info!(
        "Summary: {} discovered, {} archived, {} skipped, {} failed; {} URLs on record",
        report.discovered,
        report.archived(),
        report.skipped(),
        report.failed(),
        store.len()
    );
    Ok(())
}
