use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::browser::ChromePage;
use crate::config::Config;
use crate::feed::{CaptchaGate, ConsoleOperator, Extractor, FeedWalker};
use crate::models::ScrapeSession;
use crate::sink::JsonFileSink;

/// Initialize tracing and logging for the application
pub fn init_tracing(config: &Config) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Launch the browser and walk the configured profile's feed.
///
/// Only ever returns an error: the walk runs until the feed can no longer be
/// advanced. Everything collected up to that point is already in the output.
pub async fn run(config: &Config) -> Result<()> {
    info!("Launching browser...");
    let browser_options = config.browser_options();
    let page = tokio::task::spawn_blocking(move || ChromePage::launch(&browser_options))
        .await
        .context("Browser launch task failed")??;

    let walk_options = config.walk_options();
    let gate = CaptchaGate::new(
        ConsoleOperator::new(),
        walk_options.selectors.captcha_script(),
        config.page_wait(),
    );
    let extractor = Extractor::new(
        walk_options.selectors.clone(),
        config.field_set(),
        config.poll_interval(),
    );
    let sink = JsonFileSink::new(&config.output);

    info!(
        "Scraping {} into {} (fields: {:?})",
        config.profile_url,
        config.output.display(),
        config.field_set()
    );

    let mut walker = FeedWalker::new(
        page,
        sink,
        gate,
        extractor,
        walk_options,
        ScrapeSession::new(config.profile_url.clone()),
    );
    walker.run().await?;
    Ok(())
}
