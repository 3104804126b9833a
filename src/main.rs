use std::process::ExitCode;

use clap::Parser;
use rs_feed_scraper::app::{init_tracing, run};
use rs_feed_scraper::config::Config;
use rs_feed_scraper::error::ScrapeError;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize tracing/logging
    init_tracing(&config);

    info!("Starting feed scraper...");
    info!("Configuration loaded: {:?}", config);

    let err = match run(&config).await {
        Ok(()) => return ExitCode::SUCCESS,
        Err(e) => e,
    };

    match err.downcast_ref::<ScrapeError>() {
        Some(ScrapeError::FeedExhausted { collected, .. }) => {
            error!(
                "Feed ended or next video unavailable after {} video(s); check {} for completeness",
                collected,
                config.output.display()
            );
            ExitCode::from(2)
        }
        _ => {
            error!("Scrape failed: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
