use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::browser::BrowserOptions;
use crate::feed::{FieldSet, WalkOptions};
use crate::selectors::Selectors;

/// Application configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "rs-feed-scraper", version, about = "Collect per-video stats from a profile feed")]
pub struct Config {
    /// Path to a Chrome/Chromium or Brave executable
    #[arg(long, env = "FEED_SCRAPER_EXEC_PATH")]
    pub exec_path: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long, env = "FEED_SCRAPER_HEADLESS")]
    pub headless: bool,

    /// Profile to scrape, e.g. https://www.tiktok.com/@username
    #[arg(long, env = "FEED_SCRAPER_PROFILE_URL", default_value = "https://www.tiktok.com/@tiktok")]
    pub profile_url: String,

    /// Maximum time to wait for each video page to load
    #[arg(
        long,
        env = "FEED_SCRAPER_MAX_PAGE_WAIT_SEC",
        default_value_t = 20,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub max_page_wait_sec: u64,

    /// Verbose logging, including the browser protocol traffic
    #[arg(long, env = "FEED_SCRAPER_DEBUG_LOG")]
    pub debug_log: bool,

    /// Where the collected stats are written
    #[arg(long, env = "FEED_SCRAPER_OUTPUT", default_value = "output.json")]
    pub output: PathBuf,

    /// Disable GPU acceleration
    #[arg(long, env = "FEED_SCRAPER_DISABLE_GPU")]
    pub disable_gpu: bool,

    /// Also collect each video's playback duration
    #[arg(long, env = "FEED_SCRAPER_VIDEO_DURATION")]
    pub video_duration: bool,

    /// Also collect each video's upload date
    #[arg(long, env = "FEED_SCRAPER_UPLOAD_DATE")]
    pub upload_date: bool,

    /// Pause after the profile grid renders, before the first captcha check
    #[arg(long, env = "FEED_SCRAPER_SETTLE_SEC", default_value_t = 3)]
    pub settle_sec: u64,

    /// Interval between video player readiness checks
    #[arg(long, env = "FEED_SCRAPER_POLL_INTERVAL_MS", default_value_t = 250)]
    pub poll_interval_ms: u64,
}

impl Config {
    pub fn page_wait(&self) -> Duration {
        Duration::from_secs(self.max_page_wait_sec)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_sec)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn field_set(&self) -> FieldSet {
        FieldSet {
            duration: self.video_duration,
            upload_date: self.upload_date,
        }
    }

    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            exec_path: self.exec_path.clone(),
            headless: self.headless,
            disable_gpu: self.disable_gpu,
        }
    }

    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            page_wait: self.page_wait(),
            settle_delay: self.settle_delay(),
            selectors: Selectors::default(),
        }
    }

    /// Default tracing filter when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.debug_log {
            "rs_feed_scraper=debug,headless_chrome=debug"
        } else {
            "rs_feed_scraper=info,headless_chrome=warn"
        }
    }
}
