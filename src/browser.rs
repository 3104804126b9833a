use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use serde_json::Value;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::error::PageError;
use crate::page::{PageDriver, PageResult};

/// Chrome flags applied to every launch, after Puppeteer's defaults
const HARDENING_ARGS: &[&str] = &[
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-background-networking",
    "--enable-features=NetworkService,NetworkServiceInProcess",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-features=site-per-process,Translate,BlinkGenPropertyTrees",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-renderer-backgrounding",
    "--disable-sync",
    "--force-color-profile=srgb",
    "--metrics-recording-only",
    "--safebrowsing-disable-auto-update",
    "--password-store=basic",
    "--use-mock-keychain",
    "--mute-audio",
];

/// Slack on top of a call's own timeout before the blocking task is abandoned
const CALL_GRACE: Duration = Duration::from_millis(500);

const VISIBILITY_POLL: Duration = Duration::from_millis(100);

/// Same test as chromedp's NodeVisible; an empty element still has client rects
const IS_VISIBLE_FN: &str = "function() { return Boolean(this.offsetWidth || this.offsetHeight || this.getClientRects().length); }";

/// How the browser process is started
#[derive(Debug, Clone, Default)]
pub struct BrowserOptions {
    pub exec_path: Option<PathBuf>,
    pub headless: bool,
    pub disable_gpu: bool,
}

/// A launched Chrome instance with the single tab the scraper drives.
/// The throwaway profile directory is removed when this is dropped.
pub struct ChromePage {
    _browser: Browser,
    tab: Arc<Tab>,
    _profile_dir: TempDir,
}

impl ChromePage {
    pub fn launch(options: &BrowserOptions) -> Result<Self> {
        let profile_dir = tempfile::Builder::new()
            .prefix("feed-scraper-profile")
            .tempdir()
            .context("Failed to create browser profile directory")?;

        let mut args: Vec<&OsStr> = HARDENING_ARGS.iter().map(|a| OsStr::new(*a)).collect();
        if options.disable_gpu {
            args.push(OsStr::new("--disable-gpu"));
        }

        let launch_options = LaunchOptionsBuilder::default()
            .headless(options.headless)
            .path(options.exec_path.clone())
            .user_data_dir(Some(profile_dir.path().to_path_buf()))
            .window_size(Some((1280, 800)))
            // a captcha wait can last as long as the operator needs
            .idle_browser_timeout(Duration::from_secs(60 * 60 * 24))
            .args(args)
            .build()
            .context("Invalid Chrome launch options")?;

        let browser = Browser::new(launch_options).context("Failed to launch browser")?;

        if let Some(pid) = browser.get_process_id() {
            debug!("Browser process ID: {}", pid);
        } else {
            warn!("Browser process ID not available - might be a remote connection");
        }

        let tab = browser
            .new_tab()
            .context("Failed to create new browser tab")?;

        info!(
            "Browser launched (headless: {}, profile dir: {})",
            options.headless,
            profile_dir.path().display()
        );

        Ok(Self {
            _browser: browser,
            tab,
            _profile_dir: profile_dir,
        })
    }

    /// Run a synchronous tab operation on the blocking pool, bounded by `timeout`.
    async fn on_tab<T, F>(&self, timeout: Duration, op: F) -> PageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<Tab>) -> PageResult<T> + Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        let task = tokio::task::spawn_blocking(move || op(tab));

        match tokio::time::timeout(timeout + CALL_GRACE, task).await {
            Err(_) => Err(PageError::Timeout(timeout)),
            Ok(Err(e)) => Err(PageError::Connection(format!("browser task failed: {}", e))),
            Ok(Ok(result)) => result,
        }
    }
}

/// Block until `selector` is attached and has a non-empty layout box.
fn wait_until_visible(tab: &Tab, selector: &str, timeout: Duration) -> PageResult<()> {
    let deadline = Instant::now() + timeout;
    let element = tab
        .wait_for_element_with_custom_timeout(selector, timeout)
        .map_err(|e| classify(e, Some(selector)))?;

    loop {
        let visible = element
            .call_js_fn(IS_VISIBLE_FN, vec![], false)
            .map_err(|e| classify(e, Some(selector)))?
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if visible {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(PageError::ElementMissing {
                selector: selector.to_string(),
            });
        }
        std::thread::sleep(VISIBILITY_POLL);
    }
}

/// Map a `headless_chrome` failure onto the port's error kinds.
fn classify(err: anyhow::Error, selector: Option<&str>) -> PageError {
    let message = format!("{:#}", err);
    if message.contains("connection is closed") || message.contains("ConnectionClosed") {
        return PageError::Connection(message);
    }
    match selector {
        Some(selector) => {
            debug!("Element lookup for {} failed: {}", selector, message);
            PageError::ElementMissing {
                selector: selector.to_string(),
            }
        }
        None => PageError::Script(message),
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn navigate(&self, url: &str, timeout: Duration) -> PageResult<()> {
        debug!("Navigating to {}", url);
        let url = url.to_string();
        self.on_tab(timeout, move |tab| {
            tab.navigate_to(&url).map_err(|e| classify(e, None))?;
            tab.wait_until_navigated().map_err(|e| classify(e, None))?;
            Ok(())
        })
        .await
    }

    async fn click(&self, selector: &str, timeout: Duration) -> PageResult<()> {
        debug!("Clicking {}", selector);
        let selector = selector.to_string();
        self.on_tab(timeout, move |tab| {
            wait_until_visible(&tab, &selector, timeout)?;
            let element = tab
                .find_element(&selector)
                .map_err(|e| classify(e, Some(&selector)))?;
            element.click().map_err(|e| classify(e, Some(&selector)))?;
            Ok(())
        })
        .await
    }

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> PageResult<()> {
        let selector = selector.to_string();
        self.on_tab(timeout, move |tab| wait_until_visible(&tab, &selector, timeout))
            .await
    }

    async fn evaluate(&self, script: &str, timeout: Duration) -> PageResult<Value> {
        let script = script.to_string();
        self.on_tab(timeout, move |tab| {
            let result = tab.evaluate(&script, false).map_err(|e| classify(e, None))?;
            Ok(result.value.unwrap_or(Value::Null))
        })
        .await
    }

    async fn text(&self, selector: &str, timeout: Duration) -> PageResult<String> {
        let selector = selector.to_string();
        self.on_tab(timeout, move |tab| {
            wait_until_visible(&tab, &selector, timeout)?;
            let element = tab
                .find_element(&selector)
                .map_err(|e| classify(e, Some(&selector)))?;
            element
                .get_inner_text()
                .map_err(|e| classify(e, Some(&selector)))
        })
        .await
    }

    async fn current_url(&self, timeout: Duration) -> PageResult<String> {
        self.on_tab(timeout, |tab| Ok(tab.get_url())).await
    }
}
