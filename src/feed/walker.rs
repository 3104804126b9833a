use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, error, info};

use super::{CaptchaGate, Extractor, Operator, WalkState};
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::ScrapeSession;
use crate::page::PageDriver;
use crate::selectors::Selectors;
use crate::sink::ResultSink;

/// Timing and targeting knobs for a walk
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Per-item extraction budget, also the timeout of each bootstrap call
    pub page_wait: Duration,
    /// Pause after the grid renders, giving the platform's challenge time to mount
    pub settle_delay: Duration,
    pub selectors: Selectors,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            page_wait: Duration::from_secs(20),
            settle_delay: Duration::from_secs(3),
            selectors: Selectors::default(),
        }
    }
}

/// Drives the browser through a profile's feed one video at a time,
/// persisting the session after every record.
///
/// There is no normal exit: the walk ends when advancing to the next video
/// fails, or earlier on any other unrecoverable error.
pub struct FeedWalker<P, S, O> {
    page: P,
    sink: S,
    gate: CaptchaGate<O>,
    extractor: Extractor,
    options: WalkOptions,
    session: ScrapeSession,
    state: WalkState,
}

impl<P, S, O> FeedWalker<P, S, O>
where
    P: PageDriver,
    S: ResultSink,
    O: Operator,
{
    pub fn new(
        page: P,
        sink: S,
        gate: CaptchaGate<O>,
        extractor: Extractor,
        options: WalkOptions,
        session: ScrapeSession,
    ) -> Self {
        Self {
            page,
            sink,
            gate,
            extractor,
            options,
            session,
            state: WalkState::Bootstrapping,
        }
    }

    pub fn session(&self) -> &ScrapeSession {
        &self.session
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Walk the feed until it can no longer advance. Always returns the
    /// error that ended the walk; the records collected so far are on disk.
    pub async fn run(&mut self) -> ScrapeResult<()> {
        let result = self.walk().await;
        let failed_in = self.state;
        self.state = WalkState::Terminated;

        if let Err(e) = &result {
            error!(
                "Walk terminated while {} ({} error) after {} record(s): {}",
                failed_in,
                e.kind(),
                self.session.len(),
                e
            );
        }
        result
    }

    async fn walk(&mut self) -> ScrapeResult<()> {
        self.bootstrap().await?;
        loop {
            self.visit_current().await?;
        }
    }

    async fn bootstrap(&mut self) -> ScrapeResult<()> {
        self.enter(WalkState::Bootstrapping);
        let wait = self.options.page_wait;
        let item = &self.options.selectors.video_item;

        info!(
            "Opening profile {} (run started {})",
            self.session.profile_url(),
            self.session.start_time().to_rfc3339()
        );
        self.page
            .navigate(self.session.profile_url(), wait)
            .await
            .map_err(|source| ScrapeError::page("open profile", source))?;
        self.page
            .wait_visible(item, wait)
            .await
            .map_err(|source| ScrapeError::page("wait for video grid", source))?;

        sleep(self.options.settle_delay).await;
        self.gate.await_clear(&self.page).await?;

        self.page
            .click(item, wait)
            .await
            .map_err(|source| ScrapeError::page("open first video", source))?;
        Ok(())
    }

    /// One full cycle: captcha check, extract, persist, advance.
    async fn visit_current(&mut self) -> ScrapeResult<()> {
        self.enter(WalkState::CaptchaCheck);
        self.gate.await_clear(&self.page).await?;

        self.enter(WalkState::Extracting);
        let deadline = Instant::now() + self.options.page_wait;
        let record = self.extractor.extract(&self.page, deadline).await?;

        self.enter(WalkState::Persisting);
        let url = record.url.clone();
        if record.duration_seconds.is_some() {
            debug!("Video {} plays for {:.1}s", url, record.duration());
        }
        let index = self.session.push(record);
        self.sink.persist(&self.session)?;
        info!("Saved video #{}: {}", index + 1, url);

        self.enter(WalkState::Advancing);
        let collected = self.session.len();
        self.page
            .click(&self.options.selectors.next_button, self.options.page_wait)
            .await
            .map_err(|source| {
                if source.is_connection() {
                    ScrapeError::page("next video", source)
                } else {
                    ScrapeError::FeedExhausted { collected, source }
                }
            })
    }

    fn enter(&mut self, state: WalkState) {
        debug!("Walker state: {} -> {}", self.state, state);
        self.state = state;
    }
}
