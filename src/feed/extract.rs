use std::time::Duration;

use tokio::time::{Instant, sleep_until, timeout_at};
use tracing::{debug, info, warn};

use super::FieldSet;
use crate::error::{PageError, ScrapeError, ScrapeResult};
use crate::models::VideoRecord;
use crate::page::{PageDriver, PageResult};
use crate::selectors::Selectors;

/// Reads one video's record from the currently open video page
#[derive(Debug, Clone)]
pub struct Extractor {
    selectors: Selectors,
    fields: FieldSet,
    poll_interval: Duration,
}

impl Extractor {
    pub fn new(selectors: Selectors, fields: FieldSet, poll_interval: Duration) -> Self {
        Self {
            selectors,
            fields,
            poll_interval,
        }
    }

    /// Extract a record, with every page call sharing the single `deadline`.
    ///
    /// Any mandatory field that cannot be read fails the whole record. The
    /// duration is best-effort and falls back to 0 when the player never
    /// becomes ready in time.
    pub async fn extract<P>(&self, page: &P, deadline: Instant) -> ScrapeResult<VideoRecord>
    where
        P: PageDriver + ?Sized,
    {
        let url = bounded(deadline, "url", |left| page.current_url(left))
            .await
            .map_err(|source| ScrapeError::field("url", source))?;

        let selectors = &self.selectors;
        let description = self
            .read_text(page, deadline, "description", &selectors.description)
            .await?;
        let like_count = self
            .read_text(page, deadline, "likes", &selectors.likes)
            .await?;
        let comment_count = self
            .read_text(page, deadline, "comments", &selectors.comments)
            .await?;

        let uploaded_at = if self.fields.upload_date {
            let date = self
                .read_text(page, deadline, "upload date", &selectors.upload_date)
                .await?;
            Some(date)
        } else {
            None
        };

        let duration_seconds = if self.fields.duration {
            Some(self.probe_duration(page, deadline).await?)
        } else {
            None
        };

        let record = VideoRecord {
            url,
            description,
            like_count,
            comment_count,
            uploaded_at,
            duration_seconds,
        };
        debug!("Video stat: {:?}", record);
        Ok(record)
    }

    async fn read_text<P>(
        &self,
        page: &P,
        deadline: Instant,
        field: &'static str,
        selector: &str,
    ) -> ScrapeResult<String>
    where
        P: PageDriver + ?Sized,
    {
        bounded(deadline, field, |left| page.text(selector, left))
            .await
            .map_err(|source| ScrapeError::field(field, source))
    }

    /// Poll the player's ready state until it is fully loaded, then read its
    /// duration. Only a lost browser connection is an error here.
    async fn probe_duration<P>(&self, page: &P, deadline: Instant) -> ScrapeResult<f64>
    where
        P: PageDriver + ?Sized,
    {
        let ready_script = self.selectors.player_ready_script();
        let mut polls = 0u32;

        loop {
            polls += 1;
            let probe = bounded(deadline, "player ready", |left| {
                page.evaluate(&ready_script, left)
            });
            match probe.await {
                Ok(value) if value.as_bool() == Some(true) => {
                    debug!("Video is ready after {} poll(s)", polls);
                    break;
                }
                Ok(_) => debug!("Video not ready"),
                Err(e) if e.is_connection() => return Err(ScrapeError::field("duration", e)),
                Err(PageError::Timeout(_)) => {}
                Err(e) => debug!("Ready-state probe failed: {}", e),
            }

            let now = Instant::now();
            if now >= deadline {
                warn!("Video player not ready before deadline, duration left at 0");
                return Ok(0.0);
            }
            sleep_until((now + self.poll_interval).min(deadline)).await;
        }

        let duration_script = self.selectors.player_duration_script();
        let read = bounded(deadline, "duration", |left| {
            page.evaluate(&duration_script, left)
        });
        match read.await {
            Ok(value) => {
                // NaN and Infinity serialize as null
                let seconds = value.as_f64().unwrap_or(0.0);
                info!("Video duration: {:.1}s", seconds);
                Ok(seconds)
            }
            Err(e) if e.is_connection() => Err(ScrapeError::field("duration", e)),
            Err(e) => {
                warn!("Could not read video duration, left at 0: {}", e);
                Ok(0.0)
            }
        }
    }
}

/// Run one port call with whatever time is left before `deadline`.
async fn bounded<T, F, Fut>(deadline: Instant, step: &'static str, call: F) -> PageResult<T>
where
    F: FnOnce(Duration) -> Fut,
    Fut: std::future::Future<Output = PageResult<T>>,
{
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        debug!("No time left for {}", step);
        return Err(PageError::Timeout(Duration::ZERO));
    }

    match timeout_at(deadline, call(left)).await {
        Ok(result) => result,
        Err(_) => Err(PageError::Timeout(left)),
    }
}
