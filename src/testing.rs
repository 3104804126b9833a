//! In-memory stand-ins for the browser, the operator and the output file.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::time::Instant;

use crate::error::{PageError, ScrapeError, ScrapeResult};
use crate::feed::Operator;
use crate::models::ScrapeSession;
use crate::page::{PageDriver, PageResult};
use crate::selectors::Selectors;
use crate::sink::ResultSink;

const FAKE_PROFILE: &str = "https://www.tiktok.com/@someone";

#[derive(Debug, Clone)]
pub struct FakeVideo {
    pub url: String,
    pub description: Option<String>,
    pub likes: Option<String>,
    pub comments: Option<String>,
    pub upload_date: Option<String>,
    /// Ready-state polls answered "not ready" before the player is ready;
    /// `None` never becomes ready
    pub ready_after: Option<usize>,
    pub duration: f64,
}

impl FakeVideo {
    pub fn numbered(n: usize) -> Self {
        Self {
            url: format!("{FAKE_PROFILE}/video/{n}"),
            description: Some(format!("video {n} caption")),
            likes: Some(format!("{n}.{n}K")),
            comments: Some(format!("{n}{n}")),
            upload_date: Some(format!("{n}-{n}")),
            ready_after: Some(0),
            duration: n as f64 * 10.0,
        }
    }
}

#[derive(Debug, Default)]
struct FakeState {
    url: String,
    on_profile: bool,
    position: Option<usize>,
    connected: bool,
    captcha_queue: VecDeque<bool>,
    captcha_at: HashMap<usize, usize>,
    captcha_checks: usize,
    first_captcha_check: Option<Instant>,
    ready_checks: usize,
    ready_polls: usize,
    advances: usize,
    disconnect_on_advance: Option<usize>,
}

/// A profile grid plus a video viewer with a "next" control
pub struct FakePage {
    videos: Vec<FakeVideo>,
    selectors: Selectors,
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new(videos: Vec<FakeVideo>) -> Self {
        Self {
            videos,
            selectors: Selectors::default(),
            state: Mutex::new(FakeState {
                connected: true,
                ..Default::default()
            }),
        }
    }

    pub fn with_videos(n: usize) -> Self {
        Self::new((1..=n).map(FakeVideo::numbered).collect())
    }

    /// Answer the next captcha checks with `answers`, wherever the page is.
    pub fn queue_captcha(&self, answers: impl IntoIterator<Item = bool>) {
        self.lock().captcha_queue.extend(answers);
    }

    /// Show a captcha on video `n` (1-based) for `checks` consecutive checks.
    pub fn captcha_before(&self, n: usize, checks: usize) {
        self.lock().captcha_at.insert(n - 1, checks);
    }

    pub fn disconnect(&self) {
        self.lock().connected = false;
    }

    /// Drop the connection on the `n`th click of the next control.
    pub fn disconnect_on_advance(&self, n: usize) {
        self.lock().disconnect_on_advance = Some(n);
    }

    pub fn captcha_checks(&self) -> usize {
        self.lock().captcha_checks
    }

    /// When the captcha predicate was first evaluated.
    pub fn first_captcha_check(&self) -> Option<Instant> {
        self.lock().first_captcha_check
    }

    pub fn ready_checks(&self) -> usize {
        self.lock().ready_checks
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn connected(&self) -> PageResult<std::sync::MutexGuard<'_, FakeState>> {
        let state = self.lock();
        if state.connected {
            Ok(state)
        } else {
            Err(PageError::Connection("fake browser closed".to_string()))
        }
    }

    fn missing(selector: &str) -> PageError {
        PageError::ElementMissing {
            selector: selector.to_string(),
        }
    }

    fn current(&self, state: &FakeState) -> Option<&FakeVideo> {
        state.position.and_then(|i| self.videos.get(i))
    }

    fn visible(&self, state: &FakeState, selector: &str) -> bool {
        if selector == self.selectors.video_item {
            return state.on_profile && !self.videos.is_empty();
        }
        if selector == self.selectors.next_button {
            return matches!(state.position, Some(i) if i + 1 < self.videos.len());
        }
        self.current(state).is_some()
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, url: &str, _timeout: Duration) -> PageResult<()> {
        let mut state = self.connected()?;
        state.url = url.to_string();
        state.on_profile = true;
        state.position = None;
        Ok(())
    }

    async fn click(&self, selector: &str, _timeout: Duration) -> PageResult<()> {
        let mut state = self.connected()?;

        if selector == self.selectors.next_button {
            state.advances += 1;
            if state.disconnect_on_advance == Some(state.advances) {
                state.connected = false;
                return Err(PageError::Connection("fake browser closed".to_string()));
            }
        }
        if !self.visible(&state, selector) {
            return Err(Self::missing(selector));
        }

        if selector == self.selectors.video_item {
            state.on_profile = false;
            state.position = Some(0);
        } else if selector == self.selectors.next_button {
            state.position = state.position.map(|i| i + 1);
        }
        state.ready_polls = 0;
        Ok(())
    }

    async fn wait_visible(&self, selector: &str, _timeout: Duration) -> PageResult<()> {
        let state = self.connected()?;
        if self.visible(&state, selector) {
            Ok(())
        } else {
            Err(Self::missing(selector))
        }
    }

    async fn evaluate(&self, script: &str, _timeout: Duration) -> PageResult<Value> {
        let mut state = self.connected()?;

        if script == self.selectors.captcha_script() {
            state.captcha_checks += 1;
            state.first_captcha_check.get_or_insert_with(Instant::now);
            if let Some(answer) = state.captcha_queue.pop_front() {
                return Ok(json!(answer));
            }
            let Some(i) = state.position else {
                return Ok(json!(false));
            };
            return Ok(match state.captcha_at.get_mut(&i) {
                Some(left) if *left > 0 => {
                    *left -= 1;
                    json!(true)
                }
                _ => json!(false),
            });
        }

        if script == self.selectors.player_ready_script() {
            state.ready_checks += 1;
            let polls = state.ready_polls;
            state.ready_polls += 1;
            let ready = match self.current(&state).map(|v| v.ready_after) {
                Some(Some(after)) => polls >= after,
                _ => false,
            };
            return Ok(json!(ready));
        }

        if script == self.selectors.player_duration_script() {
            return Ok(self
                .current(&state)
                .map(|v| json!(v.duration))
                .unwrap_or(Value::Null));
        }

        Err(PageError::Script(format!("unexpected script: {script}")))
    }

    /// Like Chrome, a missing element is only reported once `timeout` is used up.
    async fn text(&self, selector: &str, timeout: Duration) -> PageResult<String> {
        let text = {
            let state = self.connected()?;
            let video = self.current(&state);
            if selector == self.selectors.description {
                video.and_then(|v| v.description.clone())
            } else if selector == self.selectors.likes {
                video.and_then(|v| v.likes.clone())
            } else if selector == self.selectors.comments {
                video.and_then(|v| v.comments.clone())
            } else if selector == self.selectors.upload_date {
                video.and_then(|v| v.upload_date.clone())
            } else {
                None
            }
        };

        match text {
            Some(text) => Ok(text),
            None => {
                tokio::time::sleep(timeout).await;
                Err(Self::missing(selector))
            }
        }
    }

    async fn current_url(&self, _timeout: Duration) -> PageResult<String> {
        let state = self.connected()?;
        Ok(self
            .current(&state)
            .map(|v| v.url.clone())
            .unwrap_or_else(|| state.url.clone()))
    }
}

/// Resolves every captcha immediately, counting the prompts
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    pub prompts: usize,
    closed: bool,
}

impl ScriptedOperator {
    /// An operator whose input stream is already at end-of-file.
    pub fn closed() -> Self {
        Self {
            prompts: 0,
            closed: true,
        }
    }
}

#[async_trait]
impl Operator for ScriptedOperator {
    async fn request_intervention(&mut self, _message: &str) -> ScrapeResult<()> {
        if self.closed {
            return Err(ScrapeError::OperatorUnavailable(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "scripted input closed",
            )));
        }
        self.prompts += 1;
        Ok(())
    }
}

/// Remembers the record count of every persisted snapshot
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub snapshots: Vec<usize>,
}

impl ResultSink for RecordingSink {
    fn persist(&mut self, session: &ScrapeSession) -> ScrapeResult<()> {
        self.snapshots.push(session.len());
        Ok(())
    }
}
