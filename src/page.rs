use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PageError;

pub type PageResult<T> = Result<T, PageError>;

/// The narrow set of browser capabilities the scraper needs.
///
/// Every call is bounded by the timeout it is given; callers that share one
/// deadline across several calls pass the time remaining until it.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str, timeout: Duration) -> PageResult<()>;

    /// Wait for `selector` to become visible, then click it.
    async fn click(&self, selector: &str, timeout: Duration) -> PageResult<()>;

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> PageResult<()>;

    async fn evaluate(&self, script: &str, timeout: Duration) -> PageResult<Value>;

    /// Visible text of the first element matching `selector`.
    async fn text(&self, selector: &str, timeout: Duration) -> PageResult<String>;

    async fn current_url(&self, timeout: Duration) -> PageResult<String>;
}
