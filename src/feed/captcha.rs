use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tracing::{debug, info, warn};

use crate::error::{ScrapeError, ScrapeResult};
use crate::page::PageDriver;

const CAPTCHA_PROMPT: &str = "Please solve the captcha and press enter in terminal";

/// The human on the other side of a captcha wall
#[async_trait]
pub trait Operator: Send {
    /// Show `message` and block until the operator signals they are done.
    async fn request_intervention(&mut self, message: &str) -> ScrapeResult<()>;
}

/// Prompts on stdout and waits for one line on stdin
pub struct ConsoleOperator {
    input: BufReader<Stdin>,
}

impl ConsoleOperator {
    pub fn new() -> Self {
        Self {
            input: BufReader::new(tokio::io::stdin()),
        }
    }
}

impl Default for ConsoleOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Operator for ConsoleOperator {
    async fn request_intervention(&mut self, message: &str) -> ScrapeResult<()> {
        println!("{}", message);

        // any line, including an empty one, counts as "resolved"
        let mut line = String::new();
        match self.input.read_line(&mut line).await {
            Ok(0) => Err(ScrapeError::OperatorUnavailable(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stdin closed",
            ))),
            Ok(_) => Ok(()),
            Err(e) => Err(ScrapeError::OperatorUnavailable(e)),
        }
    }
}

/// Holds the walker until no captcha challenge is mounted on the page.
///
/// This is the one unbounded wait in a run: it blocks on the operator, not
/// on the browser, and only gives up if the page can no longer be queried.
pub struct CaptchaGate<O> {
    operator: O,
    script: String,
    check_timeout: Duration,
}

impl<O: Operator> CaptchaGate<O> {
    pub fn new(operator: O, script: String, check_timeout: Duration) -> Self {
        Self {
            operator,
            script,
            check_timeout,
        }
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    pub async fn await_clear<P>(&mut self, page: &P) -> ScrapeResult<()>
    where
        P: PageDriver + ?Sized,
    {
        let mut rounds = 0usize;
        while self.captcha_present(page).await? {
            rounds += 1;
            info!("Captcha detected (round {}), waiting for operator", rounds);
            self.operator.request_intervention(CAPTCHA_PROMPT).await?;
        }

        if rounds > 0 {
            info!("Captcha cleared after {} round(s)", rounds);
        }
        Ok(())
    }

    async fn captcha_present<P>(&self, page: &P) -> ScrapeResult<bool>
    where
        P: PageDriver + ?Sized,
    {
        let value = page
            .evaluate(&self.script, self.check_timeout)
            .await
            .map_err(|source| ScrapeError::page("captcha check", source))?;

        debug!("Captcha predicate returned {}", value);
        Ok(value.as_bool().unwrap_or_else(|| {
            warn!("Captcha predicate returned a non-boolean: {}", value);
            false
        }))
    }
}
