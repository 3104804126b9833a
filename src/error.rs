use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single call through the page automation port
#[derive(Debug, Error)]
pub enum PageError {
    #[error("element `{selector}` not found or not visible")]
    ElementMissing { selector: String },
    #[error("page call timed out after {0:?}")]
    Timeout(Duration),
    #[error("browser connection lost: {0}")]
    Connection(String),
    #[error("script evaluation failed: {0}")]
    Script(String),
}

impl PageError {
    pub fn is_connection(&self) -> bool {
        matches!(self, PageError::Connection(_))
    }
}

/// Coarse error categories, used when logging a terminated run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TransientUi,
    Connection,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::TransientUi => "ui",
            ErrorKind::Connection => "connection",
            ErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

/// Everything that can end a scrape run
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("{step}: {source}")]
    Ui {
        step: &'static str,
        #[source]
        source: PageError,
    },
    #[error("{step}: deadline exceeded")]
    Timeout { step: &'static str },
    #[error("could not read {field}: {source}")]
    Extraction {
        field: &'static str,
        #[source]
        source: PageError,
    },
    #[error("{step}: {source}")]
    Connection {
        step: &'static str,
        #[source]
        source: PageError,
    },
    #[error("no next video after {collected} records: {source}")]
    FeedExhausted {
        collected: usize,
        #[source]
        source: PageError,
    },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
    #[error("operator input unavailable while waiting on captcha: {0}")]
    OperatorUnavailable(#[source] std::io::Error),
}

impl ScrapeError {
    /// Wrap a port failure raised while performing `step`.
    pub fn page(step: &'static str, source: PageError) -> Self {
        match source {
            PageError::Connection(_) => ScrapeError::Connection { step, source },
            PageError::Timeout(_) => ScrapeError::Timeout { step },
            source => ScrapeError::Ui { step, source },
        }
    }

    /// Wrap a port failure raised while reading a mandatory record field.
    /// A field that never shows up within the deadline is unreadable, so
    /// timeouts count as extraction failures here.
    pub fn field(field: &'static str, source: PageError) -> Self {
        match source {
            PageError::Connection(_) => ScrapeError::Connection {
                step: field,
                source,
            },
            source => ScrapeError::Extraction { field, source },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ScrapeError::Connection { .. } => ErrorKind::Connection,
            ScrapeError::Io { .. } | ScrapeError::Serialize(_) => ErrorKind::Io,
            ScrapeError::OperatorUnavailable(_) => ErrorKind::Io,
            ScrapeError::Ui { .. }
            | ScrapeError::Timeout { .. }
            | ScrapeError::Extraction { .. }
            | ScrapeError::FeedExhausted { .. } => ErrorKind::TransientUi,
        }
    }
}

/// Result type for the scraping core
pub type ScrapeResult<T> = Result<T, ScrapeError>;
