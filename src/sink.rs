use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ScrapeError, ScrapeResult};
use crate::models::ScrapeSession;

/// Destination for the growing session. Each call replaces what the
/// previous one wrote, so the artifact always holds the whole session.
pub trait ResultSink {
    fn persist(&mut self, session: &ScrapeSession) -> ScrapeResult<()>;
}

/// Writes the session as a JSON document to a single file
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ScrapeError {
        ScrapeError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ResultSink for JsonFileSink {
    fn persist(&mut self, session: &ScrapeSession) -> ScrapeResult<()> {
        let bytes = serde_json::to_vec_pretty(session)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        std::fs::write(&self.path, &bytes).map_err(|e| self.io_error(e))?;

        debug!(
            "Wrote {} record(s), {} bytes to {}",
            session.len(),
            bytes.len(),
            self.path.display()
        );
        Ok(())
    }
}
