use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Facts extracted from a single video page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VideoRecord {
    pub url: String,
    pub description: String,
    /// Rendered as the platform shows it, e.g. "12.3K"
    #[serde(rename = "Likes")]
    pub like_count: String,
    #[serde(rename = "Comments")]
    pub comment_count: String,
    #[serde(rename = "UploadAt", default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
    /// `None` when duration collection is disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl VideoRecord {
    /// Playback duration, 0 when it was not collected or could not be resolved.
    pub fn duration(&self) -> f64 {
        self.duration_seconds.unwrap_or(0.0)
    }
}

/// The accumulated state of one run. Records are append-only and kept in
/// feed order; the serialized form is the output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScrapeSession {
    profile_url: String,
    started_at: DateTime<Utc>,
    #[serde(rename = "VideoStats")]
    records: Vec<VideoRecord>,
}

impl ScrapeSession {
    pub fn new(profile_url: impl Into<String>) -> Self {
        Self::with_start_time(profile_url, Utc::now())
    }

    pub fn with_start_time(profile_url: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            profile_url: profile_url.into(),
            started_at,
            records: Vec::new(),
        }
    }

    pub fn profile_url(&self) -> &str {
        &self.profile_url
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record; returns its zero-based position in the feed.
    pub fn push(&mut self, record: VideoRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }
}
