//! DOM selectors and evaluation scripts for the video platform's web UI.

pub const VIDEO_ITEM: &str = r#"[data-e2e="user-post-item"]"#;
pub const VIDEO_DESCRIPTION: &str = r#"[data-e2e="browse-video-desc"]"#;
pub const VIDEO_LIKES: &str = r#"[data-e2e="browse-like-count"]"#;
pub const VIDEO_COMMENTS: &str = r#"[data-e2e="browse-comment-count"]"#;
pub const VIDEO_NEXT_BUTTON: &str = r#"[data-e2e="arrow-right"]"#;
pub const VIDEO_UPLOAD_DATE: &str = r#"[data-e2e="browser-nickname"] :nth-child(2)"#;
pub const VIDEO_PLAYER: &str = r#"[data-e2e="browse-video"] video"#;
pub const CAPTCHA_CONTAINER: &str = ".captcha_verify_container";

/// HTMLMediaElement.HAVE_ENOUGH_DATA
const PLAYER_READY_STATE: u8 = 4;

/// The selector set the walker and extractor operate with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub video_item: String,
    pub description: String,
    pub likes: String,
    pub comments: String,
    pub next_button: String,
    pub upload_date: String,
    pub player: String,
    pub captcha: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            video_item: VIDEO_ITEM.to_string(),
            description: VIDEO_DESCRIPTION.to_string(),
            likes: VIDEO_LIKES.to_string(),
            comments: VIDEO_COMMENTS.to_string(),
            next_button: VIDEO_NEXT_BUTTON.to_string(),
            upload_date: VIDEO_UPLOAD_DATE.to_string(),
            player: VIDEO_PLAYER.to_string(),
            captcha: CAPTCHA_CONTAINER.to_string(),
        }
    }
}

impl Selectors {
    /// Script evaluating to `true` while a captcha challenge is mounted.
    pub fn captcha_script(&self) -> String {
        format!("!!document.querySelector({})", js_string(&self.captcha))
    }

    /// Script evaluating to `true` once the player has buffered enough to play.
    pub fn player_ready_script(&self) -> String {
        format!(
            "(() => {{ const v = document.querySelector({}); return !!v && v.readyState === {}; }})()",
            js_string(&self.player),
            PLAYER_READY_STATE
        )
    }

    /// Script evaluating to the player's duration in seconds.
    pub fn player_duration_script(&self) -> String {
        format!(
            "(() => {{ const v = document.querySelector({}); return v ? v.duration : null; }})()",
            js_string(&self.player)
        )
    }
}

fn js_string(s: &str) -> String {
    // A JSON string literal is a valid JS string literal.
    serde_json::Value::String(s.to_string()).to_string()
}
