pub mod captcha;
pub mod extract;
pub mod walker;

pub use captcha::{CaptchaGate, ConsoleOperator, Operator};
pub use extract::Extractor;
pub use walker::{FeedWalker, WalkOptions};

/// Optional fields collected on top of the mandatory ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSet {
    pub duration: bool,
    pub upload_date: bool,
}

/// Where the walker currently is in its per-video cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    Bootstrapping,
    CaptchaCheck,
    Extracting,
    Persisting,
    Advancing,
    Terminated,
}

impl WalkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalkState::Bootstrapping => "bootstrapping",
            WalkState::CaptchaCheck => "captcha check",
            WalkState::Extracting => "extracting",
            WalkState::Persisting => "persisting",
            WalkState::Advancing => "advancing",
            WalkState::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for WalkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
