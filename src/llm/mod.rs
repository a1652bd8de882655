pub mod chat;

use std::time::Duration;
use thiserror::Error;

use crate::cli::Args;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("upstream request failed: {0}")]
    Transport(reqwest::Error),
    #[error("upstream returned status {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
    #[error("upstream response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("upstream response is missing {0}")]
    MalformedResponse(&'static str),
}

impl From<reqwest::Error> for UpstreamError {
    // reqwest embeds the request url in its message and ours carries the key.
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Transport(err.without_url())
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub send_turn_roles: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout: None,
            send_turn_roles: false,
        }
    }
}

impl LlmConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            api_key: args.gemini_api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: Some(args.gemini_base_url.clone()).filter(|u| !u.trim().is_empty()),
            timeout: match args.gemini_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            send_turn_roles: args.gemini_send_turn_roles,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
