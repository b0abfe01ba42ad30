use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "https://instagram-backend-4p93.onrender.com";

/// Response from the /api/instagram endpoint
///
/// Only `downloadUrl` is part of the contract; anything else the backend sends is ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkResponse {
    #[serde(rename = "downloadUrl", default)]
    pub download_url: Option<String>,
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Wait before the single cold-start retry
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            retry_delay: Duration::from_millis(2500),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("insta-reel-downloader/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    /// Defaults, overridden by `INSTA_BACKEND_URL` and `INSTA_RETRY_DELAY_MS` when set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(base_url) = lookup("INSTA_BACKEND_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup("INSTA_RETRY_DELAY_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.retry_delay = Duration::from_millis(ms),
                Err(_) => tracing::warn!(value = %raw, "ignoring unparsable INSTA_RETRY_DELAY_MS"),
            }
        }

        config
    }
}
