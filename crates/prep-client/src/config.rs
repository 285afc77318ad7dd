//! Client configuration.
//!
//! # Environment Variables
//!
//! - `PREP_BACKEND_URL`: Base URL of the analysis backend. When unset or
//!   empty the client talks to the local backend at
//!   `http://127.0.0.1:8000`.
//! - `PREP_STATE_DIR`: Directory used as device storage for the draft and
//!   the local history fallback. Defaults to `~/.interview-prep`.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use url::Url;

use crate::error::{ClientError, Result};

/// Environment variable for the backend base URL.
pub const BACKEND_URL_ENV: &str = "PREP_BACKEND_URL";

/// Environment variable for the device storage directory.
pub const STATE_DIR_ENV: &str = "PREP_STATE_DIR";

/// Backend origin used when no base URL is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Timeout applied to history requests. Streaming requests have none.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".interview-prep";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the device storage directory.
///
/// Determined by:
/// 1. `PREP_STATE_DIR` environment variable if set
/// 2. `~/.interview-prep` if a home directory is available
/// 3. `.interview-prep` in the current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Connection settings for the analysis backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    request_timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration for `base_url`.
    ///
    /// An empty or whitespace-only value selects [`DEFAULT_BACKEND_URL`].
    /// Trailing slashes are dropped so endpoint paths join cleanly.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let raw = base_url.as_ref().trim();
        let raw = if raw.is_empty() { DEFAULT_BACKEND_URL } else { raw };

        let parsed = Url::parse(raw)
            .map_err(|e| ClientError::Config(format!("invalid backend URL {:?}: {}", raw, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "backend URL must be http or https, got {:?}",
                raw
            )));
        }

        Ok(Self {
            base_url: raw.trim_end_matches('/').to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Creates a configuration from `PREP_BACKEND_URL`.
    pub fn from_env() -> Result<Self> {
        Self::new(std::env::var(BACKEND_URL_ENV).unwrap_or_default())
    }

    /// Sets the timeout used for history requests.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the history request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Joins `path` (which starts with `/`) onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
