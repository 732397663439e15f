//! Error taxonomy shared across the crate.
//!
//! Rate limiting is the only error class that is retried automatically; all
//! other variants propagate up to the CLI boundary, which reports the
//! message and exits non-zero.

use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid configuration (e.g. no client id/secret). Fatal,
    /// reported before any network activity.
    Config(String),
    /// Authorization, refresh or state-validation failure. Where applicable
    /// the caller falls back to a full re-authorization.
    Auth(String),
    /// The provider responded 429. Carries the parsed `Retry-After` value in
    /// seconds when present; callers wait and retry the same request.
    RateLimited { retry_after_secs: Option<u64> },
    /// Network-level request failure.
    Transport(reqwest::Error),
    /// Any non-rate-limit error response from the provider.
    Provider(String),
    /// Playlist creation or modification failure.
    Playlist(String),
    /// Token file could not be written. Unreadable or corrupt token files
    /// are treated as "no token" instead and never surface here.
    Persistence(std::io::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Config(msg) => write!(f, "configuration error: {}", msg),
            ApiError::Auth(msg) => write!(f, "authentication error: {}", msg),
            ApiError::RateLimited { retry_after_secs } => match retry_after_secs {
                Some(secs) => write!(f, "rate limited, retry after {}s", secs),
                None => write!(f, "rate limited"),
            },
            ApiError::Transport(err) => write!(f, "request failed: {}", err),
            ApiError::Provider(msg) => write!(f, "provider error: {}", msg),
            ApiError::Playlist(msg) => write!(f, "playlist error: {}", msg),
            ApiError::Persistence(err) => write!(f, "failed to save tokens: {}", err),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Transport(err) => Some(err),
            ApiError::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Persistence(err)
    }
}

impl ApiError {
    /// The backoff to apply before retrying a rate-limited request. Defaults
    /// to 5 seconds when the provider did not supply a usable `Retry-After`.
    pub fn retry_delay(&self) -> std::time::Duration {
        match self {
            ApiError::RateLimited { retry_after_secs } => {
                std::time::Duration::from_secs(retry_after_secs.unwrap_or(5))
            }
            _ => std::time::Duration::from_secs(0),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }
}
