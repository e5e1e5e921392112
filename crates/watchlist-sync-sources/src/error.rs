use thiserror::Error;

/// Failure to fetch one page over HTTP
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// HTTP 429: the site asked us to slow down
    #[error("rate limited while fetching {url}")]
    RateLimited { url: String },

    #[error("HTTP {status} while fetching {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },
}

impl FetchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }

    /// Short label used to group failures in progress summaries
    pub fn category(&self) -> &'static str {
        match self {
            FetchError::RateLimited { .. } => "rate limited",
            FetchError::Status { .. } => "http status",
            FetchError::Network { .. } => "network",
        }
    }
}
