use reqwest::StatusCode;

use growsync_api::ReadError;

/// Failure of a single view fetch. Always surfaced through the alert banner.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Request to {url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("Response from {url} could not be decoded: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    pub fn transport(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout { url: url.to_string() }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub fn decode(url: &str, err: ReadError) -> Self {
        FetchError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Timeout { url }
            | FetchError::Status { url, .. }
            | FetchError::Decode { url, .. } => url,
        }
    }
}
