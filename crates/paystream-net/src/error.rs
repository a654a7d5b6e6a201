use thiserror::Error;
use url::Url;

/// Centralized error type for paystream-net
#[derive(Debug, Error, Clone)]
pub enum NetError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("HTTP {status} for URL: {url}")]
    HttpError {
        url: Url,
        status: u16,
        body: Option<String>,
    },
    #[error("Timeout")]
    Timeout,
    #[error("Request failed after {max_retries} retries: {source}")]
    RetryExhausted {
        max_retries: u32,
        source: Box<NetError>,
    },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl NetError {
    /// Creates an HTTP status error
    pub fn http_error(status: u16, url: Url, body: Option<String>) -> Self {
        Self::HttpError { url, status, body }
    }

    /// Creates a timeout error
    pub fn timeout() -> Self {
        Self::Timeout
    }

    /// Creates an HTTP error from a generic string
    pub fn http<S: Into<String>>(msg: S) -> Self {
        Self::Http(msg.into())
    }

    /// Checks if this error is considered retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            NetError::Http(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("timeout") || msg.contains("connection") || msg.contains("network")
            }
            NetError::Timeout => true,
            NetError::HttpError { status, .. } => is_retryable_status(*status),
            NetError::RetryExhausted { .. } | NetError::InvalidUrl(_) => false,
        }
    }

    /// Checks if this error indicates a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, NetError::Timeout)
    }

    /// Gets the HTTP status code if this is an HTTP status error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetError::HttpError { status, .. } => Some(*status),
            NetError::RetryExhausted { source, .. } => source.status_code(),
            _ => None,
        }
    }
}

/// 5xx, 429 Too Many Requests and 408 Request Timeout are worth another try.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 429 || status == 408
}

impl From<reqwest::Error> for NetError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(error.to_string())
        }
    }
}

impl From<url::ParseError> for NetError {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidUrl(error.to_string())
    }
}

pub type NetResult<T> = Result<T, NetError>;
