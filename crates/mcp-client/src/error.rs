use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Classified failure of a single outbound call
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("HTTP {status}: {reason}")]
    HttpStatus {
        status: u16,
        reason: String,
        body: Option<String>,
    },

    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
}

impl ClientError {
    /// Sort a reqwest failure into connection, timeout or generic HTTP error
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(timeout)
        } else if err.is_connect() {
            ClientError::Connection(err.to_string())
        } else {
            ClientError::Http(err)
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server rejected the credential
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Nothing serves requests at this URL, as opposed to an answer from the server
    pub fn is_endpoint_miss(&self) -> bool {
        match self {
            ClientError::HttpStatus { status, .. } => matches!(status, 404 | 405),
            ClientError::Connection(_) | ClientError::InvalidJson(_) => true,
            _ => false,
        }
    }

    /// How much a failure says about the server; the endpoint search reports the highest
    pub(crate) fn failure_rank(&self) -> u8 {
        match self {
            ClientError::HttpStatus { .. } if !self.is_endpoint_miss() => 2,
            _ if self.is_endpoint_miss() => 0,
            _ => 1,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            ClientError::HttpStatus { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}
