//! Usage: Unified client error model (every failure renders as `CODE: message`).

use bytes::Bytes;
use reqwest::StatusCode;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The dispatch was superseded by a newer request with the same identity.
    #[error("REQUEST_CANCELLED: {identity} was superseded by a newer identical request")]
    Cancelled { identity: String },

    #[error("HTTP_STATUS: {method} {path} returned status={}", .status.as_u16())]
    Status {
        status: StatusCode,
        method: String,
        path: String,
        body: Bytes,
    },

    #[error("REQUEST_TIMEOUT: {0}")]
    Timeout(String),

    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),

    #[error("REFRESH_FAILED: {0}")]
    Refresh(String),

    #[error("INVALID_REQUEST: {0}")]
    InvalidRequest(String),

    #[error("CONFIG_ERROR: {0}")]
    Config(String),

    #[error("STORAGE_ERROR: {0}")]
    Storage(String),
}

impl ClientError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Cancelled { .. } => "REQUEST_CANCELLED",
            Self::Status { .. } => "HTTP_STATUS",
            Self::Timeout(_) => "REQUEST_TIMEOUT",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Refresh(_) => "REFRESH_FAILED",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// HTTP status carried by the failure, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return ClientError::Timeout(value.to_string());
        }
        if value.is_builder() {
            return ClientError::InvalidRequest(value.to_string());
        }
        ClientError::Transport(value.to_string())
    }
}
