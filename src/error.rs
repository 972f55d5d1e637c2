use thiserror::Error;

use crate::models::k8s::Status;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Failures talking to the API server. Variants raised by the server carry
/// its HTTP code and message unchanged.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected type.
    #[error("decoding {what}: {message}")]
    Decode { what: &'static str, message: String },

    #[error("unauthorized ({code}): {message}")]
    Unauthorized { code: u16, message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    /// Stale resourceVersion on update.
    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("invalid ({code}): {message}")]
    Invalid { code: u16, message: String },

    #[error("api server returned {code}: {message}")]
    Api { code: u16, message: String },
}

impl ApiError {
    /// Classifies a non-success response. `body` is the raw response text;
    /// when it holds a `Status` object its message is used.
    pub fn from_response(code: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Status>(body)
            .ok()
            .filter(|s| !s.message.is_empty())
            .map(|s| s.message)
            .unwrap_or_else(|| body.trim().to_string());

        match code {
            401 | 403 => ApiError::Unauthorized { code, message },
            404 => ApiError::NotFound { message },
            409 => ApiError::Conflict { message },
            400 | 422 => ApiError::Invalid { code, message },
            _ => ApiError::Api { code, message },
        }
    }

    /// HTTP code to report to our own callers.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Transport(_) => 502,
            ApiError::Decode { .. } => 502,
            ApiError::Unauthorized { code, .. } => *code,
            ApiError::NotFound { .. } => 404,
            ApiError::Conflict { .. } => 409,
            ApiError::Invalid { code, .. } => *code,
            ApiError::Api { code, .. } => *code,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "BadGateway",
            ApiError::Decode { .. } => "BadGateway",
            ApiError::Unauthorized { code: 401, .. } => "Unauthorized",
            ApiError::Unauthorized { .. } => "Forbidden",
            ApiError::NotFound { .. } => "NotFound",
            ApiError::Conflict { .. } => "Conflict",
            ApiError::Invalid { .. } => "Invalid",
            ApiError::Api { .. } => "Unknown",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict { .. })
    }
}
