use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::time::Duration;

pub type VerifierResult<T> = Result<T, VerifierError>;

/// Process-level errors
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unable to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("Shutdown coordinator failed: {0}")]
    Coordinator(#[from] tokio::task::JoinError),
}

impl VerifierError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        VerifierError::InvalidConfig(message.into())
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            VerifierError::Config(_) | VerifierError::InvalidConfig(_) => 2,
            VerifierError::Bind { .. }
            | VerifierError::Serve(_)
            | VerifierError::Coordinator(_) => 1,
        }
    }
}

/// A request that is not a valid one-time verification.
///
/// Always answered with `400 Bad Request` and an empty body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("invalid verification request received")]
    InvalidMethod,

    #[error("verification header missing")]
    MissingChallenge,
}

impl IntoResponse for VerificationError {
    fn into_response(self) -> Response {
        StatusCode::BAD_REQUEST.into_response()
    }
}

/// Graceful stop did not complete cleanly
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StopError {
    #[error("server is already stopping")]
    AlreadyStopping,

    #[error("in-flight requests still running after {0:?}, connections force-closed")]
    GraceElapsed(Duration),
}
