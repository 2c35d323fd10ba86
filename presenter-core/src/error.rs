//! Kind-tagged errors shared across the proxy. Framework-agnostic: no
//! `axum` dependency lives here, `presenter-server::errors` maps each kind
//! onto an HTTP status.

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// One variant per error kind named in the specification's error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    UpstreamUnavailable(String),

    #[error("{0}")]
    Internal(String),

    #[error("{message}")]
    OAuthNotConfigured { message: String, hint: String },

    #[error("{0}")]
    NoLyricsFound(String),
}

impl AppError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(message.into())
    }

    pub fn oauth_not_configured(provider: &str) -> Self {
        Self::OAuthNotConfigured {
            message: format!("OAuth provider '{provider}' is not configured"),
            hint: "set the client id/secret environment variables and restart".to_string(),
        }
    }

    /// Remedial hint surfaced alongside `error` in the HTTP body, per spec §7.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::OAuthNotConfigured { hint, .. } => Some(hint),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(err.to_string())
    }
}
