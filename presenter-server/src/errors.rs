//! Maps [`presenter_core::AppError`] onto HTTP responses (spec §6, §7).
//! Grounded on the split between `ferrex_core::error::MediaError` and
//! `ferrex_server::infra::errors::AppError` in the teacher, where the
//! framework-agnostic error kind is wrapped by a server-local newtype that
//! implements `IntoResponse`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use presenter_core::error::AppError as CoreError;
use serde::Serialize;

/// Newtype so this crate can impl `IntoResponse` for a type defined
/// upstream in `presenter-core`.
pub struct AppError(pub CoreError);

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            CoreError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            CoreError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CoreError::OAuthNotConfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            // no-lyrics-found is only ever surfaced as a progress-stream
            // event (spec §7), never returned from a handler directly, but
            // the mapping is total for defense-in-depth.
            CoreError::NoLyricsFound(_) => StatusCode::BAD_REQUEST,
        };

        let body = ErrorBody { error: self.0.to_string(), hint: self.0.hint().map(str::to_string) };
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
