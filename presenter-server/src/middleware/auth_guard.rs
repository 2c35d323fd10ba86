//! Accepts either a valid session cookie or a bearer token (spec §4.4).
//! Grounded on the extractor + `Extension`-insertion pattern of
//! `ferrex-server/src/auth/middleware.rs`, generalized from a single
//! password scheme to OAuth-session-or-bearer.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::PrivateCookieJar;
use presenter_core::auth::AuthContext;
use presenter_core::error::AppError as CoreError;

use crate::errors::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "session";

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers().get(AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

fn authenticate_request(state: &AppState, jar: &PrivateCookieJar, req: &Request) -> Result<AuthContext, CoreError> {
    if let Some(token) = bearer_token(req) {
        return state.sessions.authenticate_bearer(token);
    }
    let cookie = jar.get(SESSION_COOKIE_NAME).ok_or_else(|| CoreError::unauthenticated("no credentials"))?;
    state.sessions.authenticate_cookie(cookie.value())
}

/// Required auth: rejects with 401/403 before the handler runs. Inserts
/// [`AuthContext`] into request extensions for handlers and
/// [`require_admin`] to read, and again into the response extensions so the
/// outer [`super::request_log`] layer can report who made the request.
pub async fn authenticate(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = authenticate_request(&state, &jar, &req)?;
    req.extensions_mut().insert(ctx.clone());
    let mut response = next.run(req).await;
    response.extensions_mut().insert(ctx);
    Ok(response)
}

/// Optional auth, for routes like `/` that render differently for
/// authenticated vs anonymous visitors but never reject.
pub async fn optional_authenticate(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = authenticate_request(&state, &jar, &req).ok();
    if let Some(ctx) = ctx.clone() {
        req.extensions_mut().insert(ctx);
    }
    let mut response = next.run(req).await;
    if let Some(ctx) = ctx {
        response.extensions_mut().insert(ctx);
    }
    response
}
