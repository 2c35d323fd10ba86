//! Admin-only guard for mutating `/users/*` endpoints (spec §4.4). Must run
//! after [`super::auth_guard::authenticate`] in the layer stack so an
//! [`AuthContext`] is already present.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use presenter_core::auth::AuthContext;
use presenter_core::error::AppError as CoreError;

use crate::errors::AppError;

pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let is_admin = req.extensions().get::<AuthContext>().map(|ctx| ctx.is_admin).unwrap_or(false);
    if !is_admin {
        return Err(CoreError::forbidden("admin privileges required").into());
    }
    Ok(next.run(req).await)
}
