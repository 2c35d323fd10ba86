//! `/users/*` — admin-only allow-list management (spec §4.2, §4.8).

use axum::extract::{Path, State};
use axum::Json;
use presenter_core::error::AppError as CoreError;
use presenter_core::model::UserRecord;
use serde::Deserialize;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Json<Vec<UserRecord>> {
    Json(state.stores.users.list_all())
}

#[derive(Debug, Deserialize)]
pub struct AddUserBody {
    email: String,
    #[serde(default)]
    admin: bool,
}

pub async fn add(State(state): State<AppState>, Json(body): Json<AddUserBody>) -> AppResult<Json<UserRecord>> {
    if body.email.trim().is_empty() {
        return Err(AppError::from(CoreError::bad_request("email is required")));
    }
    state.stores.users.add(&body.email).map_err(AppError::from)?;
    if body.admin {
        state.stores.users.set_admin(&body.email, true).map_err(AppError::from)?;
    }
    let record = state
        .stores
        .users
        .list_all()
        .into_iter()
        .find(|u| u.email == presenter_core::model::canonicalize_email(&body.email))
        .expect("just-added user is present");
    Ok(Json(record))
}

pub async fn remove(State(state): State<AppState>, Path(email): Path<String>) -> AppResult<Json<serde_json::Value>> {
    state.sessions.revoke_user(&email).map_err(AppError::from)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct SetAdminBody {
    admin: bool,
}

pub async fn set_admin(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(body): Json<SetAdminBody>,
) -> AppResult<Json<serde_json::Value>> {
    state.stores.users.set_admin(&email, body.admin).map_err(AppError::from)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
