//! Connection, settings, alias, font, and supervisor routes under `/api/*`
//! (spec §4.1, §4.2, §4.6 style data, §4.9).

use std::time::Duration;

use axum::extract::{Path, State};
use axum::Json;
use presenter_core::model::{AliasEntry, Settings, SettingsPatch};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Presenter readiness/version (spec §4.8 `GET /api/status`).
#[derive(Debug, Serialize)]
pub struct StatusBody {
    reachable: bool,
    version: Option<String>,
    name: Option<String>,
    platform: Option<String>,
}

pub async fn status(State(state): State<AppState>) -> Json<StatusBody> {
    match state.client.version().await {
        Ok(v) => Json(StatusBody { reachable: true, version: Some(v.version), name: Some(v.name), platform: Some(v.platform) }),
        Err(_) => Json(StatusBody { reachable: false, version: None, name: None, platform: None }),
    }
}

pub async fn playlists(State(state): State<AppState>) -> AppResult<Json<Vec<presenter_core::client::PlaylistNode>>> {
    let playlists = state.client.list_playlists().await.map_err(|err| AppError::from(upstream_error(err)))?;
    Ok(Json(playlists))
}

pub async fn libraries(State(state): State<AppState>) -> Json<Vec<presenter_core::client::Library>> {
    Json(state.client.list_libraries().await)
}

fn upstream_error(err: presenter_core::client::ClientError) -> presenter_core::error::AppError {
    presenter_core::error::AppError::upstream_unavailable(err.to_string())
}

pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.stores.settings.load())
}

pub async fn put_settings(State(state): State<AppState>, Json(patch): Json<SettingsPatch>) -> AppResult<Json<Settings>> {
    let settings = state.stores.settings.save(patch).map_err(AppError::from)?;
    Ok(Json(settings))
}

pub async fn get_aliases(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!(state.stores.aliases.load()))
}

#[derive(Debug, Deserialize)]
pub struct PutAliasBody {
    uuid: String,
    name: String,
}

pub async fn put_alias(
    State(state): State<AppState>,
    Path(song_title): Path<String>,
    Json(body): Json<PutAliasBody>,
) -> AppResult<Json<serde_json::Value>> {
    let key = state
        .stores
        .aliases
        .set(&song_title, AliasEntry { presentation_uuid: body.uuid, display_name: body.name })
        .map_err(AppError::from)?;
    Ok(Json(serde_json::json!({ "normalizedKey": key })))
}

pub async fn delete_alias(State(state): State<AppState>, Path(song_title): Path<String>) -> AppResult<Json<serde_json::Value>> {
    let existed = state.stores.aliases.remove(&song_title).map_err(AppError::from)?;
    Ok(Json(serde_json::json!({ "removed": existed })))
}

/// Fonts the bundled deck builder supports. The deck-layout engine itself is
/// an external collaborator (spec §1, §9); this is just the font allow-list
/// its templates are built against.
const SUPPORTED_FONTS: &[&str] = &["Arial", "Calibri", "Georgia", "Helvetica", "Times New Roman", "Verdana"];

pub async fn list_fonts() -> Json<Vec<&'static str>> {
    Json(SUPPORTED_FONTS.to_vec())
}

#[derive(Debug, Serialize)]
pub struct FontCheckBody {
    available: bool,
}

pub async fn check_font(Path(name): Path<String>) -> Json<FontCheckBody> {
    let available = SUPPORTED_FONTS.iter().any(|f| f.eq_ignore_ascii_case(&name));
    Json(FontCheckBody { available })
}

const PRESENTER_PROCESS_NAME: &str = "Presenter";
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(15);

pub async fn launch_propresenter(State(state): State<AppState>) -> Json<presenter_core::supervisor::LaunchOutcome> {
    let binary_path = std::env::var("PRESENTER_BINARY_PATH").unwrap_or_else(|_| PRESENTER_PROCESS_NAME.to_string());
    let outcome =
        presenter_core::supervisor::launch_and_wait(PRESENTER_PROCESS_NAME, &binary_path, &state.client, LAUNCH_TIMEOUT).await;
    Json(outcome)
}

#[derive(Debug, Serialize)]
pub struct RunningBody {
    running: bool,
}

pub async fn propresenter_running() -> Json<RunningBody> {
    Json(RunningBody { running: presenter_core::supervisor::is_running(PRESENTER_PROCESS_NAME) })
}
