//! `/api/export*` — the job-oriented export pipeline (spec §4.5, §4.6,
//! §4.8). Grounded on
//! `ferrex-server/src/handlers/scan/handle_scan.rs::build_scan_progress_stream`
//! for the SSE replay-then-live wiring.

use std::convert::Infallible;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::{Stream, StreamExt};
use presenter_core::jobs::export::{ExportRequest, DECK_CONTENT_TYPE};
use presenter_core::model::DeckStyleOverride;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

const PROGRESS_KEEPALIVE: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExportBody {
    playlist_id: String,
    playlist_name: String,
    #[serde(default)]
    library_filter: Option<String>,
    #[serde(default)]
    include_titles: Option<bool>,
    #[serde(default)]
    style_overrides: Option<DeckStyleOverride>,
    #[serde(default)]
    logo_path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExportResponse {
    job_id: Uuid,
}

/// `POST /api/export`: creates the job, spawns the worker, and returns
/// immediately (spec §4.5: "Start a job without waiting").
pub async fn start(State(state): State<AppState>, Json(body): Json<StartExportBody>) -> Json<StartExportResponse> {
    let (job_id, handle) = state.jobs.start();

    let request = ExportRequest {
        playlist_id: body.playlist_id,
        playlist_name: body.playlist_name,
        library_filter: body.library_filter,
        include_titles: body.include_titles,
        style_overrides: body.style_overrides,
        logo_path: body.logo_path,
    };

    let client = state.client.clone();
    let settings = state.stores.settings.clone();
    let extractor = state.extractor.clone();
    let deck_builder = state.deck_builder.clone();
    let staging_dir = state.export_staging_dir.clone();

    tokio::spawn(async move {
        presenter_core::jobs::export::run_export(
            handle,
            request,
            client,
            settings,
            extractor,
            deck_builder,
            staging_dir,
            "/api/export",
        )
        .await;
    });

    Json(StartExportResponse { job_id })
}

/// `GET /api/export/{id}/progress`: history replay then live events,
/// closing after the terminal event (spec §4.5, §8 property 4).
pub async fn progress(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let stream = state.jobs.subscribe(job_id).map_err(AppError::from)?;
    let events = stream.map(|event| {
        Ok(Event::default().json_data(&event).unwrap_or_else(|_| Event::default().data("{}")))
    });
    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(PROGRESS_KEEPALIVE).text(":keepalive")))
}

/// `GET /api/export/{id}/download`: 409 before completion (spec §6), then
/// the staged file with the slide-deck MIME type and a `Content-Disposition`
/// filename already slugified+timestamped at creation (spec §6).
pub async fn download(State(state): State<AppState>, Path(job_id): Path<Uuid>) -> AppResult<Response> {
    let (path, file_name) = state.jobs.download_path(job_id).map_err(AppError::from)?;
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|err| AppError::from(presenter_core::error::AppError::internal(err.to_string())))?;
    let stream = tokio_util::io::ReaderStream::new(file);
    let body = Body::from_stream(stream);

    Ok((
        [
            (axum::http::header::CONTENT_TYPE, DECK_CONTENT_TYPE.to_string()),
            (axum::http::header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
        ],
        body,
    )
        .into_response())
}
