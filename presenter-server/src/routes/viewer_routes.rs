//! `/viewer/*` — the public (unauthenticated) slide-viewer fan-out (spec
//! §4.7, §4.8).

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::{Stream, StreamExt};

use crate::state::AppState;

const VIEWER_KEEPALIVE: Duration = Duration::from_secs(15);

pub async fn status(State(state): State<AppState>) -> Json<presenter_core::viewer::ViewerStatus> {
    Json(state.viewer.current_status())
}

/// `GET /viewer/api/slide`: same snapshot as `status`, kept as a distinct
/// route name because spec §4.8 lists both — callers poll whichever fits
/// their UI.
pub async fn slide(State(state): State<AppState>) -> Json<presenter_core::viewer::ViewerStatus> {
    Json(state.viewer.current_status())
}

pub async fn events(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state.viewer.subscribe();
    let events = stream.map(|event| Ok(Event::default().json_data(&event).unwrap_or_else(|_| Event::default().data("{}"))));
    Sse::new(events).keep_alive(KeepAlive::new().interval(VIEWER_KEEPALIVE).text(":keepalive"))
}

/// Proxies a thumbnail byte stream from the Presenter, propagating its
/// content-type and disabling caching so a later `slideChange`'s
/// cache-busting query string actually busts the cache (spec §4.7).
pub async fn thumbnail(
    State(state): State<AppState>,
    Path((presentation_uuid, slide_index)): Path<(String, u32)>,
) -> Response {
    match state.client.thumbnail_stream(&presentation_uuid, slide_index).await {
        Ok(thumb) => {
            let content_type = thumb.content_type.clone();
            let stream = thumb.response.bytes_stream();
            let body = axum::body::Body::from_stream(stream);
            (
                [(header::CONTENT_TYPE, content_type), (header::CACHE_CONTROL, "no-cache".to_string())],
                body,
            )
                .into_response()
        }
        Err(_) => StatusCode::BAD_GATEWAY.into_response(),
    }
}
