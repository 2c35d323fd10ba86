//! Assembles every handler into one `Router<AppState>` (spec §4.8). Grounded
//! on `ferrex-server/src/main.rs::create_app` for the outer-to-inner layer
//! ordering (CORS, tracing, then narrower guards closer to the handlers) and
//! on `ferrex-server/src/routes/mod.rs`'s split between a public router and
//! an authenticated one that gets merged in.

pub mod auth_routes;
pub mod config_routes;
pub mod export_routes;
pub mod health_routes;
pub mod user_routes;
pub mod viewer_routes;

use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::middleware;
use crate::middleware::rate_limit::auth_rate_limit_layer;
use crate::state::AppState;

/// Directory the SPA shell and viewer assets are served from. The static
/// build itself lives outside this crate (spec §1 "display adapter" is an
/// external collaborator); this path just needs to exist at startup.
pub const STATIC_ASSETS_DIR: &str = "static";

pub fn build_router(state: AppState) -> Router {
    let auth_public_routes = Router::new()
        .route("/auth/status", get(auth_routes::status))
        .route("/auth/{provider}", get(auth_routes::start))
        .route("/auth/{provider}/callback", get(auth_routes::callback))
        .layer(auth_rate_limit_layer());

    let session_routes = Router::new()
        .route("/auth/me", get(auth_routes::me))
        .route("/auth/logout", post(auth_routes::logout))
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::authenticate));

    let user_admin_routes = Router::new()
        .route("/users", get(user_routes::list).post(user_routes::add))
        .route("/users/{email}", delete(user_routes::remove))
        .route("/users/{email}/admin", patch(user_routes::set_admin))
        .layer(axum::middleware::from_fn(middleware::require_admin))
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::authenticate));

    let api_routes = Router::new()
        .route("/api/status", get(config_routes::status))
        .route("/api/playlists", get(config_routes::playlists))
        .route("/api/libraries", get(config_routes::libraries))
        .route("/api/settings", get(config_routes::get_settings).put(config_routes::put_settings))
        .route("/api/aliases", get(config_routes::get_aliases))
        .route(
            "/api/aliases/{songTitle}",
            put(config_routes::put_alias).delete(config_routes::delete_alias),
        )
        .route("/api/fonts", get(config_routes::list_fonts))
        .route("/api/fonts/{name}/check", get(config_routes::check_font))
        .route("/api/propresenter/launch", post(config_routes::launch_propresenter))
        .route("/api/propresenter/running", get(config_routes::propresenter_running))
        .route("/api/export", post(export_routes::start))
        .route("/api/export/{id}/progress", get(export_routes::progress))
        .route("/api/export/{id}/download", get(export_routes::download))
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::authenticate));

    let viewer_public_routes = Router::new()
        .route("/viewer/api/status", get(viewer_routes::status))
        .route("/viewer/api/slide", get(viewer_routes::slide))
        .route("/viewer/api/thumbnail/{uuid}/{index}", get(viewer_routes::thumbnail))
        .route("/viewer/events", get(viewer_routes::events))
        .nest_service("/viewer", ServeDir::new(STATIC_ASSETS_DIR).append_index_html_on_directories(true));

    let public_routes = Router::new()
        .route("/health", get(health_routes::health))
        .merge(auth_public_routes)
        .merge(viewer_public_routes);

    let protected_routes = Router::new().merge(session_routes).merge(user_admin_routes).merge(api_routes);

    let spa = Router::new()
        .fallback_service(ServeFile::new(format!("{STATIC_ASSETS_DIR}/index.html")))
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::optional_authenticate));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(spa)
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::security_headers))
        .layer(CorsLayer::new().allow_origin(cors_origin(&state)).allow_credentials(true))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::request_log))
        .with_state(state)
}

/// Reflects the configured origin allow-list, or denies all cross-origin
/// requests if none is set — this server's own SPA is same-origin and needs
/// no CORS grant (spec §6 lists CORS origins as a whitelisted env var).
fn cors_origin(state: &AppState) -> AllowOrigin {
    let origins: Vec<axum::http::HeaderValue> =
        state.config.cors_origins.iter().filter_map(|origin| origin.parse().ok()).collect();
    AllowOrigin::list(origins)
}
