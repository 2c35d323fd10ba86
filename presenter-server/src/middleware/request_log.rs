//! Structured per-request audit logging (spec §4.3). Writes one JSON line
//! per request through [`presenter_core::logger::FileLogger`] — the durable
//! audit trail, distinct from the `tracing` output `main` installs for
//! operator-facing diagnostics. Layered once, outermost, in
//! [`crate::routes::build_router`] so every request is logged regardless of
//! which auth guard (if any) a route sits behind; the authenticated email is
//! read back off the response extensions [`super::auth_guard::authenticate`]
//! and [`super::auth_guard::optional_authenticate`] stash there, since an
//! outer layer only ever sees the response an inner one hands back.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use presenter_core::auth::AuthContext;
use serde_json::Value;
use uuid::Uuid;

use crate::state::AppState;

const REAL_IP_HEADERS: &[&str] = &["x-forwarded-for", "x-real-ip"];

fn client_ip(headers: &HeaderMap, connect_info: Option<SocketAddr>) -> String {
    for name in REAL_IP_HEADERS {
        if let Some(value) = headers.get(*name).and_then(|v| v.to_str().ok()) {
            if let Some(first) = value.split(',').map(str::trim).find(|s| !s.is_empty()) {
                return first.to_string();
            }
        }
    }
    connect_info.map(|addr| addr.ip().to_string()).unwrap_or_else(|| "unknown".to_string())
}

pub async fn request_log(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let connect_info = req.extensions().get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(req.headers(), connect_info);
    let start = Instant::now();

    let response = next.run(req).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    let email = response
        .extensions()
        .get::<AuthContext>()
        .map(|ctx| Value::String(ctx.identity.email.clone()))
        .unwrap_or(Value::Null);

    let builder = if status >= 500 {
        state.logger.error(format!("{method} {path}"))
    } else if status >= 400 {
        state.logger.warn(format!("{method} {path}"))
    } else {
        state.logger.info(format!("{method} {path}"))
    };

    builder
        .with("requestId", request_id)
        .with("method", method)
        .with("path", path)
        .with("status", status)
        .with("latencyMs", latency_ms)
        .with("clientIp", ip)
        .with("email", email)
        .emit();

    response
}
