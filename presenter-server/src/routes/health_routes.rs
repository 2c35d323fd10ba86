//! `GET /health` — cheap liveness probe, with an optional deep tunnel check
//! (spec §4.8).

use std::time::{Duration, Instant};

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

const TUNNEL_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
pub struct HealthParams {
    check: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelHealth {
    reachable: bool,
    latency_ms: u128,
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    status: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tunnel: Option<TunnelHealth>,
}

pub async fn health(State(state): State<AppState>, Query(params): Query<HealthParams>) -> Json<HealthBody> {
    let tunnel = if params.check.as_deref() == Some("tunnel") {
        Some(probe_tunnel(&state).await)
    } else {
        None
    };

    Json(HealthBody { status: "ok", timestamp: chrono::Utc::now(), tunnel })
}

async fn probe_tunnel(state: &AppState) -> TunnelHealth {
    let Some(url) = state.config.public_tunnel_url.clone() else {
        return TunnelHealth { reachable: false, latency_ms: 0 };
    };

    let client = reqwest::Client::new();
    let start = Instant::now();
    let result = tokio::time::timeout(TUNNEL_PROBE_TIMEOUT, client.get(&url).send()).await;
    let latency_ms = start.elapsed().as_millis();

    match result {
        Ok(Ok(response)) => TunnelHealth { reachable: response.status().is_success(), latency_ms },
        _ => TunnelHealth { reachable: false, latency_ms },
    }
}
