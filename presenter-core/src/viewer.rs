//! C7 Viewer Service: polls the Presenter at a fixed cadence, detects slide
//! changes, and fans them out to subscribers. Grounded on the same
//! broadcast-registry shape as the job manager
//! (`ferrex-server/src/infra/scan/scan_manager.rs`) and on
//! `ferrex-server/src/infra/websocket/manager.rs` for the
//! connect/replay-snapshot/disconnect-on-failed-write subscriber lifecycle.

use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::client::{ClientError, PresenterClient};

pub const POLL_INTERVAL: Duration = Duration::from_millis(1500);
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);
const BROADCAST_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerStatus {
    pub connected: bool,
    pub presenter_version: Option<String>,
    pub presentation_uuid: Option<String>,
    pub slide_index: i64,
    pub current_text: String,
    pub next_text: String,
}

impl ViewerStatus {
    fn disconnected() -> Self {
        Self {
            connected: false,
            presenter_version: None,
            presentation_uuid: None,
            slide_index: -1,
            current_text: String::new(),
            next_text: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
#[serde(rename_all = "camelCase")]
pub enum ViewerEvent {
    Connected,
    Disconnected,
    SlideChange { status: ViewerStatus },
}

struct Inner {
    last_status: RwLock<ViewerStatus>,
    tx: broadcast::Sender<ViewerEvent>,
}

/// Shared handle to the poller and its subscriber registry. One instance
/// per process; `presenter-server` spawns [`ViewerService::run_poll_loop`]
/// as a background task at startup.
#[derive(Clone)]
pub struct ViewerService {
    inner: Arc<Inner>,
}

impl ViewerService {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(BROADCAST_CAPACITY);
        Self { inner: Arc::new(Inner { last_status: RwLock::new(ViewerStatus::disconnected()), tx }) }
    }

    pub fn current_status(&self) -> ViewerStatus {
        self.inner.last_status.read().clone()
    }

    /// Subscribes a viewer. The first event(s) sent are a connect/disconnect
    /// snapshot and, if connected with an active slide, an immediate
    /// `slideChange` so the client paints without waiting for the next poll
    /// (spec §4.7).
    pub fn subscribe(&self) -> impl Stream<Item = ViewerEvent> + Send + 'static {
        let rx = self.inner.tx.subscribe();
        let snapshot = self.current_status();

        let mut initial = vec![if snapshot.connected { ViewerEvent::Connected } else { ViewerEvent::Disconnected }];
        if snapshot.connected && snapshot.slide_index >= 0 {
            initial.push(ViewerEvent::SlideChange { status: snapshot });
        }

        let live = BroadcastStream::new(rx).filter_map(|result| result.ok());
        tokio_stream::iter(initial).chain(live)
    }

    /// Runs forever, polling the Presenter every [`POLL_INTERVAL`] and
    /// publishing `connected`/`disconnected`/`slideChange` transitions.
    /// Intended to be spawned once as a background task; never returns
    /// under normal operation.
    pub async fn run_poll_loop(self, client: Arc<PresenterClient>) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        loop {
            ticker.tick().await;
            self.poll_once(&client).await;
        }
    }

    async fn poll_once(&self, client: &PresenterClient) {
        match client.current_slide_status().await {
            Ok(slide) => {
                let version = client.version().await.ok().map(|v| v.version);
                let status = ViewerStatus {
                    connected: true,
                    presenter_version: version,
                    presentation_uuid: slide.presentation_uuid,
                    slide_index: slide.slide_index,
                    current_text: slide.current_text,
                    next_text: slide.next_text,
                };
                self.transition_to(status);
            }
            Err(ClientError::Unavailable | ClientError::Timeout) => self.transition_to(ViewerStatus::disconnected()),
            Err(_) => self.transition_to(ViewerStatus::disconnected()),
        }
    }

    fn transition_to(&self, status: ViewerStatus) {
        let mut last = self.inner.last_status.write();
        let was_connected = last.connected;

        if status.connected && !was_connected {
            let _ = self.inner.tx.send(ViewerEvent::Connected);
        } else if !status.connected && was_connected {
            let _ = self.inner.tx.send(ViewerEvent::Disconnected);
        }

        let slide_changed = (status.presentation_uuid.clone(), status.slide_index)
            != (last.presentation_uuid.clone(), last.slide_index);

        if status.connected && slide_changed {
            let _ = self.inner.tx.send(ViewerEvent::SlideChange { status: status.clone() });
        }

        *last = status;
    }
}

impl Default for ViewerService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribing_while_disconnected_yields_only_a_disconnected_snapshot() {
        let service = ViewerService::new();
        let events: Vec<_> = futures::executor::block_on(async {
            use futures::StreamExt;
            service.subscribe().take(1).collect().await
        });
        assert!(matches!(events[0], ViewerEvent::Disconnected));
    }

    #[test]
    fn transition_to_connected_with_slide_emits_connected_then_slide_change() {
        let service = ViewerService::new();
        let mut rx = service.inner.tx.subscribe();
        service.transition_to(ViewerStatus {
            connected: true,
            presenter_version: Some("1.0".to_string()),
            presentation_uuid: Some("p1".to_string()),
            slide_index: 0,
            current_text: "hello".to_string(),
            next_text: "world".to_string(),
        });
        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert!(matches!(first, ViewerEvent::Connected));
        assert!(matches!(second, ViewerEvent::SlideChange { .. }));
    }

    #[test]
    fn repeating_the_same_slide_does_not_emit_a_second_slide_change() {
        let service = ViewerService::new();
        let status = ViewerStatus {
            connected: true,
            presenter_version: None,
            presentation_uuid: Some("p1".to_string()),
            slide_index: 2,
            current_text: "a".to_string(),
            next_text: "b".to_string(),
        };
        service.transition_to(status.clone());
        let mut rx = service.inner.tx.subscribe();
        service.transition_to(status);
        assert!(rx.try_recv().is_err());
    }
}
