//! C5 Job Manager: registry of asynchronous export jobs with late-subscriber
//! replay and terminal-state fan-out. Grounded directly on
//! `ferrex-server/src/infra/scan/scan_manager.rs`'s `ScanControlPlane`
//! (`Arc<Inner>`, `RwLock<HashMap<Uuid, Arc<Run>>>`, per-run
//! `broadcast::Sender`, history buffer for replay) and
//! `ferrex-server/src/handlers/scan/handle_scan.rs::build_scan_progress_stream`
//! for the history-then-live SSE chain with sequence-number dedup.

pub mod export;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::Stream;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Any job whose history exceeds this many events drops the oldest — a
/// broadcast channel capacity, not a behavioral limit (replay still sees
/// everything that was ever retained).
const BROADCAST_CAPACITY: usize = 256;
pub const JOB_GC_AGE: Duration = Duration::from_secs(30 * 60);
pub const JOB_GC_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Complete,
    Error,
}

/// Tagged progress-event variants (spec §3). `complete` (distinct from
/// `done`) marks the end of the playlist walk with a song count, before
/// deck generation starts — see spec §8 scenario 3.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
#[serde(rename_all = "camelCase")]
pub enum ProgressEvent {
    #[serde(rename = "library:search")]
    LibrarySearch { library: String },
    #[serde(rename = "library:not-found")]
    LibraryNotFound { library: String },
    #[serde(rename = "playlist:start")]
    PlaylistStart { total_items: usize },
    #[serde(rename = "playlist:item:start")]
    PlaylistItemStart { name: String },
    #[serde(rename = "playlist:item:success")]
    PlaylistItemSuccess { name: String },
    #[serde(rename = "playlist:item:error")]
    PlaylistItemError { name: String, message: String },
    #[serde(rename = "playlist:item:skip")]
    PlaylistItemSkip { name: String },
    Info { message: String },
    Warning { message: String },
    #[serde(rename = "complete")]
    WalkComplete { total_songs: usize },
    #[serde(rename = "pptx:start")]
    PptxStart,
    #[serde(rename = "pptx:complete")]
    PptxComplete { download_url: String },
    Done { download_url: String },
    Error { message: String },
}

impl ProgressEvent {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

#[derive(Debug, Clone)]
struct Envelope {
    seq: u64,
    event: ProgressEvent,
}

struct JobEntry {
    id: Uuid,
    created_at: DateTime<Utc>,
    status: RwLock<JobStatus>,
    history: RwLock<Vec<Envelope>>,
    next_seq: AtomicU64,
    tx: broadcast::Sender<Envelope>,
    file_path: RwLock<Option<PathBuf>>,
    file_name: RwLock<Option<String>>,
    error_message: RwLock<Option<String>>,
}

/// Handed to the export worker so it can publish events without touching
/// the registry's internals directly (spec §4.5: "the worker must publish
/// all events through the manager").
#[derive(Clone)]
pub struct JobHandle {
    entry: Arc<JobEntry>,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.entry.id
    }

    /// Appends a non-terminal event to the history and broadcasts it. A
    /// no-op once the job has reached a terminal state (spec §3 invariant
    /// a: "after terminal state, no further progress events are
    /// appended").
    pub fn publish(&self, event: ProgressEvent) {
        let mut status = self.entry.status.write();
        if *status != JobStatus::Pending && *status != JobStatus::Running {
            return;
        }
        *status = JobStatus::Running;
        drop(status);
        self.append(event);
    }

    fn append(&self, event: ProgressEvent) {
        let seq = self.entry.next_seq.fetch_add(1, Ordering::SeqCst);
        let envelope = Envelope { seq, event };
        self.entry.history.write().push(envelope.clone());
        // A broadcast send errors only when there are no receivers; that's
        // expected and not a failure (spec §4.5 invariant: must not block
        // the worker if a subscriber disconnected).
        let _ = self.entry.tx.send(envelope);
    }

    /// Marks the job complete and delivers exactly one `done` event,
    /// clearing listeners afterward (spec §3, §4.5).
    pub fn finish_complete(&self, file_path: PathBuf, file_name: String, download_url: String) {
        *self.entry.file_path.write() = Some(file_path);
        *self.entry.file_name.write() = Some(file_name);
        self.append(ProgressEvent::Done { download_url });
        *self.entry.status.write() = JobStatus::Complete;
    }

    /// Marks the job failed and delivers exactly one `error` event.
    pub fn finish_error(&self, message: impl Into<String>) {
        let message = message.into();
        *self.entry.error_message.write() = Some(message.clone());
        self.append(ProgressEvent::Error { message });
        *self.entry.status.write() = JobStatus::Error;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub error_message: Option<String>,
}

#[derive(Default)]
pub struct JobManager {
    jobs: RwLock<HashMap<Uuid, Arc<JobEntry>>>,
}

impl JobManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a job in `pending` state and returns its id plus the handle
    /// the caller uses to spawn and drive the worker. The manager does not
    /// spawn the worker itself — `presenter-server` owns the task spawn so
    /// it can wire in tracing spans consistently with the rest of the
    /// router.
    pub fn start(&self) -> (Uuid, JobHandle) {
        let id = Uuid::new_v4();
        let (tx, _rx) = broadcast::channel(BROADCAST_CAPACITY);
        let entry = Arc::new(JobEntry {
            id,
            created_at: Utc::now(),
            status: RwLock::new(JobStatus::Pending),
            history: RwLock::new(Vec::new()),
            next_seq: AtomicU64::new(0),
            tx,
            file_path: RwLock::new(None),
            file_name: RwLock::new(None),
            error_message: RwLock::new(None),
        });
        self.jobs.write().insert(id, entry.clone());
        (id, JobHandle { entry })
    }

    fn entry(&self, job_id: Uuid) -> AppResult<Arc<JobEntry>> {
        self.jobs.read().get(&job_id).cloned().ok_or_else(|| AppError::not_found(format!("job {job_id} not found")))
    }

    /// Replays every event already recorded for the job, then streams new
    /// events as they're published, ending after the first terminal event.
    /// Subscribing to an already-terminal job replays history and ends
    /// immediately (spec §4.5).
    pub fn subscribe(&self, job_id: Uuid) -> AppResult<impl Stream<Item = ProgressEvent> + Send + 'static> {
        let entry = self.entry(job_id)?;
        // Subscribe before snapshotting history: any event appended in the
        // gap shows up in both the snapshot and the live receiver, but the
        // sequence number lets us drop the live duplicate.
        let rx = entry.tx.subscribe();
        let history = entry.history.read().clone();
        let last_seq = history.last().map(|e| e.seq);

        let history_stream = tokio_stream::iter(history.into_iter().map(|e| e.event));
        let live_stream = BroadcastStream::new(rx).filter_map(move |result| match result {
            Ok(envelope) if Some(envelope.seq) > last_seq => Some(envelope.event),
            _ => None,
        });

        let combined = history_stream.chain(live_stream);
        Ok(TakeUntilTerminal::new(combined))
    }

    pub fn status(&self, job_id: Uuid) -> AppResult<JobSummary> {
        let entry = self.entry(job_id)?;
        Ok(JobSummary {
            id: entry.id,
            status: *entry.status.read(),
            created_at: entry.created_at,
            error_message: entry.error_message.read().clone(),
        })
    }

    /// The staged file, only when the job is `complete` (spec §4.5, 409 on
    /// download-before-complete per spec §6).
    pub fn download_path(&self, job_id: Uuid) -> AppResult<(PathBuf, String)> {
        let entry = self.entry(job_id)?;
        if *entry.status.read() != JobStatus::Complete {
            return Err(AppError::conflict("export is not complete yet"));
        }
        let path = entry.file_path.read().clone().ok_or_else(|| AppError::internal("complete job missing file path"))?;
        let name = entry.file_name.read().clone().unwrap_or_else(|| "export".to_string());
        Ok((path, name))
    }

    /// Removes jobs (and their staged files) older than [`JOB_GC_AGE`].
    /// Non-terminal jobs are never collected even if old — they're still
    /// in flight.
    pub fn gc(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0usize;
        let mut jobs = self.jobs.write();
        jobs.retain(|_, entry| {
            let status = *entry.status.read();
            let terminal = matches!(status, JobStatus::Complete | JobStatus::Error);
            let age = now.signed_duration_since(entry.created_at);
            let expired = terminal && age > chrono::Duration::from_std(JOB_GC_AGE).unwrap();
            if expired {
                if let Some(path) = entry.file_path.read().clone() {
                    let _ = std::fs::remove_file(path);
                }
                removed += 1;
            }
            !expired
        });
        removed
    }
}

/// Wraps a stream so it ends right after the first terminal
/// [`ProgressEvent`], matching spec §3 invariant b: "every subscriber
/// eventually receives either a done or an error event and then the
/// stream closes."
struct TakeUntilTerminal<S> {
    inner: S,
    done: bool,
}

impl<S> TakeUntilTerminal<S> {
    fn new(inner: S) -> Self {
        Self { inner, done: false }
    }
}

impl<S: Stream<Item = ProgressEvent> + Unpin> Stream for TakeUntilTerminal<S> {
    type Item = ProgressEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        if self.done {
            return std::task::Poll::Ready(None);
        }
        match std::pin::Pin::new(&mut self.inner).poll_next(cx) {
            std::task::Poll::Ready(Some(event)) => {
                if event.is_terminal() {
                    self.done = true;
                }
                std::task::Poll::Ready(Some(event))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt as _;

    #[tokio::test]
    async fn late_subscriber_gets_full_history_then_terminal_event() {
        let manager = JobManager::new();
        let (id, handle) = manager.start();
        handle.publish(ProgressEvent::LibrarySearch { library: "Worship".to_string() });
        handle.publish(ProgressEvent::PlaylistStart { total_items: 3 });
        handle.finish_complete(PathBuf::from("/tmp/out.pptx"), "out.pptx".to_string(), "/api/export/x/download".to_string());

        let events: Vec<_> = manager.subscribe(id).unwrap().collect().await;
        assert_eq!(events.len(), 3);
        assert!(matches!(events.last().unwrap(), ProgressEvent::Done { .. }));
    }

    #[tokio::test]
    async fn download_path_is_conflict_before_completion() {
        let manager = JobManager::new();
        let (id, _handle) = manager.start();
        assert!(matches!(manager.download_path(id), Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn events_after_terminal_are_dropped() {
        let manager = JobManager::new();
        let (id, handle) = manager.start();
        handle.finish_error("no lyrics found");
        handle.publish(ProgressEvent::Info { message: "late".to_string() });

        let events: Vec<_> = manager.subscribe(id).unwrap().collect().await;
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn gc_only_removes_terminal_jobs_past_the_age_threshold() {
        let manager = JobManager::new();
        let (id, handle) = manager.start();
        handle.finish_complete(PathBuf::from("/tmp/x.pptx"), "x.pptx".to_string(), "/x".to_string());
        manager.jobs.write().get_mut(&id).unwrap();
        assert_eq!(manager.gc(), 0);
    }
}
