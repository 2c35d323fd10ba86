//! File-per-session directory store with a sliding TTL and a periodic
//! reaper (spec §3, §4.2).

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::model::UserIdentity;
use crate::stores::atomic::{ensure_dir_0700, write_atomic};

pub const SESSION_TTL: Duration = Duration::from_secs(6 * 60 * 60);
pub const REAPER_INTERVAL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Oauth,
    Bearer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub identity: UserIdentity,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub method: AuthMethod,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_seen_at)
            > chrono::Duration::from_std(SESSION_TTL).unwrap()
    }
}

#[derive(Debug)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn open(data_dir: &Path) -> AppResult<Self> {
        let dir = data_dir.join("sessions");
        ensure_dir_0700(&dir)?;
        let store = Self { dir };
        store.reap_expired()?;
        Ok(store)
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    pub fn create(&self, identity: UserIdentity, method: AuthMethod) -> AppResult<Session> {
        let now = Utc::now();
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            identity,
            created_at: now,
            last_seen_at: now,
            method,
        };
        self.persist(&session)?;
        Ok(session)
    }

    fn persist(&self, session: &Session) -> AppResult<()> {
        write_atomic(&self.path_for(&session.id), serde_json::to_string_pretty(session)?.as_bytes(), 0o600)
    }

    /// Loads a session by id, refreshing its `lastSeenAt` (sliding TTL).
    /// Returns `None` if the session does not exist or has expired — an
    /// expired session is deleted on read.
    pub fn touch(&self, id: &str) -> AppResult<Option<Session>> {
        let path = self.path_for(id);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(_) => return Ok(None),
        };
        let mut session: Session = match serde_json::from_slice(&bytes) {
            Ok(s) => s,
            Err(_) => {
                let _ = std::fs::remove_file(&path);
                return Ok(None);
            }
        };

        let now = Utc::now();
        if session.is_expired(now) {
            let _ = std::fs::remove_file(&path);
            return Ok(None);
        }

        session.last_seen_at = now;
        self.persist(&session)?;
        Ok(Some(session))
    }

    pub fn destroy(&self, id: &str) -> AppResult<()> {
        let path = self.path_for(id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes every session whose file is present but expired. Called on
    /// startup and every [`REAPER_INTERVAL`].
    pub fn reap_expired(&self) -> AppResult<usize> {
        let mut reaped = 0usize;
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(_) => return Ok(0),
        };
        let now = Utc::now();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(bytes) = std::fs::read(&path) else { continue };
            let parsed: Result<Session, _> = serde_json::from_slice(&bytes);
            match parsed {
                Ok(session) if session.is_expired(now) => {
                    let _ = std::fs::remove_file(&path);
                    reaped += 1;
                }
                Err(_) => {
                    let _ = std::fs::remove_file(&path);
                    reaped += 1;
                }
                Ok(_) => {}
            }
        }
        Ok(reaped)
    }

    /// Invalidates every session belonging to `email`, used when an
    /// operator removes a user from the allow-list (spec §8 scenario 6).
    pub fn destroy_all_for_email(&self, email: &str) -> AppResult<()> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(_) => return Ok(()),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(bytes) = std::fs::read(&path) else { continue };
            let Ok(session) = serde_json::from_slice::<Session>(&bytes) else { continue };
            if session.identity.email == email {
                let _ = std::fs::remove_file(&path);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: &str) -> UserIdentity {
        UserIdentity { email: email.to_string(), name: None, picture: None }
    }

    #[test]
    fn create_then_touch_round_trips_and_slides_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        let session = store.create(identity("alice@example.com"), AuthMethod::Oauth).unwrap();

        let reloaded = store.touch(&session.id).unwrap().unwrap();
        assert_eq!(reloaded.identity.email, "alice@example.com");
        assert!(reloaded.last_seen_at >= session.last_seen_at);
    }

    #[test]
    fn expired_session_is_evicted_on_touch() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        let mut session = store.create(identity("bob@example.com"), AuthMethod::Oauth).unwrap();
        session.last_seen_at = Utc::now() - chrono::Duration::hours(7);
        std::fs::write(
            dir.path().join("sessions").join(format!("{}.json", session.id)),
            serde_json::to_vec(&session).unwrap(),
        )
        .unwrap();

        assert!(store.touch(&session.id).unwrap().is_none());
    }

    #[test]
    fn destroy_all_for_email_removes_only_matching_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        let bob = store.create(identity("bob@example.com"), AuthMethod::Oauth).unwrap();
        let alice = store.create(identity("alice@example.com"), AuthMethod::Oauth).unwrap();

        store.destroy_all_for_email("bob@example.com").unwrap();

        assert!(store.touch(&bob.id).unwrap().is_none());
        assert!(store.touch(&alice.id).unwrap().is_some());
    }
}
