//! Allow-list + admin set + last-login cache (spec §3, §4.2).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::model::{UserIdentity, UserRecord, canonicalize_email};
use crate::stores::atomic::{read_json_or_default, write_atomic};

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
struct UsersFile {
    #[serde(default)]
    users: HashMap<String, UserRecord>,
    #[serde(default)]
    admins: Vec<String>,
}

#[derive(Debug)]
pub struct UserStore {
    path: PathBuf,
    cache: RwLock<UsersFile>,
}

impl UserStore {
    pub fn open(data_dir: &Path) -> AppResult<Self> {
        let path = data_dir.join("users.json");
        let cache = read_json_or_default(&path, UsersFile::default);
        Ok(Self { path, cache: RwLock::new(cache) })
    }

    fn persist(&self, file: &UsersFile) -> AppResult<()> {
        write_atomic(&self.path, serde_json::to_string_pretty(file)?.as_bytes(), 0o644)
    }

    pub fn list_all(&self) -> Vec<UserRecord> {
        let guard = self.cache.read();
        let mut users: Vec<_> = guard.users.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        users
    }

    pub fn count(&self) -> usize {
        self.cache.read().users.len()
    }

    pub fn is_allowed(&self, email: &str) -> bool {
        let key = canonicalize_email(email);
        self.cache.read().users.contains_key(&key)
    }

    pub fn is_admin(&self, email: &str) -> bool {
        let key = canonicalize_email(email);
        self.cache.read().admins.iter().any(|e| e == &key)
    }

    /// Idempotent: adding an email already on the allow-list is a no-op.
    pub fn add(&self, email: &str) -> AppResult<()> {
        let key = canonicalize_email(email);
        let mut guard = self.cache.write();
        guard.users.entry(key).or_insert_with(|| UserRecord::new(email));
        let snapshot = guard.clone();
        drop(guard);
        self.persist(&snapshot)
    }

    /// Removes the email from both the allow-list and the admin set
    /// (invariant: admins ⊆ allow-list, spec §3).
    pub fn remove(&self, email: &str) -> AppResult<()> {
        let key = canonicalize_email(email);
        let mut guard = self.cache.write();
        guard.users.remove(&key);
        guard.admins.retain(|e| e != &key);
        let snapshot = guard.clone();
        drop(guard);
        self.persist(&snapshot)
    }

    pub fn set_admin(&self, email: &str, admin: bool) -> AppResult<()> {
        let key = canonicalize_email(email);
        let mut guard = self.cache.write();
        if !guard.users.contains_key(&key) {
            return Err(crate::error::AppError::not_found(format!("user {key} is not allow-listed")));
        }
        if admin {
            if !guard.admins.iter().any(|e| e == &key) {
                guard.admins.push(key);
            }
        } else {
            guard.admins.retain(|e| e != &key);
        }
        let snapshot = guard.clone();
        drop(guard);
        self.persist(&snapshot)
    }

    /// Updates `lastLogin` and caches the display identity (spec §4.2).
    pub fn record_login(&self, identity: &UserIdentity) -> AppResult<()> {
        let key = canonicalize_email(&identity.email);
        let mut guard = self.cache.write();
        let record = guard.users.entry(key.clone()).or_insert_with(|| UserRecord::new(&key));
        record.name = identity.name.clone();
        record.picture = identity.picture.clone();
        record.last_login = Some(chrono::Utc::now());
        let snapshot = guard.clone();
        drop(guard);
        self.persist(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_an_email_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::open(dir.path()).unwrap();
        store.add("Alice@Example.com").unwrap();
        store.add("alice@example.com").unwrap();
        assert_eq!(store.count(), 1);
        assert!(store.is_allowed("ALICE@EXAMPLE.COM"));
    }

    #[test]
    fn removing_an_admin_clears_both_sets() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::open(dir.path()).unwrap();
        store.add("bob@example.com").unwrap();
        store.set_admin("bob@example.com", true).unwrap();
        assert!(store.is_admin("bob@example.com"));

        store.remove("bob@example.com").unwrap();
        assert!(!store.is_allowed("bob@example.com"));
        assert!(!store.is_admin("bob@example.com"));
    }

    #[test]
    fn set_admin_on_unknown_email_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::open(dir.path()).unwrap();
        assert!(store.set_admin("ghost@example.com", true).is_err());
    }

    #[test]
    fn record_login_updates_cached_identity() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::open(dir.path()).unwrap();
        store.add("carol@example.com").unwrap();
        store
            .record_login(&UserIdentity {
                email: "carol@example.com".to_string(),
                name: Some("Carol".to_string()),
                picture: None,
            })
            .unwrap();
        let record = store.list_all().into_iter().find(|u| u.email == "carol@example.com").unwrap();
        assert_eq!(record.name.as_deref(), Some("Carol"));
        assert!(record.last_login.is_some());
    }
}
