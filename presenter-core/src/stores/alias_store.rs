//! Normalized-title → `{uuid, name}` mapping (spec §3, §4.2).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::AppResult;
use crate::model::{AliasEntry, normalize_title};
use crate::stores::atomic::{read_json_or_default, write_atomic};

#[derive(Debug)]
pub struct AliasStore {
    path: PathBuf,
    cache: RwLock<HashMap<String, AliasEntry>>,
}

impl AliasStore {
    pub fn open(data_dir: &Path) -> AppResult<Self> {
        let path = data_dir.join("aliases.json");
        let cache = read_json_or_default(&path, HashMap::new);
        Ok(Self { path, cache: RwLock::new(cache) })
    }

    pub fn load(&self) -> HashMap<String, AliasEntry> {
        self.cache.read().clone()
    }

    fn persist(&self, map: &HashMap<String, AliasEntry>) -> AppResult<()> {
        write_atomic(&self.path, serde_json::to_string_pretty(map)?.as_bytes(), 0o644)
    }

    /// The normalized key is the primary key; re-adding the same raw title
    /// overwrites the prior entry (spec §3 invariant, §8 property 5).
    pub fn set(&self, raw_title: &str, entry: AliasEntry) -> AppResult<String> {
        let key = normalize_title(raw_title);
        let mut guard = self.cache.write();
        guard.insert(key.clone(), entry);
        let snapshot = guard.clone();
        drop(guard);
        self.persist(&snapshot)?;
        Ok(key)
    }

    pub fn remove(&self, raw_title: &str) -> AppResult<bool> {
        let key = normalize_title(raw_title);
        let mut guard = self.cache.write();
        let existed = guard.remove(&key).is_some();
        let snapshot = guard.clone();
        drop(guard);
        self.persist(&snapshot)?;
        Ok(existed)
    }

    /// Projection consumed by the (delegated) song matcher: normalized
    /// title → presentation uuid, per spec §4.2.
    pub fn to_matcher_mappings(&self) -> HashMap<String, String> {
        self.cache
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.presentation_uuid.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_the_same_title_twice_keeps_a_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = AliasStore::open(dir.path()).unwrap();

        store
            .set("Amazing Grace!!", AliasEntry { presentation_uuid: "u1".into(), display_name: "Amazing Grace".into() })
            .unwrap();
        store
            .set("  amazing   grace", AliasEntry { presentation_uuid: "u2".into(), display_name: "Amazing Grace (new)".into() })
            .unwrap();

        let all = store.load();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get("amazing grace").unwrap().presentation_uuid, "u2");
    }

    #[test]
    fn remove_reports_whether_an_entry_existed() {
        let dir = tempfile::tempdir().unwrap();
        let store = AliasStore::open(dir.path()).unwrap();
        assert!(!store.remove("Nonexistent").unwrap());

        store
            .set("Holy Ground", AliasEntry { presentation_uuid: "u1".into(), display_name: "Holy Ground".into() })
            .unwrap();
        assert!(store.remove("holy ground").unwrap());
    }
}
