//! Single-file settings store (spec §4.2).

use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::AppResult;
use crate::model::{Settings, SettingsPatch};
use crate::stores::atomic::{read_json_or_default, write_atomic};

#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    cache: RwLock<Settings>,
}

impl SettingsStore {
    pub fn open(data_dir: &Path) -> AppResult<Self> {
        let path = data_dir.join("settings.json");
        let cache = read_json_or_default(&path, Settings::default);
        Ok(Self { path, cache: RwLock::new(cache) })
    }

    pub fn load(&self) -> Settings {
        self.cache.read().clone()
    }

    /// Merges `patch` over the current settings and persists the union.
    pub fn save(&self, patch: SettingsPatch) -> AppResult<Settings> {
        let mut guard = self.cache.write();
        guard.apply_patch(patch);
        let snapshot = guard.clone();
        write_atomic(&self.path, serde_json::to_string_pretty(&snapshot)?.as_bytes(), 0o644)?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_merges_partial_update_over_current_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(dir.path()).unwrap();
        assert_eq!(store.load().presenter_port, 50000);

        let mut patch = SettingsPatch::default();
        patch.include_titles = Some(true);
        store.save(patch).unwrap();

        let settings = store.load();
        assert!(settings.include_titles);
        assert_eq!(settings.presenter_port, 50000, "untouched field must survive the merge");
    }

    #[test]
    fn reopening_reads_the_persisted_file() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SettingsStore::open(dir.path()).unwrap();
            let mut patch = SettingsPatch::default();
            patch.last_playlist_id = Some("P1".to_string());
            store.save(patch).unwrap();
        }
        let reopened = SettingsStore::open(dir.path()).unwrap();
        assert_eq!(reopened.load().last_playlist_id.as_deref(), Some("P1"));
    }
}
