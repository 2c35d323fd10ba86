//! Shared write-to-temp-then-rename primitive used by every file-backed
//! store (spec §4.2). Every store is safe under concurrent readers; writers
//! serialize per file via [`FILE_LOCKS`].

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::error::{AppError, AppResult};

/// One lock per absolute path, handed out lazily. Guarantees writers to the
/// same file never interleave, without serializing unrelated stores.
static FILE_LOCKS: Lazy<DashMap<std::path::PathBuf, Arc<Mutex<()>>>> = Lazy::new(DashMap::new);

fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    FILE_LOCKS
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// Ensures `dir` exists with `0700` permissions (spec §4.2). A no-op on
/// non-unix targets beyond creating the directory.
pub fn ensure_dir_0700(dir: &Path) -> AppResult<()> {
    std::fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}

/// Writes `contents` to `path` atomically: write to a sibling temp file,
/// `fsync`, then rename over the destination. `mode` sets the final file's
/// unix permission bits (0o644 for regular stores, 0o600 for secrets).
pub fn write_atomic(path: &Path, contents: &[u8], mode: u32) -> AppResult<()> {
    let guard = lock_for(path);
    let _held = guard.lock();

    let dir = path.parent().ok_or_else(|| AppError::internal("store path has no parent"))?;
    ensure_dir_0700(dir).or_else(|_| {
        // Some store directories intentionally use the default (e.g. the
        // top-level app dir itself can be 0700, but session files live
        // under a subdirectory which inherits permissions); tolerate a
        // directory that already exists with different permissions.
        std::fs::create_dir_all(dir).map_err(AppError::from)
    })?;

    let tmp_name = format!(
        ".{}.tmp-{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("store"),
        uuid::Uuid::new_v4()
    );
    let tmp_path = dir.join(tmp_name);

    {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(mode))?;
    }

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Reads and parses `path` as JSON, returning `default()` if the file is
/// missing or malformed — reads tolerate corruption (spec §4.2).
pub fn read_json_or_default<T: serde::de::DeserializeOwned>(
    path: &Path,
    default: impl FnOnce() -> T,
) -> T {
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "malformed store file, using default");
            default()
        }),
        Err(_) => default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn atomic_write_never_leaves_a_partial_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("store.json");

        write_atomic(&path, br#"{"a":1}"#, 0o644).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed["a"], 1);

        // No leftover temp files after a successful write.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn read_json_or_default_tolerates_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"not json").unwrap();

        let value: serde_json::Value = read_json_or_default(&path, || serde_json::json!({"default": true}));
        assert_eq!(value["default"], true);
    }

    #[test]
    fn read_json_or_default_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let value: serde_json::Value = read_json_or_default(&path, || serde_json::json!({"default": true}));
        assert_eq!(value["default"], true);
    }
}
