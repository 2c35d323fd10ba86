//! Process-wide bearer token + session-signing secret, generated once and
//! persisted with `0600` permissions (spec §3, §4.4, §6).

use std::path::{Path, PathBuf};

use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::stores::atomic::write_atomic;

const SESSION_SECRET_LEN: usize = 64;

#[derive(Debug, Serialize, Deserialize)]
struct AuthSecretsFile {
    bearer_token: String,
    /// Base64-encoded signing key for session cookies.
    session_secret: String,
}

#[derive(Debug, Clone)]
pub struct AuthSecrets {
    pub bearer_token: String,
    pub session_secret: Vec<u8>,
}

impl AuthSecrets {
    /// Loads `auth.json` if present, otherwise generates a fresh bearer
    /// token (UUID v4) and session secret and writes them with `0600`,
    /// per spec §3: "Generated once on first start... Never rotated
    /// automatically."
    pub fn load_or_create(data_dir: &Path) -> AppResult<Self> {
        let path = Self::path(data_dir);
        if let Ok(bytes) = std::fs::read(&path)
            && let Ok(file) = serde_json::from_slice::<AuthSecretsFile>(&bytes)
            && let Ok(secret) = base64::engine::general_purpose::STANDARD.decode(&file.session_secret)
        {
            return Ok(Self { bearer_token: file.bearer_token, session_secret: secret });
        }

        let bearer_token = uuid::Uuid::new_v4().to_string();
        let mut secret = vec![0u8; SESSION_SECRET_LEN];
        rand::rng().fill_bytes(&mut secret);

        let file = AuthSecretsFile {
            bearer_token: bearer_token.clone(),
            session_secret: base64::engine::general_purpose::STANDARD.encode(&secret),
        };
        write_atomic(&path, serde_json::to_string_pretty(&file)?.as_bytes(), 0o600)?;

        Ok(Self { bearer_token, session_secret: secret })
    }

    fn path(data_dir: &Path) -> PathBuf {
        data_dir.join("auth.json")
    }

    /// Constant-time comparison so the check does not leak the token's
    /// length or contents through timing (spec §4.4).
    pub fn bearer_matches(&self, candidate: &str) -> bool {
        constant_time_eq::constant_time_eq(self.bearer_token.as_bytes(), candidate.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_and_persists_secrets_on_first_start() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = AuthSecrets::load_or_create(dir.path()).unwrap();
        assert_eq!(secrets.session_secret.len(), SESSION_SECRET_LEN);

        let reloaded = AuthSecrets::load_or_create(dir.path()).unwrap();
        assert_eq!(reloaded.bearer_token, secrets.bearer_token);
        assert_eq!(reloaded.session_secret, secrets.session_secret);
    }

    #[cfg(unix)]
    #[test]
    fn auth_file_is_written_with_0600() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        AuthSecrets::load_or_create(dir.path()).unwrap();
        let meta = std::fs::metadata(dir.path().join("auth.json")).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn bearer_matches_rejects_wrong_token() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = AuthSecrets::load_or_create(dir.path()).unwrap();
        assert!(secrets.bearer_matches(&secrets.bearer_token));
        assert!(!secrets.bearer_matches("wrong-token"));
    }
}
