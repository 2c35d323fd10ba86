//! Ties the session store, user allow-list, and bearer secret together into
//! the single authentication decision the server's auth guard needs (spec
//! §4.4). Grounded on the extractor/rejection shape of
//! `ferrex-server/src/auth/middleware.rs`, generalized from a single
//! password scheme to OAuth-session-or-bearer.

use std::sync::Arc;

use crate::auth::bearer::AuthSecrets;
use crate::error::{AppError, AppResult};
use crate::model::UserIdentity;
use crate::stores::session_store::{AuthMethod, Session};
use crate::stores::{SessionStore, UserStore};

/// Outcome of a successful authentication check, carried forward to
/// handlers that need to know who is asking.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity: UserIdentity,
    pub is_admin: bool,
    pub method: AuthMethod,
}

#[derive(Debug, Clone)]
pub struct SessionManager {
    sessions: Arc<SessionStore>,
    users: Arc<UserStore>,
    secrets: Arc<AuthSecrets>,
}

impl SessionManager {
    pub fn new(sessions: Arc<SessionStore>, users: Arc<UserStore>, secrets: Arc<AuthSecrets>) -> Self {
        Self { sessions, users, secrets }
    }

    /// Completes login after a successful OAuth exchange: verifies the
    /// email is allow-listed, records the login, and opens a session.
    /// Rejects with `Forbidden` rather than `Unauthenticated` — the user
    /// authenticated successfully with the provider, they're just not
    /// allowed into this deployment (spec §4.4, §8 scenario 2).
    pub fn complete_oauth_login(&self, identity: UserIdentity) -> AppResult<Session> {
        if !self.users.is_allowed(&identity.email) {
            return Err(AppError::forbidden(format!("{} is not on the allow-list", identity.email)));
        }
        self.users.record_login(&identity)?;
        self.sessions.create(identity, AuthMethod::Oauth)
    }

    /// Validates a session cookie value, returning the refreshed context.
    pub fn authenticate_cookie(&self, session_id: &str) -> AppResult<AuthContext> {
        let session = self
            .sessions
            .touch(session_id)?
            .ok_or_else(|| AppError::unauthenticated("session expired or unknown"))?;

        if !self.users.is_allowed(&session.identity.email) {
            self.sessions.destroy(&session.id)?;
            return Err(AppError::forbidden("no longer on the allow-list"));
        }

        Ok(AuthContext {
            is_admin: self.users.is_admin(&session.identity.email),
            method: session.method,
            identity: session.identity,
        })
    }

    /// Validates a bearer token against the process-wide secret (spec
    /// §4.4: "equivalent to an OAuth session for every authenticated
    /// route"). Bearer requests are treated as the deployment operator and
    /// always admin.
    pub fn authenticate_bearer(&self, token: &str) -> AppResult<AuthContext> {
        if !self.secrets.bearer_matches(token) {
            return Err(AppError::unauthenticated("invalid bearer token"));
        }
        Ok(AuthContext {
            identity: UserIdentity { email: "bearer".to_string(), name: None, picture: None },
            is_admin: true,
            method: AuthMethod::Bearer,
        })
    }

    pub fn logout(&self, session_id: &str) -> AppResult<()> {
        self.sessions.destroy(session_id)
    }

    /// Removes an allow-listed user and invalidates every session of
    /// theirs, so a revoked user's existing cookie stops working
    /// immediately rather than at its next sliding-TTL check (spec §8
    /// scenario 6).
    pub fn revoke_user(&self, email: &str) -> AppResult<()> {
        self.users.remove(email)?;
        self.sessions.destroy_all_for_email(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(dir: &std::path::Path) -> SessionManager {
        let sessions = Arc::new(SessionStore::open(dir).unwrap());
        let users = Arc::new(UserStore::open(dir).unwrap());
        let secrets = Arc::new(AuthSecrets::load_or_create(dir).unwrap());
        SessionManager::new(sessions, users, secrets)
    }

    fn identity(email: &str) -> UserIdentity {
        UserIdentity { email: email.to_string(), name: None, picture: None }
    }

    #[test]
    fn oauth_login_for_unlisted_email_is_forbidden_not_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        let err = manager.complete_oauth_login(identity("stranger@example.com")).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn allow_listed_email_can_log_in_and_be_authenticated_back() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        manager.users.add("alice@example.com").unwrap();

        let session = manager.complete_oauth_login(identity("alice@example.com")).unwrap();
        let ctx = manager.authenticate_cookie(&session.id).unwrap();
        assert_eq!(ctx.identity.email, "alice@example.com");
        assert!(!ctx.is_admin);
    }

    #[test]
    fn revoking_a_user_kills_their_live_session() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        manager.users.add("bob@example.com").unwrap();
        let session = manager.complete_oauth_login(identity("bob@example.com")).unwrap();

        manager.revoke_user("bob@example.com").unwrap();

        assert!(manager.authenticate_cookie(&session.id).is_err());
    }

    #[test]
    fn bearer_auth_is_always_admin() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        let token = manager.secrets.bearer_token.clone();
        let ctx = manager.authenticate_bearer(&token).unwrap();
        assert!(ctx.is_admin);
        assert!(manager.authenticate_bearer("wrong").is_err());
    }
}
