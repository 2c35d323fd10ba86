pub mod alias_store;
pub mod atomic;
pub mod session_store;
pub mod settings_store;
pub mod user_store;

pub use alias_store::AliasStore;
pub use session_store::SessionStore;
pub use settings_store::SettingsStore;
pub use user_store::UserStore;

use std::path::Path;
use std::sync::Arc;

use crate::error::AppResult;

/// Bundles the four file-backed stores so application wiring only needs to
/// open one thing.
#[derive(Debug, Clone)]
pub struct Stores {
    pub settings: Arc<SettingsStore>,
    pub users: Arc<UserStore>,
    pub aliases: Arc<AliasStore>,
    pub sessions: Arc<SessionStore>,
}

impl Stores {
    pub fn open(data_dir: &Path) -> AppResult<Self> {
        atomic::ensure_dir_0700(data_dir)?;
        Ok(Self {
            settings: Arc::new(SettingsStore::open(data_dir)?),
            users: Arc::new(UserStore::open(data_dir)?),
            aliases: Arc::new(AliasStore::open(data_dir)?),
            sessions: Arc::new(SessionStore::open(data_dir)?),
        })
    }
}
