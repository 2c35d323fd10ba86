//! Application state shared across every handler, built once in `main` and
//! cloned (cheaply, via `Arc`) into the router.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use presenter_core::auth::{AuthSecrets, OAuthModule, SessionManager};
use presenter_core::client::PresenterClient;
use presenter_core::config::EnvConfig;
use presenter_core::deck::{DeckBuilder, LyricsExtractor};
use presenter_core::jobs::JobManager;
use presenter_core::logger::FileLogger;
use presenter_core::stores::Stores;
use presenter_core::viewer::ViewerService;

pub const APP_ID: &str = "presenter-proxy";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvConfig>,
    pub data_dir: PathBuf,
    pub stores: Stores,
    pub client: Arc<PresenterClient>,
    pub logger: Arc<FileLogger>,
    pub secrets: Arc<AuthSecrets>,
    pub sessions: Arc<SessionManager>,
    pub oauth: Arc<OAuthModule>,
    pub jobs: Arc<JobManager>,
    pub viewer: ViewerService,
    pub extractor: Arc<dyn LyricsExtractor>,
    pub deck_builder: Arc<dyn DeckBuilder>,
    pub export_staging_dir: PathBuf,
    /// Signing/encryption key for the private session cookie, derived once
    /// from the persisted session secret (spec §4.2).
    pub cookie_key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

impl AppState {
    pub fn new(
        config: EnvConfig,
        data_dir: PathBuf,
        stores: Stores,
        secrets: AuthSecrets,
        extractor: Arc<dyn LyricsExtractor>,
        deck_builder: Arc<dyn DeckBuilder>,
    ) -> std::io::Result<Self> {
        let client = Arc::new(PresenterClient::new(&config.presenter_host, config.presenter_port));
        let logger = Arc::new(FileLogger::open(&data_dir, config.log_retention_days));
        let secrets = Arc::new(secrets);
        let sessions = Arc::new(SessionManager::new(stores.sessions.clone(), stores.users.clone(), secrets.clone()));
        let oauth = Arc::new(OAuthModule::new(
            config.oauth_client_id.clone(),
            config.oauth_client_secret.clone(),
            &config.public_base_url(),
        ));
        let export_staging_dir = data_dir.join("uploads").join("exports");
        std::fs::create_dir_all(&export_staging_dir)?;
        let cookie_key = Key::from(&secrets.session_secret);

        Ok(Self {
            config: Arc::new(config),
            data_dir,
            stores,
            client,
            logger,
            secrets,
            sessions,
            oauth,
            jobs: JobManager::new(),
            viewer: ViewerService::new(),
            extractor,
            deck_builder,
            export_staging_dir,
            cookie_key,
        })
    }
}
