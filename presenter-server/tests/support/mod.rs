//! Shared test-app wiring: a throwaway data directory plus the passthrough
//! deck collaborators `presenter-server` ships by default.

use std::sync::Arc;

use presenter_core::auth::AuthSecrets;
use presenter_core::config::EnvConfig;
use presenter_core::stores::Stores;
use presenter_server::deck_stub::{PassthroughLyricsExtractor, PlaintextDeckBuilder};
use presenter_server::state::AppState;

pub fn build_state(config: EnvConfig) -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let stores = Stores::open(dir.path()).expect("stores open");
    let secrets = AuthSecrets::load_or_create(dir.path()).expect("secrets");
    let extractor = Arc::new(PassthroughLyricsExtractor);
    let deck_builder = Arc::new(PlaintextDeckBuilder);
    let state = AppState::new(config, dir.path().to_path_buf(), stores, secrets, extractor, deck_builder)
        .expect("app state");
    (state, dir)
}
