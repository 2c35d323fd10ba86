//! Delegated interfaces the export orchestrator depends on but does not
//! implement: lyric extraction and slide-deck generation (spec §1, §9).
//! The core only defines the seams; a real deployment plugs in the
//! slide-deck generator library and song matcher described in spec §1 as
//! external collaborators.

use std::path::Path;

use crate::model::DeckStyle;

#[derive(Debug, Clone)]
pub struct LyricsBlock {
    pub group_name: String,
    pub text: String,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ExtractError(pub String);

/// Extracts structured lyrics from a fetched presentation. Implementations
/// live outside this crate (spec §1: "the slide-deck generator library...
/// the core invokes them through a small interface").
pub trait LyricsExtractor: Send + Sync {
    fn extract(&self, presentation: &crate::client::Presentation) -> Result<Vec<LyricsBlock>, ExtractError>;
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct DeckBuildError(pub String);

/// One merged lyrics block plus which presentation/song it came from, used
/// to build the final deck.
#[derive(Debug, Clone)]
pub struct LyricsSection {
    pub song_title: String,
    pub blocks: Vec<LyricsBlock>,
}

/// Generates the slide deck file. Implementations live outside this crate.
pub trait DeckBuilder: Send + Sync {
    fn build(
        &self,
        sections: &[LyricsSection],
        style: &DeckStyle,
        logo_path: Option<&Path>,
        out_path: &Path,
    ) -> Result<(), DeckBuildError>;
}
