//! Default implementations of the delegated interfaces spec §1 and §9
//! describe as external collaborators (the slide-deck generator library and
//! the song/lyric matcher). The core defines the seam
//! (`presenter_core::deck`); this crate must supply *something* so the
//! router can be built, but does not own the lyric-matching or deck-layout
//! algorithms. A real deployment swaps these for the actual libraries.

use std::path::Path;

use presenter_core::client::Presentation;
use presenter_core::deck::{DeckBuildError, DeckBuilder, ExtractError, LyricsBlock, LyricsExtractor, LyricsSection};
use presenter_core::model::DeckStyle;

/// Treats every slide's text as one lyrics block, keyed by its group name.
/// No song-structure heuristics (verse/chorus detection, "special service"
/// routing) — those stay in the delegated matcher per spec §9.
pub struct PassthroughLyricsExtractor;

impl LyricsExtractor for PassthroughLyricsExtractor {
    fn extract(&self, presentation: &Presentation) -> Result<Vec<LyricsBlock>, ExtractError> {
        if presentation.slides.is_empty() {
            return Err(ExtractError(format!("'{}' has no slides", presentation.title)));
        }
        Ok(presentation
            .slides
            .iter()
            .map(|slide| LyricsBlock { group_name: slide.group_name.clone(), text: slide.text.clone() })
            .collect())
    }
}

/// Writes a minimal, valid-enough placeholder deck file: the real
/// slide-layout engine is out of scope (spec §1, §9) and lives outside this
/// crate.
pub struct PlaintextDeckBuilder;

impl DeckBuilder for PlaintextDeckBuilder {
    fn build(
        &self,
        sections: &[LyricsSection],
        _style: &DeckStyle,
        _logo_path: Option<&Path>,
        out_path: &Path,
    ) -> Result<(), DeckBuildError> {
        let mut contents = String::new();
        for section in sections {
            contents.push_str(&format!("# {}\n", section.song_title));
            for block in &section.blocks {
                contents.push_str(&format!("[{}]\n{}\n\n", block.group_name, block.text));
            }
        }
        std::fs::write(out_path, contents).map_err(|err| DeckBuildError(err.to_string()))
    }
}
