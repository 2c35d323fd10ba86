//! C6 Export Orchestrator: walks a playlist, extracts lyrics, generates a
//! slide deck, and publishes progress through a [`JobHandle`]. Grounded on
//! the same worker-publishes-events-only discipline as
//! `ferrex-server/src/infra/scan/scan_manager.rs`'s scan workers,
//! reimplemented for the playlist-walk semantics of spec §4.6.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::client::PresenterClient;
use crate::deck::{DeckBuilder, LyricsExtractor, LyricsSection};
use crate::jobs::{JobHandle, ProgressEvent};
use crate::model::{DeckStyleOverride, SettingsPatch};
use crate::slug::slugify;
use crate::stores::SettingsStore;

#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub playlist_id: String,
    pub playlist_name: String,
    pub library_filter: Option<String>,
    pub include_titles: Option<bool>,
    pub style_overrides: Option<DeckStyleOverride>,
    pub logo_path: Option<String>,
}

/// File-extension and MIME type of the generated slide deck (spec §6).
pub const DECK_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const DECK_EXTENSION: &str = "pptx";

/// Runs one export to completion, publishing every step through `handle`.
/// Never returns an `Err` — all failure is reported as an `error` progress
/// event (spec §7: "export-specific: no-lyrics-found... surfaced as an
/// error event on the stream, not an HTTP status").
pub async fn run_export(
    handle: JobHandle,
    request: ExportRequest,
    client: Arc<PresenterClient>,
    settings: Arc<SettingsStore>,
    extractor: Arc<dyn LyricsExtractor>,
    deck_builder: Arc<dyn DeckBuilder>,
    staging_dir: PathBuf,
    download_url_prefix: &str,
) {
    let filter_set = match resolve_library_filter(&handle, &client, request.library_filter.as_deref()).await {
        Ok(set) => set,
        Err(message) => {
            handle.finish_error(message);
            return;
        }
    };

    let items = match client.playlist_items(&request.playlist_id).await {
        Ok(items) => items,
        Err(err) => {
            handle.finish_error(format!("could not fetch playlist: {err}"));
            return;
        }
    };
    handle.publish(ProgressEvent::PlaylistStart { total_items: items.len() });

    let mut sections = Vec::new();
    for item in &items {
        if item.is_header {
            handle.publish(ProgressEvent::PlaylistItemSkip { name: item.name.clone() });
            continue;
        }
        let Some(presentation_uuid) = item.presentation_uuid.as_deref() else {
            handle.publish(ProgressEvent::PlaylistItemSkip { name: item.name.clone() });
            continue;
        };
        if let Some(set) = &filter_set
            && !set.contains(presentation_uuid)
        {
            handle.publish(ProgressEvent::PlaylistItemSkip { name: item.name.clone() });
            continue;
        }

        handle.publish(ProgressEvent::PlaylistItemStart { name: item.name.clone() });
        match client.get_presentation(presentation_uuid).await {
            Ok(presentation) => match extractor.extract(&presentation) {
                Ok(blocks) => {
                    sections.push(LyricsSection { song_title: presentation.title, blocks });
                    handle.publish(ProgressEvent::PlaylistItemSuccess { name: item.name.clone() });
                }
                Err(err) => {
                    handle.publish(ProgressEvent::PlaylistItemError { name: item.name.clone(), message: err.0 });
                }
            },
            Err(err) => {
                handle.publish(ProgressEvent::PlaylistItemError { name: item.name.clone(), message: err.to_string() });
            }
        }
    }

    if sections.is_empty() {
        handle.finish_error("no lyrics were found in this playlist");
        return;
    }
    handle.publish(ProgressEvent::WalkComplete { total_songs: sections.len() });

    let current_settings = settings.load();
    let style = match &request.style_overrides {
        Some(overrides) => current_settings.deck_style.merged_with(overrides),
        None => current_settings.deck_style.clone(),
    };
    let logo_path = request.logo_path.clone().or(current_settings.logo_path.clone());

    handle.publish(ProgressEvent::PptxStart);

    let file_name = format!("{}-{}.{}", slugify(&request.playlist_name), epoch_ms_placeholder(), DECK_EXTENSION);
    let out_path = staging_dir.join(&file_name);

    let build_result = deck_builder.build(&sections, &style, logo_path.as_deref().map(Path::new), &out_path);
    match build_result {
        Ok(()) => {
            let _ = settings.save(SettingsPatch {
                library_filter: request.library_filter.clone(),
                include_titles: request.include_titles,
                deck_style: request.style_overrides.clone(),
                logo_path: logo_path.clone(),
                last_playlist_id: Some(request.playlist_id.clone()),
                ..Default::default()
            });

            let download_url = format!("{download_url_prefix}/{}/download", handle.id());
            handle.publish(ProgressEvent::PptxComplete { download_url: download_url.clone() });
            handle.finish_complete(out_path, file_name, download_url);
        }
        Err(err) => handle.finish_error(err.0),
    }
}

/// Resolves the library filter to a concrete set of eligible presentation
/// UUIDs. Returns `Ok(None)` when there's no filter or no match was found
/// (in which case a `library:not-found` event was already published and the
/// export proceeds unfiltered, per spec §4.6 step 1).
async fn resolve_library_filter(
    handle: &JobHandle,
    client: &PresenterClient,
    library_filter: Option<&str>,
) -> Result<Option<HashSet<String>>, String> {
    let Some(name) = library_filter else { return Ok(None) };

    handle.publish(ProgressEvent::LibrarySearch { library: name.to_string() });
    let libraries = client.list_libraries().await;
    let matched = libraries.into_iter().find(|lib| lib.name.eq_ignore_ascii_case(name));

    let Some(library) = matched else {
        handle.publish(ProgressEvent::LibraryNotFound { library: name.to_string() });
        return Ok(None);
    };

    match client.list_library_presentations(&library.uuid).await {
        Ok(presentations) => Ok(Some(presentations.into_iter().map(|p| p.uuid).collect())),
        Err(err) => Err(format!("could not list presentations for library '{name}': {err}")),
    }
}

/// Wall-clock timestamp baked into the exported filename (`<slug>-<epoch-ms>.<ext>`).
fn epoch_ms_placeholder() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Presentation, SlideData};
    use crate::deck::{DeckBuildError, ExtractError, LyricsBlock};
    use crate::model::DeckStyle;

    struct StubExtractor;
    impl LyricsExtractor for StubExtractor {
        fn extract(&self, presentation: &Presentation) -> Result<Vec<LyricsBlock>, ExtractError> {
            if presentation.slides.is_empty() {
                return Err(ExtractError("no slides".to_string()));
            }
            Ok(presentation
                .slides
                .iter()
                .map(|s| LyricsBlock { group_name: s.group_name.clone(), text: s.text.clone() })
                .collect())
        }
    }

    struct StubDeckBuilder;
    impl DeckBuilder for StubDeckBuilder {
        fn build(
            &self,
            _sections: &[LyricsSection],
            _style: &DeckStyle,
            _logo_path: Option<&Path>,
            out_path: &Path,
        ) -> Result<(), DeckBuildError> {
            std::fs::write(out_path, b"fake deck").map_err(|e| DeckBuildError(e.to_string()))
        }
    }

    fn sample_presentation(title: &str) -> Presentation {
        Presentation {
            title: title.to_string(),
            slides: vec![SlideData { group_name: "Verse 1".to_string(), text: "la la la".to_string() }],
        }
    }

    #[test]
    fn stub_extractor_fails_on_empty_slides() {
        let err = StubExtractor.extract(&Presentation { title: "Empty".to_string(), slides: vec![] }).unwrap_err();
        assert_eq!(err.0, "no slides");
    }

    #[test]
    fn stub_extractor_succeeds_on_populated_slides() {
        let blocks = StubExtractor.extract(&sample_presentation("Amazing Grace")).unwrap();
        assert_eq!(blocks.len(), 1);
    }
}
