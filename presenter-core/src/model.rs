//! Persisted domain shapes shared by the stores (spec §3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeckStyle {
    #[serde(default = "DeckStyle::default_text_color")]
    pub text_color: String,
    #[serde(default = "DeckStyle::default_font_face")]
    pub font_face: String,
    #[serde(default = "DeckStyle::default_font_size")]
    pub font_size: u32,
    #[serde(default = "DeckStyle::default_title_font_size")]
    pub title_font_size: u32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl DeckStyle {
    fn default_text_color() -> String {
        "#FFFFFF".to_string()
    }
    fn default_font_face() -> String {
        "Arial".to_string()
    }
    fn default_font_size() -> u32 {
        40
    }
    fn default_title_font_size() -> u32 {
        54
    }

    /// Merges `overrides` over `self`, field-by-field, used by the export
    /// orchestrator (spec §4.6 step 5).
    pub fn merged_with(&self, overrides: &DeckStyleOverride) -> Self {
        Self {
            text_color: overrides.text_color.clone().unwrap_or_else(|| self.text_color.clone()),
            font_face: overrides.font_face.clone().unwrap_or_else(|| self.font_face.clone()),
            font_size: overrides.font_size.unwrap_or(self.font_size),
            title_font_size: overrides.title_font_size.unwrap_or(self.title_font_size),
            bold: overrides.bold.unwrap_or(self.bold),
            italic: overrides.italic.unwrap_or(self.italic),
        }
    }
}

impl Default for DeckStyle {
    fn default() -> Self {
        Self {
            text_color: Self::default_text_color(),
            font_face: Self::default_font_face(),
            font_size: Self::default_font_size(),
            title_font_size: Self::default_title_font_size(),
            bold: false,
            italic: false,
        }
    }
}

/// Sparse version of [`DeckStyle`] accepted from export payloads / `PUT
/// /api/settings`; every field is optional so a caller only overrides what
/// it cares about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckStyleOverride {
    pub text_color: Option<String>,
    pub font_face: Option<String>,
    pub font_size: Option<u32>,
    pub title_font_size: Option<u32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureFlags(#[serde(flatten)] pub serde_json::Map<String, serde_json::Value>);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub presenter_host: String,
    pub presenter_port: u16,
    #[serde(default)]
    pub library_filter: Option<String>,
    #[serde(default)]
    pub include_titles: bool,
    #[serde(default)]
    pub deck_style: DeckStyle,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default)]
    pub last_playlist_id: Option<String>,
    #[serde(default)]
    pub feature_flags: FeatureFlags,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            presenter_host: "127.0.0.1".to_string(),
            presenter_port: 50000,
            library_filter: None,
            include_titles: false,
            deck_style: DeckStyle::default(),
            logo_path: None,
            last_playlist_id: None,
            feature_flags: FeatureFlags::default(),
        }
    }
}

/// Partial update applied to [`Settings`] by `PUT /api/settings` — every
/// field optional, merged over the current value (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub presenter_host: Option<String>,
    pub presenter_port: Option<u16>,
    pub library_filter: Option<String>,
    pub include_titles: Option<bool>,
    pub deck_style: Option<DeckStyleOverride>,
    pub logo_path: Option<String>,
    pub last_playlist_id: Option<String>,
    pub feature_flags: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Settings {
    pub fn apply_patch(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.presenter_host {
            self.presenter_host = crate::config::normalize_host(&v);
        }
        if let Some(v) = patch.presenter_port {
            self.presenter_port = v;
        }
        if let Some(v) = patch.library_filter {
            self.library_filter = Some(v);
        }
        if let Some(v) = patch.include_titles {
            self.include_titles = v;
        }
        if let Some(v) = patch.deck_style {
            self.deck_style = self.deck_style.merged_with(&v);
        }
        if let Some(v) = patch.logo_path {
            self.logo_path = Some(v);
        }
        if let Some(v) = patch.last_playlist_id {
            self.last_playlist_id = Some(v);
        }
        if let Some(v) = patch.feature_flags {
            for (k, val) in v {
                self.feature_flags.0.insert(k, val);
            }
        }
    }
}

/// Canonicalizes an email the way the allow-list and session stores key on
/// it: lowercased and trimmed (spec §3).
pub fn canonicalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
}

impl UserRecord {
    pub fn new(email: &str) -> Self {
        Self {
            email: canonicalize_email(email),
            name: None,
            picture: None,
            last_login: None,
        }
    }
}

/// Identity carried by an authenticated session, independent of how the
/// session was established.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasEntry {
    pub presentation_uuid: String,
    pub display_name: String,
}

/// Normalizes a song title to the alias store's primary key: lowercase,
/// punctuation stripped, whitespace collapsed (spec §3).
pub fn normalize_title(title: &str) -> String {
    static PUNCT_OR_WS: once_cell::sync::Lazy<regex::Regex> =
        once_cell::sync::Lazy::new(|| regex::Regex::new(r"[^\p{L}\p{N}]+").unwrap());
    let collapsed = PUNCT_OR_WS.replace_all(&title.to_lowercase(), " ");
    collapsed.trim().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_title_strips_punctuation_and_collapses_whitespace() {
        assert_eq!(normalize_title("  Amazing   Grace!! "), "amazing grace");
        assert_eq!(normalize_title("How Great Thou Art (Live)"), "how great thou art live");
    }

    #[test]
    fn canonicalize_email_lowercases_and_trims() {
        assert_eq!(canonicalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn settings_patch_merges_deck_style_fields_independently() {
        let mut settings = Settings::default();
        settings.deck_style.font_size = 40;
        settings.deck_style.bold = false;

        let mut patch = SettingsPatch::default();
        patch.deck_style = Some(DeckStyleOverride {
            font_size: Some(60),
            ..Default::default()
        });
        settings.apply_patch(patch);

        assert_eq!(settings.deck_style.font_size, 60);
        assert_eq!(settings.deck_style.font_face, "Arial");
        assert!(!settings.deck_style.bold);
    }
}
