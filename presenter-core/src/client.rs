//! C1: HTTP client for the Presenter's local REST API (spec §4.1).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error, Clone)]
pub enum ClientError {
    #[error("presenter is unavailable")]
    Unavailable,
    #[error("presenter request timed out")]
    Timeout,
    #[error("not found")]
    NotFound,
    #[error("presenter returned an error: {0}")]
    Upstream(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub name: String,
    pub platform: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistNode {
    pub uuid: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_header: bool,
    #[serde(default)]
    pub children: Vec<PlaylistNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryPresentation {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub uuid: String,
    pub name: String,
    pub is_header: bool,
    #[serde(default)]
    pub presentation_uuid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideData {
    pub group_name: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub title: String,
    pub slides: Vec<SlideData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlideStatus {
    pub presentation_uuid: Option<String>,
    pub slide_index: i64,
    pub current_text: String,
    pub next_text: String,
}

impl SlideStatus {
    pub fn none() -> Self {
        Self { presentation_uuid: None, slide_index: -1, current_text: String::new(), next_text: String::new() }
    }
}

pub struct ThumbnailStream {
    pub content_type: String,
    pub response: reqwest::Response,
}

/// Flattens the Presenter's nested playlist tree depth-first while
/// preserving hierarchy, used by callers that need a flat list of
/// playlist ids (spec §4.1 implementation hint).
pub fn flatten_playlists(nodes: &[PlaylistNode]) -> Vec<&PlaylistNode> {
    let mut out = Vec::new();
    fn walk<'a>(nodes: &'a [PlaylistNode], out: &mut Vec<&'a PlaylistNode>) {
        for node in nodes {
            out.push(node);
            walk(&node.children, out);
        }
    }
    walk(nodes, &mut out);
    out
}

#[derive(Debug, Clone)]
pub struct PresenterClient {
    http: reqwest::Client,
    base_url: String,
}

impl PresenterClient {
    pub fn new(host: &str, port: u16) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client builds with static config");
        Self { http, base_url: format!("http://{host}:{port}") }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.http.get(self.url(path)).send().await.map_err(classify_error)?;
        self.parse_json(response).await
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(&self, response: reqwest::Response) -> ClientResult<T> {
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(ClientError::Upstream(format!("status {status}")));
        }
        response.json::<T>().await.map_err(|err| ClientError::Upstream(err.to_string()))
    }

    pub async fn version(&self) -> ClientResult<VersionInfo> {
        self.get_json("/version").await
    }

    pub async fn list_playlists(&self) -> ClientResult<Vec<PlaylistNode>> {
        self.get_json("/playlists").await
    }

    /// Library enumeration falls back gracefully: failures return an empty
    /// list rather than propagating, per spec §4.1.
    pub async fn list_libraries(&self) -> Vec<Library> {
        self.get_json("/libraries").await.unwrap_or_default()
    }

    pub async fn list_library_presentations(&self, library_uuid: &str) -> ClientResult<Vec<LibraryPresentation>> {
        self.get_json(&format!("/libraries/{library_uuid}/presentations")).await
    }

    pub async fn playlist_items(&self, playlist_uuid: &str) -> ClientResult<Vec<PlaylistItem>> {
        self.get_json(&format!("/playlists/{playlist_uuid}/items")).await
    }

    pub async fn get_presentation(&self, uuid: &str) -> ClientResult<Presentation> {
        self.get_json(&format!("/presentations/{uuid}")).await
    }

    pub async fn current_slide_status(&self) -> ClientResult<SlideStatus> {
        self.get_json("/status/slide").await
    }

    pub async fn thumbnail_stream(&self, presentation_uuid: &str, slide_index: u32) -> ClientResult<ThumbnailStream> {
        let response = self
            .http
            .get(self.url(&format!("/presentations/{presentation_uuid}/thumbnail/{slide_index}")))
            .send()
            .await
            .map_err(classify_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        if !response.status().is_success() {
            return Err(ClientError::Upstream(format!("status {}", response.status())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();

        Ok(ThumbnailStream { content_type, response })
    }
}

fn classify_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else if err.is_connect() {
        ClientError::Unavailable
    } else {
        ClientError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(uuid: &str, children: Vec<PlaylistNode>) -> PlaylistNode {
        PlaylistNode { uuid: uuid.to_string(), name: uuid.to_string(), kind: "playlist".to_string(), is_header: false, children }
    }

    #[test]
    fn flatten_playlists_is_depth_first() {
        let tree = vec![node("a", vec![node("a1", vec![]), node("a2", vec![])]), node("b", vec![])];
        let flat: Vec<_> = flatten_playlists(&tree).into_iter().map(|n| n.uuid.as_str()).collect();
        assert_eq!(flat, vec!["a", "a1", "a2", "b"]);
    }
}
