//! Chapter metadata
//!
//! The viewer URL carries everything needed to name the output: the book
//! id as a path segment, and the chapter id inside the opaque `p5` query
//! parameter (base64-encoded JSON).

use crate::error::{CaptureError, NavigationError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Deserializer};
use url::Url;

/// Chapter metadata decoded from the `p5` token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChapterInfo {
    /// Chapter identifier used in the output directory name
    #[serde(rename = "chapterId", deserialize_with = "string_or_number")]
    pub chapter_id: String,
}

/// The site has emitted the chapter id both as a JSON string and as a
/// bare number; accept either.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "chapterId must be a string or number, got {other}"
        ))),
    }
}

/// Book id is the fourth path segment of the viewer URL
/// (`/title/{a}/{b}/{book_id}/pv`).
pub fn book_id(viewer_url: &str) -> Result<String> {
    let url = parse(viewer_url)?;
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.nth(3))
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| CaptureError::BookId(viewer_url.to_string()))?;
    Ok(segment.to_string())
}

/// Info page holding the book's display title.
pub fn title_page_url(book_id: &str) -> String {
    format!("https://comic.k-manga.jp/title/{book_id}/pv")
}

/// Decode `ChapterInfo` from the `p5` query parameter of a viewer URL.
pub fn decode_chapter_token(viewer_url: &str) -> Result<ChapterInfo> {
    let url = parse(viewer_url)?;
    let token = url
        .query_pairs()
        .find(|(key, _)| key == "p5")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| CaptureError::ChapterToken("missing p5 query parameter".to_string()))?;
    let raw = BASE64
        .decode(token.as_bytes())
        .map_err(|e| CaptureError::ChapterToken(format!("invalid base64: {e}")))?;
    let info: ChapterInfo = serde_json::from_slice(&raw)
        .map_err(|e| CaptureError::ChapterToken(format!("invalid JSON payload: {e}")))?;
    Ok(info)
}

fn parse(viewer_url: &str) -> Result<Url> {
    Url::parse(viewer_url)
        .map_err(|e| NavigationError::InvalidUrl(format!("{viewer_url}: {e}")).into())
}
