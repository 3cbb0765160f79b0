//! Output layout and image persistence
//!
//! Chapters land at `{out}/{title}/{title}({chapter_id})/{n}.jpg`. The
//! title is sanitized for the target OS, and page writes are idempotent:
//! an existing file is never overwritten, which makes rerunning the same
//! URL a cheap resume.

use crate::error::{CaptureError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

#[cfg(target_os = "windows")]
const ILLEGAL_CHARS: &[char] = &[
    '\\', '/', ':', '*', '?', '"', '<', '>', '|', '\r', '\n', '\t',
];
#[cfg(target_os = "macos")]
const ILLEGAL_CHARS: &[char] = &['/', ':', '\r', '\n', '\t'];
#[cfg(all(unix, not(target_os = "macos")))]
const ILLEGAL_CHARS: &[char] = &['/', '\r', '\n', '\t'];

/// Strip characters the target OS rejects in file names, then trailing
/// dots and whitespace.
pub fn sanitize_title(raw: &str) -> String {
    strip_illegal(raw, ILLEGAL_CHARS)
}

fn strip_illegal(raw: &str, illegal: &[char]) -> String {
    let kept: String = raw.chars().filter(|c| !illegal.contains(c)).collect();
    kept.trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .trim()
        .to_string()
}

/// Directory for one chapter: `{out}/{title}/{title}({chapter_id})`.
pub fn chapter_dir(out: &Path, title: &str, chapter_id: &str) -> PathBuf {
    out.join(title).join(format!("{title}({chapter_id})"))
}

/// Persist one page image from its data URL as `{page_no}.jpg`.
///
/// Returns `false` when the destination already exists (nothing written).
pub async fn write_page(dir: &Path, page_no: usize, data_url: &str) -> Result<bool> {
    let dest = dir.join(format!("{page_no}.jpg"));
    if tokio::fs::try_exists(&dest).await? {
        debug!(path = %dest.display(), "page already on disk, skipping");
        return Ok(false);
    }
    let payload = decode_data_url(data_url)?;
    tokio::fs::write(&dest, payload).await?;
    Ok(true)
}

fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let prefix = PREFIX.get_or_init(|| {
        Regex::new(r"^data:image/\w+;base64,").expect("data URL prefix pattern")
    });
    let matched = prefix.find(data_url).ok_or_else(|| {
        let head: String = data_url.chars().take(32).collect();
        CaptureError::BadImageData(head)
    })?;
    BASE64
        .decode(&data_url[matched.end()..])
        .map_err(|e| CaptureError::BadImageData(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const WINDOWS_ILLEGAL: &[char] = &[
        '\\', '/', ':', '*', '?', '"', '<', '>', '|', '\r', '\n', '\t',
    ];

    // base64("jpeg-bytes")
    const DATA_URL: &str = "data:image/jpeg;base64,anBlZy1ieXRlcw==";

    #[test]
    fn test_strip_illegal_removes_all_of_them() {
        let cleaned = strip_illegal("a/b:c*d?e\"f<g>h|i\\j", WINDOWS_ILLEGAL);
        assert_eq!(cleaned, "abcdefghij");
    }

    #[test]
    fn test_strip_trailing_dots_and_whitespace() {
        assert_eq!(strip_illegal("Title... ", WINDOWS_ILLEGAL), "Title");
        assert_eq!(strip_illegal("  Title .. .", WINDOWS_ILLEGAL), "Title");
    }

    #[test]
    fn test_sanitize_keeps_ordinary_titles() {
        assert_eq!(sanitize_title("Foo"), "Foo");
    }

    #[test]
    fn test_chapter_dir_layout() {
        let dir = chapter_dir(Path::new("manga"), "Foo", "5");
        assert_eq!(dir, PathBuf::from("manga/Foo/Foo(5)"));
    }

    #[tokio::test]
    async fn test_write_page_roundtrip_and_idempotence() {
        let dir = tempfile::tempdir().expect("tempdir");

        assert!(write_page(dir.path(), 1, DATA_URL).await.expect("first write"));
        let on_disk = std::fs::read(dir.path().join("1.jpg")).expect("read back");
        assert_eq!(on_disk, b"jpeg-bytes");

        // Second run with different content must not overwrite.
        let other = format!("data:image/jpeg;base64,{}", BASE64.encode("other"));
        assert!(!write_page(dir.path(), 1, &other).await.expect("second write"));
        let untouched = std::fs::read(dir.path().join("1.jpg")).expect("read back");
        assert_eq!(untouched, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_write_page_rejects_non_data_urls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = write_page(dir.path(), 1, "https://example.com/1.jpg")
            .await
            .expect_err("reject");
        assert!(err.to_string().contains("not a usable data URL"));
    }

    proptest! {
        #[test]
        fn prop_sanitized_titles_are_legal(raw in ".*") {
            let cleaned = strip_illegal(&raw, WINDOWS_ILLEGAL);
            prop_assert!(!cleaned.chars().any(|c| WINDOWS_ILLEGAL.contains(&c)));
            prop_assert!(!cleaned.ends_with('.'));
            prop_assert!(!cleaned.ends_with(char::is_whitespace));
        }
    }
}
