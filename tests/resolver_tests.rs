//! Resolver tests
//!
//! Channel-priority behavior exercised against fake probe and revision
//! sources; no real browser installs or network access involved.

use kmanga_dl::error::ResolveError;
use kmanga_dl::resolver::{
    resolve, BrowserKind, DownloadProgress, ExecutableProbe, ProbeChannel, RevisionSource,
    DEFAULT_REVISION,
};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Default)]
struct FakeProbe {
    canary: Option<PathBuf>,
    stable: Option<PathBuf>,
}

impl ExecutableProbe for FakeProbe {
    fn locate(&self, channel: ProbeChannel) -> Option<PathBuf> {
        match channel {
            ProbeChannel::Canary => self.canary.clone(),
            ProbeChannel::Stable => self.stable.clone(),
        }
    }
}

#[derive(Default)]
struct FakeSource {
    revisions: HashMap<String, PathBuf>,
}

impl RevisionSource for FakeSource {
    async fn ensure(
        &self,
        revision: &str,
        _progress: mpsc::Sender<DownloadProgress>,
    ) -> Result<PathBuf, ResolveError> {
        self.revisions
            .get(revision)
            .cloned()
            .ok_or_else(|| ResolveError::DownloadFailed {
                revision: revision.to_string(),
                reason: "offline".to_string(),
            })
    }
}

fn probe_with_both() -> FakeProbe {
    FakeProbe {
        canary: Some(PathBuf::from("/browsers/canary")),
        stable: Some(PathBuf::from("/browsers/stable")),
    }
}

fn tokens(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

#[tokio::test]
async fn canary_wins_over_stable_when_both_installed() {
    // Token order must not matter.
    let resolved = resolve(
        None,
        &tokens(&["stable", "canary"]),
        &probe_with_both(),
        &FakeSource::default(),
    )
    .await
    .expect("resolves");
    assert_eq!(resolved.kind, BrowserKind::Canary);
    assert_eq!(resolved.executable, PathBuf::from("/browsers/canary"));
}

#[tokio::test]
async fn wildcard_matches_full_channel_list() {
    let probe = probe_with_both();
    let source = FakeSource::default();
    let from_wildcard = resolve(None, &tokens(&["*"]), &probe, &source).await;
    let from_list = resolve(
        None,
        &tokens(&["canary", "stable", "chromium"]),
        &probe,
        &source,
    )
    .await;
    assert_eq!(from_wildcard, from_list);
    assert_eq!(from_wildcard.expect("resolves").kind, BrowserKind::Canary);
}

#[tokio::test]
async fn explicit_path_beats_every_channel() {
    let resolved = resolve(
        Some(std::path::Path::new("/opt/my-chrome")),
        &tokens(&["canary", "stable", "chromium"]),
        &probe_with_both(),
        &FakeSource::default(),
    )
    .await
    .expect("resolves");
    assert_eq!(resolved.kind, BrowserKind::User);
    assert_eq!(resolved.executable, PathBuf::from("/opt/my-chrome"));
}

#[tokio::test]
async fn stable_used_when_canary_absent() {
    let probe = FakeProbe {
        canary: None,
        stable: Some(PathBuf::from("/browsers/stable")),
    };
    let resolved = resolve(
        None,
        &tokens(&["canary", "stable"]),
        &probe,
        &FakeSource::default(),
    )
    .await
    .expect("resolves");
    assert_eq!(resolved.kind, BrowserKind::Stable);
}

#[tokio::test]
async fn chromium_channel_downloads_pinned_revision() {
    let mut source = FakeSource::default();
    source.revisions.insert(
        DEFAULT_REVISION.to_string(),
        PathBuf::from("/cache/chromium/chrome"),
    );
    let resolved = resolve(None, &tokens(&["chromium"]), &FakeProbe::default(), &source)
        .await
        .expect("resolves");
    assert_eq!(resolved.kind, BrowserKind::Revision(DEFAULT_REVISION.to_string()));
}

#[tokio::test]
async fn pinned_revision_token_uses_caller_revision() {
    let mut source = FakeSource::default();
    source
        .revisions
        .insert("999".to_string(), PathBuf::from("/cache/r999/chrome"));
    let resolved = resolve(None, &tokens(&["r999"]), &FakeProbe::default(), &source)
        .await
        .expect("resolves");
    assert_eq!(resolved.kind, BrowserKind::Revision("999".to_string()));
}

#[tokio::test]
async fn download_failure_degrades_to_none() {
    let resolved = resolve(
        None,
        &tokens(&["chromium"]),
        &FakeProbe::default(),
        &FakeSource::default(),
    )
    .await;
    assert!(resolved.is_none());
}

#[tokio::test]
async fn failed_channel_falls_through_to_next() {
    // Canary requested but absent; chromium download available.
    let mut source = FakeSource::default();
    source.revisions.insert(
        DEFAULT_REVISION.to_string(),
        PathBuf::from("/cache/chromium/chrome"),
    );
    let resolved = resolve(
        None,
        &tokens(&["canary", "chromium"]),
        &FakeProbe::default(),
        &source,
    )
    .await
    .expect("resolves");
    assert_eq!(resolved.kind, BrowserKind::Revision(DEFAULT_REVISION.to_string()));
}

#[tokio::test]
async fn empty_preference_resolves_nothing() {
    let resolved = resolve(None, &[], &probe_with_both(), &FakeSource::default()).await;
    assert!(resolved.is_none());
}
