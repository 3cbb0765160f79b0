//! Browser resolution
//!
//! Turns a channel preference list into a concrete executable to launch:
//! an explicit path wins outright, then installed Chrome canary/stable
//! builds are probed (with Edge as the alternate vendor), and finally a
//! managed chromium revision is downloaded on demand.

pub mod download;
pub mod probe;

pub use download::{DownloadProgress, RevisionSource, SnapshotFetcher, DEFAULT_REVISION};
pub use probe::{ExecutableProbe, ProbeChannel, SystemProbe};

use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A managed channel the resolver can try, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// Installed Chrome canary build (or Edge fallback)
    Canary,
    /// Installed Chrome stable build (or Edge fallback)
    Stable,
    /// Managed chromium at the default pinned revision
    Chromium,
    /// Managed chromium at a caller-pinned revision (`r<digits>` token)
    Revision(String),
}

/// How the resolved executable was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserKind {
    /// Explicit path supplied by the user
    User,
    /// Probed canary install
    Canary,
    /// Probed stable install
    Stable,
    /// Managed chromium revision
    Revision(String),
}

/// A runnable browser executable plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBrowser {
    /// Path to the executable
    pub executable: PathBuf,
    /// Where it came from
    pub kind: BrowserKind,
}

/// Expand preference tokens into the channels to try, in fixed priority
/// order: canary > stable > chromium > pinned revisions. The wildcard `*`
/// stands for every managed channel; unknown tokens are ignored.
pub fn plan(tokens: &[String]) -> Vec<Channel> {
    let wildcard = tokens.iter().any(|t| t == "*");
    let has = |name: &str| tokens.iter().any(|t| t == name);

    let mut channels = Vec::new();
    if wildcard || has("canary") {
        channels.push(Channel::Canary);
    }
    if wildcard || has("stable") {
        channels.push(Channel::Stable);
    }
    if wildcard || has("chromium") {
        channels.push(Channel::Chromium);
    }
    for token in tokens {
        if let Some(revision) = token.strip_prefix('r') {
            if !revision.is_empty() && revision.chars().all(|c| c.is_ascii_digit()) {
                channels.push(Channel::Revision(revision.to_string()));
            }
        }
    }
    channels
}

/// Resolve a browser executable from the preference list.
///
/// The only failure mode is `None`: probing that finds nothing and
/// download errors both degrade to trying the next planned channel, and
/// the caller decides whether an empty result is fatal.
pub async fn resolve(
    explicit: Option<&Path>,
    tokens: &[String],
    probe: &impl ExecutableProbe,
    source: &impl RevisionSource,
) -> Option<ResolvedBrowser> {
    if let Some(path) = explicit {
        info!(path = %path.display(), "using user-supplied browser executable");
        return Some(ResolvedBrowser {
            executable: path.to_path_buf(),
            kind: BrowserKind::User,
        });
    }

    for channel in plan(tokens) {
        match channel {
            Channel::Canary => {
                if let Some(executable) = probe.locate(ProbeChannel::Canary) {
                    info!(path = %executable.display(), "found canary browser");
                    return Some(ResolvedBrowser {
                        executable,
                        kind: BrowserKind::Canary,
                    });
                }
            }
            Channel::Stable => {
                if let Some(executable) = probe.locate(ProbeChannel::Stable) {
                    info!(path = %executable.display(), "found stable browser");
                    return Some(ResolvedBrowser {
                        executable,
                        kind: BrowserKind::Stable,
                    });
                }
            }
            Channel::Chromium => {
                if let Some(resolved) = fetch_revision(source, DEFAULT_REVISION).await {
                    return Some(resolved);
                }
            }
            Channel::Revision(revision) => {
                if let Some(resolved) = fetch_revision(source, &revision).await {
                    return Some(resolved);
                }
            }
        }
    }

    debug!(?tokens, "no channel produced a browser");
    None
}

/// Ensure a managed revision is present, logging download progress as it
/// streams in. Errors are logged and collapse to `None` for this channel.
async fn fetch_revision(source: &impl RevisionSource, revision: &str) -> Option<ResolvedBrowser> {
    let (tx, mut rx) = mpsc::channel::<DownloadProgress>(32);
    let rev = revision.to_string();
    let logger = tokio::spawn(async move {
        let mut last_decile = 0u64;
        while let Some(progress) = rx.recv().await {
            // fraction() is 0 while the total is unknown, so nothing logs.
            let decile = (progress.fraction() * 10.0) as u64;
            if decile > last_decile {
                last_decile = decile;
                info!(
                    "downloading chromium r{}... {}MB/{}MB",
                    rev,
                    progress.bytes_done / (1024 * 1024),
                    progress.bytes_total / (1024 * 1024),
                );
            }
        }
    });

    let outcome = source.ensure(revision, tx).await;
    let _ = logger.await;

    match outcome {
        Ok(executable) => {
            info!(path = %executable.display(), revision, "managed chromium ready");
            Some(ResolvedBrowser {
                executable,
                kind: BrowserKind::Revision(revision.to_string()),
            })
        }
        Err(err) => {
            warn!(revision, error = %err, "managed chromium unavailable");
            None
        }
    }
}
