//! Installed-browser probing
//!
//! Existence-based probing of the known install locations for Chrome
//! canary/stable builds, with Microsoft Edge as the alternate-vendor
//! fallback. No version checks; the first path that exists wins.

use std::path::PathBuf;
use tracing::debug;

/// Which installed channel to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeChannel {
    /// Chrome canary (SxS) build
    Canary,
    /// Chrome stable build
    Stable,
}

/// Locates installed browser executables. Abstracted so channel-priority
/// logic can be exercised without a real filesystem layout.
pub trait ExecutableProbe {
    /// Return the first existing executable for the channel, if any.
    fn locate(&self, channel: ProbeChannel) -> Option<PathBuf>;
}

/// Probe backed by the real filesystem and environment.
#[derive(Debug, Default)]
pub struct SystemProbe;

impl ExecutableProbe for SystemProbe {
    fn locate(&self, channel: ProbeChannel) -> Option<PathBuf> {
        let found = chrome_candidates(channel)
            .into_iter()
            .chain(edge_candidates())
            .find(|path| path.is_file());
        match &found {
            Some(path) => debug!(?channel, path = %path.display(), "probe hit"),
            None => debug!(?channel, "probe found nothing"),
        }
        found
    }
}

#[cfg(target_os = "windows")]
fn win_prefixes() -> Vec<PathBuf> {
    ["LOCALAPPDATA", "PROGRAMFILES", "PROGRAMFILES(X86)"]
        .iter()
        .filter_map(std::env::var_os)
        .map(PathBuf::from)
        .collect()
}

#[cfg(target_os = "windows")]
fn chrome_candidates(channel: ProbeChannel) -> Vec<PathBuf> {
    let suffix = match channel {
        ProbeChannel::Canary => r"Google\Chrome SxS\Application\chrome.exe",
        ProbeChannel::Stable => r"Google\Chrome\Application\chrome.exe",
    };
    win_prefixes()
        .into_iter()
        .map(|prefix| prefix.join(suffix))
        .collect()
}

#[cfg(target_os = "windows")]
fn edge_candidates() -> Vec<PathBuf> {
    win_prefixes()
        .into_iter()
        .map(|prefix| prefix.join(r"Microsoft\Edge\Application\msedge.exe"))
        .collect()
}

#[cfg(target_os = "macos")]
fn chrome_candidates(channel: ProbeChannel) -> Vec<PathBuf> {
    let paths: &[&str] = match channel {
        ProbeChannel::Canary => {
            &["/Applications/Google Chrome Canary.app/Contents/MacOS/Google Chrome Canary"]
        }
        ProbeChannel::Stable => &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ],
    };
    paths.iter().map(PathBuf::from).collect()
}

#[cfg(target_os = "macos")]
fn edge_candidates() -> Vec<PathBuf> {
    vec![PathBuf::from(
        "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
    )]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn chrome_candidates(channel: ProbeChannel) -> Vec<PathBuf> {
    let paths: &[&str] = match channel {
        ProbeChannel::Canary => &["/usr/bin/google-chrome-unstable"],
        ProbeChannel::Stable => &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ],
    };
    paths.iter().map(PathBuf::from).collect()
}

#[cfg(all(unix, not(target_os = "macos")))]
fn edge_candidates() -> Vec<PathBuf> {
    ["/usr/bin/microsoft-edge", "/usr/bin/microsoft-edge-stable"]
        .iter()
        .map(PathBuf::from)
        .collect()
}
