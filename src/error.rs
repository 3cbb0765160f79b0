//! Error types for kmanga-dl
//!
//! This module provides the error type hierarchy using `thiserror`
//! for proper error handling across all components.

use thiserror::Error;

/// The main error type for kmanga-dl operations
#[derive(Error, Debug)]
pub enum Error {
    /// Browser lifecycle errors
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Navigation and wait errors
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    /// Chapter capture errors
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Browser resolution errors
    #[error("Resolver error: {0}")]
    Resolve(#[from] ResolveError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ChromiumOxide errors
    #[error("CDP error: {0}")]
    Cdp(String),
}

/// Browser lifecycle and control errors
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Failed to launch browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Browser configuration error
    #[error("Invalid browser configuration: {0}")]
    ConfigError(String),

    /// Failed to create new page/tab
    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),
}

/// Navigation and bounded-wait errors
#[derive(Error, Debug)]
pub enum NavigationError {
    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A bounded wait expired
    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout {
        /// What was being waited for
        what: String,
        /// Wait budget in milliseconds
        timeout_ms: u64,
    },

    /// Page load failed
    #[error("Page load failed: {0}")]
    LoadFailed(String),
}

/// Chapter capture errors
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Viewer URL is missing the book id path segment
    #[error("Viewer URL has no book id segment: {0}")]
    BookId(String),

    /// The `p5` chapter token is missing or undecodable
    #[error("Could not decode chapter token: {0}")]
    ChapterToken(String),

    /// A page indicator element held unparseable text
    #[error("Indicator {selector} has unparseable text {text:?}")]
    IndicatorParse {
        /// Indicator selector
        selector: String,
        /// Text content found
        text: String,
    },

    /// Book title element missing or empty
    #[error("Book title element is missing or empty")]
    MissingTitle,

    /// An element needed for input simulation could not be measured
    #[error("Could not measure element {0}")]
    ElementGeometry(String),

    /// A canvas produced something other than a base64 image data URL
    #[error("Page image is not a usable data URL: {0}")]
    BadImageData(String),

    /// The viewer stopped producing new pages before the total was reached
    #[error("Viewer produced no new pages after {captured}/{total}")]
    ViewerStalled {
        /// Pages captured so far
        captured: usize,
        /// Total pages reported by the viewer
        total: usize,
    },
}

/// Browser resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No chromium snapshot exists for this platform
    #[error("Unsupported platform for managed chromium downloads")]
    UnsupportedPlatform,

    /// Snapshot download failed
    #[error("Failed to download chromium r{revision}: {reason}")]
    DownloadFailed {
        /// Requested revision
        revision: String,
        /// Underlying failure
        reason: String,
    },

    /// Snapshot archive extraction failed
    #[error("Failed to extract chromium archive: {0}")]
    ExtractFailed(String),

    /// Revision cache I/O error
    #[error("Revision cache error: {0}")]
    Cache(#[from] std::io::Error),
}

/// Result type alias for kmanga-dl operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a CDP error from a string
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }
}

/// Convert chromiumoxide errors
impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Browser(BrowserError::LaunchFailed("no chrome".to_string()));
        assert!(err.to_string().contains("Failed to launch browser"));
        assert!(err.to_string().contains("no chrome"));
    }

    #[test]
    fn test_timeout_error() {
        let err = NavigationError::Timeout {
            what: "selector #guard".to_string(),
            timeout_ms: 120_000,
        };
        assert!(err.to_string().contains("120000ms"));
        assert!(err.to_string().contains("#guard"));
    }

    #[test]
    fn test_capture_error() {
        let err = CaptureError::IndicatorParse {
            selector: "#ind-total-pages".to_string(),
            text: "n/a".to_string(),
        };
        assert!(err.to_string().contains("#ind-total-pages"));
        assert!(err.to_string().contains("n/a"));
    }

    #[test]
    fn test_resolve_error() {
        let err = ResolveError::DownloadFailed {
            revision: "1002410".to_string(),
            reason: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("r1002410"));
        assert!(err.to_string().contains("connection reset"));
    }
}
