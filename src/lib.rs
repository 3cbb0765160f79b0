//! kmanga-dl — chapter downloader for comic.k-manga.jp
//!
//! Drives a headless Chromium over CDP to authenticate against the
//! reader, walk a chapter's viewer UI, and persist every rendered page
//! canvas as a numbered JPEG.
//!
//! # Architecture
//!
//! ```text
//! CLI/config ──▶ Browser Resolver ──▶ Browser Controller (CDP)
//!                (channel probing,           │
//!                 managed chromium)          ▼
//!                                     Capture Session
//!                                      │          │
//!                                      ▼          ▼
//!                                Spread ranking  Output layout
//!                                (opacity/offset) ({n}.jpg, idempotent)
//! ```
//!
//! The resolver and the capture driver are independent: the resolver runs
//! once at startup to pick an executable, the capture session runs per
//! chapter URL on a single reused page.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod browser;
pub mod capture;
pub mod config;
pub mod error;
pub mod login;
pub mod resolver;

// Re-exports for convenience
pub use browser::{BrowserController, WaitOptions};
pub use capture::CaptureSession;
pub use config::{CliOverlay, Config};
pub use error::{Error, Result};
pub use resolver::{BrowserKind, ResolvedBrowser};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
