//! Chapter capture module
//!
//! Everything between an authenticated page and a directory of numbered
//! page images: chapter metadata decoding, spread ranking, the capture
//! session itself, and the on-disk output layout.

pub mod metadata;
pub mod output;
pub mod session;
pub mod spread;

pub use metadata::ChapterInfo;
pub use session::CaptureSession;
pub use spread::CanvasSnapshot;
