//! Browser control module
//!
//! Launching the resolved browser through ChromiumOxide (CDP), plus the
//! page-level plumbing every navigation shares: bounded waits, request
//! interception, and stealth script injection.

pub mod controller;
pub mod intercept;
pub mod stealth;
pub mod wait;

pub use controller::BrowserController;
pub use wait::WaitOptions;
