//! Bounded wait-for-condition helpers
//!
//! The viewer signals readiness through DOM state (selector presence,
//! visibility, indicator text), so every wait here polls a predicate in
//! the page. All waits carry a timeout; a stalled page surfaces as a
//! `NavigationError::Timeout` instead of hanging the process.

use crate::error::{NavigationError, Result};
use chromiumoxide::Page;
use std::time::{Duration, Instant};
use tracing::debug;

/// Budget and cadence for one bounded wait.
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Give up after this long
    pub timeout: Duration,
    /// Re-evaluate the predicate at this interval
    pub poll: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(120_000),
            poll: Duration::from_millis(200),
        }
    }
}

impl WaitOptions {
    /// Default cadence with a caller-chosen timeout.
    pub fn from_timeout_ms(timeout_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            ..Self::default()
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

/// Navigate to `url`, bounded by the wait budget.
pub async fn goto(page: &Page, url: &str, opts: &WaitOptions) -> Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(NavigationError::InvalidUrl(url.to_string()).into());
    }
    debug!(%url, "navigating");
    tokio::time::timeout(opts.timeout, page.goto(url))
        .await
        .map_err(|_| NavigationError::Timeout {
            what: format!("navigation to {url}"),
            timeout_ms: opts.timeout_ms(),
        })?
        .map_err(|e| NavigationError::LoadFailed(e.to_string()))?;
    Ok(())
}

/// Poll a JS expression until it is truthy. Evaluation errors (e.g. a
/// navigation racing the poll) count as "not ready yet".
pub async fn wait_for_predicate(
    page: &Page,
    expr: &str,
    what: &str,
    opts: &WaitOptions,
) -> Result<()> {
    let wrapped = format!("Boolean({expr})");
    let deadline = Instant::now() + opts.timeout;
    loop {
        let ready = page
            .evaluate(wrapped.as_str())
            .await
            .ok()
            .and_then(|result| result.into_value::<bool>().ok())
            .unwrap_or(false);
        if ready {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(NavigationError::Timeout {
                what: what.to_string(),
                timeout_ms: opts.timeout_ms(),
            }
            .into());
        }
        tokio::time::sleep(opts.poll).await;
    }
}

/// Wait until an element matching `selector` exists.
pub async fn wait_for_selector(page: &Page, selector: &str, opts: &WaitOptions) -> Result<()> {
    let expr = format!("document.querySelector('{}') !== null", escape(selector));
    wait_for_predicate(page, &expr, &format!("selector {selector}"), opts).await
}

/// Wait until the element exists and is rendered visible.
pub async fn wait_for_visible(page: &Page, selector: &str, opts: &WaitOptions) -> Result<()> {
    let expr = format!(
        "(() => {{ const el = document.querySelector('{}'); if (el === null) return false; \
         const s = getComputedStyle(el); \
         return s.display !== 'none' && s.visibility !== 'hidden' && Number(s.opacity) !== 0; }})()",
        escape(selector)
    );
    wait_for_predicate(page, &expr, &format!("{selector} visible"), opts).await
}

/// Wait until the element is absent or hidden.
pub async fn wait_for_hidden(page: &Page, selector: &str, opts: &WaitOptions) -> Result<()> {
    let expr = format!(
        "(() => {{ const el = document.querySelector('{}'); if (el === null) return true; \
         const s = getComputedStyle(el); \
         return s.display === 'none' || s.visibility === 'hidden'; }})()",
        escape(selector)
    );
    wait_for_predicate(page, &expr, &format!("{selector} hidden"), opts).await
}

/// Wait until the element's trimmed text equals `expected`.
pub async fn wait_for_text(
    page: &Page,
    selector: &str,
    expected: &str,
    opts: &WaitOptions,
) -> Result<()> {
    let expr = format!(
        "(() => {{ const el = document.querySelector('{}'); \
         return el !== null && el.textContent.trim() === '{}'; }})()",
        escape(selector),
        escape(expected)
    );
    wait_for_predicate(page, &expr, &format!("{selector} text {expected:?}"), opts).await
}

/// Fixed settle delay for rendering/animation.
pub async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
}

fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wait_options_default() {
        let opts = WaitOptions::default();
        assert_eq!(opts.timeout, Duration::from_millis(120_000));
        assert_eq!(opts.poll, Duration::from_millis(200));
    }

    #[test]
    fn test_from_timeout_ms_keeps_poll_cadence() {
        let opts = WaitOptions::from_timeout_ms(5_000);
        assert_eq!(opts.timeout, Duration::from_millis(5_000));
        assert_eq!(opts.poll, WaitOptions::default().poll);
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(escape("a'b"), "a\\'b");
        assert_eq!(escape(r"a\b"), r"a\\b");
    }
}
