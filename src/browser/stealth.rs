//! Automation masking
//!
//! The reader refuses to serve obviously automated browsers. These
//! scripts run before any page script and mask the usual giveaways.

use crate::error::{Error, Result};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use tracing::debug;

const HIDE_WEBDRIVER: &str = r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });
"#;

const MOCK_CHROME_RUNTIME: &str = r#"
    if (!window.chrome) {
        window.chrome = {};
    }
    if (!window.chrome.runtime) {
        window.chrome.runtime = {
            connect: function() {},
            sendMessage: function() {}
        };
    }
"#;

const MOCK_LANGUAGES: &str = r#"
    Object.defineProperty(navigator, 'languages', {
        get: () => ['ja-JP', 'ja', 'en-US', 'en'],
        configurable: true
    });
"#;

/// Install the masking scripts on a fresh page.
pub async fn apply(page: &Page) -> Result<()> {
    for script in [HIDE_WEBDRIVER, MOCK_CHROME_RUNTIME, MOCK_LANGUAGES] {
        inject(page, script).await?;
    }
    debug!("stealth scripts installed");
    Ok(())
}

async fn inject(page: &Page, source: &str) -> Result<()> {
    let params = AddScriptToEvaluateOnNewDocumentParams::builder()
        .source(source)
        .build()
        .map_err(Error::cdp)?;
    page.execute(params).await?;
    Ok(())
}
