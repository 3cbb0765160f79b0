//! Browser lifecycle management
//!
//! Launches the executable chosen by the resolver and hands out pages.
//! One browser, one page, reused for every navigation in a run.

use crate::config::Config;
use crate::error::{BrowserError, Error, Result};
use crate::resolver::ResolvedBrowser;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Viewport the viewer is driven at; matches a portrait reading window.
const VIEWPORT: (u32, u32) = (720, 800);

/// High-level browser handle: the CDP connection plus its event pump.
pub struct BrowserController {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserController {
    /// Launch the resolved executable with the run's profile directory
    /// and headless setting.
    #[instrument(skip(resolved, config))]
    pub async fn launch(resolved: &ResolvedBrowser, config: &Config) -> Result<Self> {
        info!(
            executable = %resolved.executable.display(),
            kind = ?resolved.kind,
            headless = config.headless,
            "launching browser"
        );

        let mut builder = CdpBrowserConfig::builder()
            .chrome_executable(&resolved.executable)
            .user_data_dir(&config.user_data_dir)
            .viewport(Viewport {
                width: VIEWPORT.0,
                height: VIEWPORT.1,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            });
        if !config.headless {
            builder = builder.with_head();
        }
        let cdp_config = builder.build().map_err(BrowserError::ConfigError)?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    warn!("browser handler event error");
                    break;
                }
            }
            debug!("browser handler finished");
        });

        Ok(Self {
            browser,
            handler: handler_task,
        })
    }

    /// Create a fresh page with the stealth scripts installed.
    #[instrument(skip(self))]
    pub async fn new_page(&self) -> Result<Page> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?;
        super::stealth::apply(&page).await?;
        debug!("created page");
        Ok(page)
    }

    /// Close the browser and wait briefly for the event pump to drain.
    #[instrument(skip(self))]
    pub async fn close(mut self) -> Result<()> {
        info!("closing browser");
        self.browser
            .close()
            .await
            .map_err(|e| Error::cdp(e.to_string()))?;
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handler).await;
        Ok(())
    }
}
