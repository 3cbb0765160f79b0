//! Request interception
//!
//! The viewer renders pages onto canvases itself, so subresource fetches
//! for images, stylesheets, and fonts only slow navigation down. They are
//! aborted unconditionally; everything else passes through unmodified.

use crate::error::Result;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::Page;
use futures::StreamExt;
use tracing::{debug, trace};

/// Enable the Fetch domain on the page and spawn the event loop that
/// aborts heavy subresource requests. Runs until the page goes away.
pub async fn block_heavy_resources(page: &Page) -> Result<()> {
    let mut events = page.event_listener::<EventRequestPaused>().await?;
    page.execute(EnableParams::default()).await?;
    debug!("request interception enabled");

    let page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let blocked = matches!(
                event.resource_type,
                ResourceType::Image | ResourceType::Stylesheet | ResourceType::Font
            );
            let sent = if blocked {
                trace!(url = %event.request.url, "aborting subresource request");
                let params = match FailRequestParams::builder()
                    .request_id(event.request_id.clone())
                    .error_reason(ErrorReason::Aborted)
                    .build()
                {
                    Ok(params) => params,
                    Err(_) => continue,
                };
                page.execute(params).await.map(|_| ())
            } else {
                let params = match ContinueRequestParams::builder()
                    .request_id(event.request_id.clone())
                    .build()
                {
                    Ok(params) => params,
                    Err(_) => continue,
                };
                page.execute(params).await.map(|_| ())
            };
            if sent.is_err() {
                debug!("request interception channel closed");
                break;
            }
        }
    });

    Ok(())
}
