//! Chapter capture session
//!
//! Drives the viewer UI end to end for one chapter: fetch the book title,
//! open the viewer, force it back to the first spread through its slider
//! widget, then walk the book saving every settled canvas until the page
//! count is reached.

use crate::browser::wait::{self, WaitOptions};
use crate::capture::{metadata, output, spread};
use crate::config::Config;
use crate::error::{CaptureError, Error, Result};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::Page;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

const SEL_CURRENT_PAGE: &str = "#ind-current-page";
const SEL_TOTAL_PAGES: &str = "#ind-total-pages";
const SEL_GUARD: &str = "#guard";
const SEL_INDICATOR_AREA: &str = "#indicator-area";
const SEL_BOTTOM_MENU: &str = "#bottom-menu";
const SEL_SLIDER: &str = "#slider";
const SEL_SLIDER_BTN: &str = "#slider-btn";
const SEL_SLIDER_AREA: &str = "#slider-area";
const SEL_BOOK_TITLE: &str = ".book-info--title";
const SEL_BOOK_TITLE_TEXT: &str = ".book-info--title > span";

/// Render/animation settle delay between viewer interactions.
const SETTLE: Duration = Duration::from_millis(1000);
/// Mouse-move steps for the slider drag gesture.
const DRAG_STEPS: u32 = 5;
/// Distance past the track's right edge the grip is dragged to.
const DRAG_OVERSHOOT: f64 = 20.0;
/// Consecutive spreads with no settled canvas before giving up.
const MAX_IDLE_SPREADS: u32 = 60;

/// One page session with its options, threaded explicitly through every
/// capture step.
pub struct CaptureSession {
    page: Page,
    config: Config,
    wait: WaitOptions,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct ElemRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl CaptureSession {
    /// Wrap an already-launched page.
    pub fn new(page: Page, config: Config) -> Self {
        let wait = WaitOptions::from_timeout_ms(config.wait_timeout_ms);
        Self { page, config, wait }
    }

    /// Capture one chapter into `{out}/{title}/{title}({chapter_id})/`.
    #[instrument(skip(self))]
    pub async fn capture_chapter(&self, viewer_url: &str) -> Result<()> {
        let book = metadata::book_id(viewer_url)?;
        let title = output::sanitize_title(&self.fetch_book_title(&book).await?);

        wait::goto(&self.page, viewer_url, &self.wait).await?;
        wait::wait_for_selector(&self.page, SEL_CURRENT_PAGE, &self.wait).await?;
        wait::wait_for_selector(&self.page, SEL_TOTAL_PAGES, &self.wait).await?;

        self.reset_to_first_page().await?;
        let total = self.total_pages().await?;
        wait::settle(SETTLE).await;

        // The live URL carries the p5 token even when the viewer rewrote it.
        let live_url = self
            .page
            .url()
            .await?
            .unwrap_or_else(|| viewer_url.to_string());
        let chapter = metadata::decode_chapter_token(&live_url)?;
        let label = format!("{title}({})", chapter.chapter_id);

        let dir = output::chapter_dir(&self.config.out, &title, &chapter.chapter_id);
        tokio::fs::create_dir_all(&dir).await?;
        info!(chapter = %label, total, "capturing chapter");

        let mut captured = 0usize;
        let mut idle_spreads = 0u32;
        while captured < total {
            wait::settle(SETTLE).await;
            wait::wait_for_hidden(&self.page, SEL_GUARD, &self.wait).await?;

            let images = spread::reading_order(self.visible_spread().await?);
            if images.is_empty() {
                idle_spreads += 1;
                if idle_spreads >= MAX_IDLE_SPREADS {
                    return Err(CaptureError::ViewerStalled { captured, total }.into());
                }
            } else {
                idle_spreads = 0;
            }

            for data_url in images {
                if captured == total {
                    break;
                }
                captured += 1;
                output::write_page(&dir, captured, &data_url).await?;
                info!("{} {}/{}", label, captured, total);
            }

            self.advance_spread().await?;
        }

        info!(chapter = %label, total, "chapter complete");
        Ok(())
    }

    /// Book display title from the info page. Needs its own navigation
    /// and settle delay before the text is reliable.
    async fn fetch_book_title(&self, book_id: &str) -> Result<String> {
        let url = metadata::title_page_url(book_id);
        wait::goto(&self.page, &url, &self.wait).await?;
        wait::wait_for_selector(&self.page, SEL_BOOK_TITLE, &self.wait).await?;
        wait::settle(SETTLE).await;

        let element = self.page.find_element(SEL_BOOK_TITLE_TEXT).await?;
        let title = element
            .inner_text()
            .await?
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(CaptureError::MissingTitle)?;
        debug!(%title, "book title");
        Ok(title)
    }

    /// Force the viewer back to the first spread. The viewer has no
    /// programmatic seek; only dragging its slider grip past the track's
    /// right edge gets there reliably.
    async fn reset_to_first_page(&self) -> Result<()> {
        let current = self.indicator_text(SEL_CURRENT_PAGE).await?;
        if current.trim() == "1" {
            debug!("viewer already at first page");
            return Ok(());
        }
        info!("resetting viewer to first page");

        wait::wait_for_visible(&self.page, SEL_INDICATOR_AREA, &self.wait).await?;
        self.hover(SEL_INDICATOR_AREA).await?;
        wait::wait_for_visible(&self.page, SEL_BOTTOM_MENU, &self.wait).await?;

        let track = self.element_rect(SEL_SLIDER).await?;
        self.hover(SEL_SLIDER_BTN).await?;
        wait::wait_for_predicate(
            &self.page,
            &format!("document.querySelector('{SEL_SLIDER_AREA}').style.cursor != 'default'"),
            "slider drag armed",
            &self.wait,
        )
        .await?;

        let grip = self.element_rect(SEL_SLIDER_BTN).await?;
        let (from_x, from_y) = (grip.x + grip.width / 2.0, grip.y + grip.height / 2.0);
        let (to_x, to_y) = (track.x + track.width + DRAG_OVERSHOOT, track.y);

        self.mouse_event(DispatchMouseEventType::MousePressed, from_x, from_y, true)
            .await?;
        for step in 1..=DRAG_STEPS {
            let t = f64::from(step) / f64::from(DRAG_STEPS);
            self.mouse_event(
                DispatchMouseEventType::MouseMoved,
                from_x + (to_x - from_x) * t,
                from_y + (to_y - from_y) * t,
                false,
            )
            .await?;
        }
        self.mouse_event(DispatchMouseEventType::MouseReleased, to_x, to_y, true)
            .await?;

        wait::wait_for_text(&self.page, SEL_CURRENT_PAGE, "1", &self.wait).await
    }

    /// Total page count as reported by the viewer.
    async fn total_pages(&self) -> Result<usize> {
        let text = self.indicator_text(SEL_TOTAL_PAGES).await?;
        text.trim()
            .parse::<usize>()
            .map_err(|_| {
                CaptureError::IndicatorParse {
                    selector: SEL_TOTAL_PAGES.to_string(),
                    text,
                }
                .into()
            })
    }

    /// Snapshot every page canvas currently rendered by the viewer.
    async fn visible_spread(&self) -> Result<Vec<spread::CanvasSnapshot>> {
        self.page
            .evaluate(spread::SNAPSHOT_JS)
            .await?
            .into_value()
            .map_err(|e| Error::cdp(e.to_string()))
    }

    /// One step toward the end of the book: ArrowLeft is "next" in the
    /// viewer's right-to-left layout.
    async fn advance_spread(&self) -> Result<()> {
        self.page
            .find_element("body")
            .await?
            .press_key("ArrowLeft")
            .await?;
        Ok(())
    }

    async fn indicator_text(&self, selector: &str) -> Result<String> {
        let expr = format!(
            "(() => {{ const el = document.querySelector('{selector}'); \
             return el ? el.textContent : null; }})()"
        );
        let text: Option<String> = self
            .page
            .evaluate(expr)
            .await?
            .into_value()
            .map_err(|e| Error::cdp(e.to_string()))?;
        text.ok_or_else(|| {
            CaptureError::IndicatorParse {
                selector: selector.to_string(),
                text: "<missing>".to_string(),
            }
            .into()
        })
    }

    async fn element_rect(&self, selector: &str) -> Result<ElemRect> {
        let expr = format!(
            "(() => {{ const el = document.querySelector('{selector}'); \
             if (el === null) return null; \
             const r = el.getBoundingClientRect(); \
             return {{ x: r.x, y: r.y, width: r.width, height: r.height }}; }})()"
        );
        let rect: Option<ElemRect> = self
            .page
            .evaluate(expr)
            .await?
            .into_value()
            .map_err(|e| Error::cdp(e.to_string()))?;
        rect.ok_or_else(|| CaptureError::ElementGeometry(selector.to_string()).into())
    }

    async fn hover(&self, selector: &str) -> Result<()> {
        let rect = self.element_rect(selector).await?;
        self.mouse_event(
            DispatchMouseEventType::MouseMoved,
            rect.x + rect.width / 2.0,
            rect.y + rect.height / 2.0,
            false,
        )
        .await
    }

    async fn mouse_event(
        &self,
        kind: DispatchMouseEventType,
        x: f64,
        y: f64,
        with_button: bool,
    ) -> Result<()> {
        let mut builder = DispatchMouseEventParams::builder().r#type(kind).x(x).y(y);
        if with_button {
            builder = builder.button(MouseButton::Left).click_count(1);
        }
        let params = builder.build().map_err(Error::cdp)?;
        self.page.execute(params).await?;
        Ok(())
    }
}
