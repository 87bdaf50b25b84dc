//! WebDriver-backed implementation of the probe/actuation boundary.
//!
//! Owns all selectors, geometry, and timing glue for the RouterSense
//! dashboard. Everything above this module works in terms of the
//! [`PositionFeedback`]/[`GestureActuator`]/[`TableSource`]/[`IdleIndicator`]
//! seams and never sees a selector or a pixel coordinate.

use super::readout::parse_readout;
use super::{
    GestureActuator, IdleIndicator, PositionFeedback, ProbeError, ProbeResult, RawTable,
    TableSource,
};
use crate::config::AppConfig;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use fantoccini::actions::{InputSource, MouseActions, PointerAction, MOUSE_BUTTON_LEFT};
use fantoccini::{Client, ClientBuilder, Locator};
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// The hour-selecting slider thumb.
const SLIDER_CSS: &str = r#"[role="slider"][aria-label="Select hour"]"#;

/// The telemetry table.
const TABLE_CSS: &str = r#"table[role="grid"]"#;

/// Busy indicator text shown while the dashboard recomputes the table.
const BUSY_TEXT: &str = "RUNNING";

/// Wait after initial navigation before touching the page.
const NAV_SETTLE: Duration = Duration::from_secs(3);

/// Wait after clicking the device tab.
const TAB_SETTLE: Duration = Duration::from_secs(2);

/// Wait after scrolling the slider into view.
const SCROLL_SETTLE: Duration = Duration::from_millis(1500);

/// Initial settle before polling the busy indicator.
const LOAD_INITIAL_SETTLE: Duration = Duration::from_secs(2);

/// How long to poll for the busy indicator to clear.
const BUSY_CLEAR_TIMEOUT: Duration = Duration::from_secs(15);

/// Poll interval while the busy indicator is visible.
const BUSY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Fallback wait when the indicator never clears; treated as success since
/// its absence is ambiguous rather than diagnostic.
const BUSY_FALLBACK_WAIT: Duration = Duration::from_secs(8);

/// Final settle after the busy indicator clears.
const LOAD_FINAL_SETTLE: Duration = Duration::from_secs(2);

/// Duration of the pointer move onto the slider thumb.
const PRESS_MOVE_DURATION: Duration = Duration::from_millis(50);

/// Duration of the drag itself; a slow enough move that the control tracks it.
const DRAG_MOVE_DURATION: Duration = Duration::from_millis(250);

/// Result shape of the injected table-extraction script.
#[derive(Debug, Deserialize)]
struct ScrapedTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// A live dashboard session for one device.
pub struct DashboardPage {
    client: Client,
}

impl DashboardPage {
    /// Connect to a WebDriver endpoint, open the device dashboard, and
    /// navigate to the telemetry view (device tab + scroll to the slider).
    pub async fn connect(
        webdriver_url: &str,
        config: &AppConfig,
        headless: bool,
    ) -> ProbeResult<Self> {
        let mut caps = serde_json::map::Map::new();
        if headless {
            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless=new", "--window-size=1920,1080"] }),
            );
        }

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(webdriver_url)
            .await
            .map_err(|e| ProbeError::Session(format!("webdriver connect failed: {e}")))?;

        let page = Self { client };
        page.open(&config.dashboard.device_url()).await?;
        Ok(page)
    }

    /// Navigate to the device URL and bring the slider into view.
    async fn open(&self, url: &str) -> ProbeResult<()> {
        info!(url, "loading dashboard");
        self.client
            .goto(url)
            .await
            .map_err(|e| ProbeError::Session(format!("navigation failed: {e}")))?;
        sleep(NAV_SETTLE).await;

        // The hourly telemetry lives behind the device-type tab.
        let tab = self
            .client
            .find(Locator::XPath(r#"//button[contains(., "Phone")]"#))
            .await
            .map_err(|e| ProbeError::Session(format!("device tab not found: {e}")))?;
        tab.click()
            .await
            .map_err(|e| ProbeError::Session(format!("device tab click failed: {e}")))?;
        sleep(TAB_SETTLE).await;

        self.client
            .execute("window.scrollTo(0, 800); return null;", vec![])
            .await
            .map_err(|e| ProbeError::Session(format!("scroll failed: {e}")))?;
        sleep(SCROLL_SETTLE).await;

        info!("dashboard ready");
        Ok(())
    }

    /// End the WebDriver session.
    pub async fn close(self) -> ProbeResult<()> {
        self.client
            .close()
            .await
            .map_err(|e| ProbeError::Session(format!("session close failed: {e}")))
    }

    /// Bounding box of the slider track (the thumb's parent element).
    async fn track_geometry(&self) -> ProbeResult<(f64, f64, f64, f64)> {
        let value = self
            .client
            .execute(
                &format!(
                    r#"const thumb = document.querySelector('{SLIDER_CSS}');
                       if (!thumb || !thumb.parentElement) return null;
                       const box = thumb.parentElement.getBoundingClientRect();
                       return {{ x: box.x, y: box.y, width: box.width, height: box.height }};"#
                ),
                vec![],
            )
            .await
            .map_err(|e| ProbeError::Session(format!("track geometry query failed: {e}")))?;

        if value.is_null() {
            return Err(ProbeError::ActuationError(
                "slider track not present in the DOM".to_string(),
            ));
        }

        #[derive(Deserialize)]
        struct Rect {
            x: f64,
            y: f64,
            width: f64,
            height: f64,
        }
        let rect: Rect = serde_json::from_value(value)
            .map_err(|e| ProbeError::ActuationError(format!("bad track geometry: {e}")))?;
        Ok((rect.x, rect.y, rect.width, rect.height))
    }

    /// Whether the busy indicator is currently visible anywhere on the page.
    async fn busy_indicator_visible(&self) -> ProbeResult<bool> {
        let locator = format!(r#"//*[contains(text(), "{BUSY_TEXT}")]"#);
        let candidates = self
            .client
            .find_all(Locator::XPath(&locator))
            .await
            .map_err(|e| ProbeError::Session(format!("busy indicator query failed: {e}")))?;
        for element in candidates {
            // A stale element between polls just means the indicator went away.
            if matches!(element.is_displayed().await, Ok(true)) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl PositionFeedback for DashboardPage {
    async fn current_value(&self) -> ProbeResult<NaiveDateTime> {
        let thumb = self
            .client
            .find(Locator::Css(SLIDER_CSS))
            .await
            .map_err(|e| ProbeError::FeedbackUnavailable(format!("slider not found: {e}")))?;
        let value_text = thumb
            .attr("aria-valuetext")
            .await
            .map_err(|e| ProbeError::FeedbackUnavailable(format!("readout read failed: {e}")))?
            .ok_or_else(|| {
                ProbeError::FeedbackUnavailable("slider has no aria-valuetext".to_string())
            })?;
        parse_readout(&value_text)
    }
}

#[async_trait]
impl GestureActuator for DashboardPage {
    async fn drag(&self, delta_fraction: f64) -> ProbeResult<()> {
        let delta_fraction = delta_fraction.clamp(-1.0, 1.0);

        let thumb = self
            .client
            .find(Locator::Css(SLIDER_CSS))
            .await
            .map_err(|e| ProbeError::ActuationError(format!("slider thumb not found: {e}")))?;
        let (thumb_x, thumb_y, thumb_w, thumb_h) = thumb
            .rectangle()
            .await
            .map_err(|e| ProbeError::ActuationError(format!("thumb geometry failed: {e}")))?;
        let (_, track_y, track_w, track_h) = self.track_geometry().await?;

        let start_x = thumb_x + thumb_w / 2.0;
        let start_y = thumb_y + thumb_h / 2.0;
        let end_x = start_x + track_w * delta_fraction;
        let end_y = track_y + track_h / 2.0;

        debug!(
            delta_fraction,
            start_x, end_x, "dragging slider by {:+.1}px", end_x - start_x
        );

        let gesture = MouseActions::new("mouse".to_string())
            .then(PointerAction::MoveTo {
                duration: Some(PRESS_MOVE_DURATION),
                x: start_x.round() as i64,
                y: start_y.round() as i64,
            })
            .then(PointerAction::Down {
                button: MOUSE_BUTTON_LEFT,
            })
            .then(PointerAction::MoveTo {
                duration: Some(DRAG_MOVE_DURATION),
                x: end_x.round() as i64,
                y: end_y.round() as i64,
            })
            .then(PointerAction::Up {
                button: MOUSE_BUTTON_LEFT,
            });

        self.client
            .perform_actions(gesture)
            .await
            .map_err(|e| ProbeError::ActuationError(format!("drag gesture failed: {e}")))
    }
}

#[async_trait]
impl TableSource for DashboardPage {
    async fn extract_table(&self) -> ProbeResult<RawTable> {
        let value = self
            .client
            .execute(
                &format!(
                    r#"const table = document.querySelector('{TABLE_CSS}');
                       if (!table) return null;
                       const headers = Array.from(table.querySelectorAll('thead th'))
                           .map(th => th.textContent.trim());
                       const rows = Array.from(table.querySelectorAll('tbody tr'))
                           .map(tr => Array.from(tr.querySelectorAll('td'))
                               .map(td => td.textContent.trim()));
                       return {{ headers, rows }};"#
                ),
                vec![],
            )
            .await
            .map_err(|e| ProbeError::Session(format!("table extraction failed: {e}")))?;

        if value.is_null() {
            return Err(ProbeError::NoTableFound);
        }

        let scraped: ScrapedTable = serde_json::from_value(value)
            .map_err(|e| ProbeError::Session(format!("bad table extraction result: {e}")))?;
        Ok(RawTable {
            headers: scraped.headers,
            rows: scraped.rows,
        })
    }
}

#[async_trait]
impl IdleIndicator for DashboardPage {
    async fn wait_until_idle(&self) -> ProbeResult<()> {
        sleep(LOAD_INITIAL_SETTLE).await;

        let deadline = Instant::now() + BUSY_CLEAR_TIMEOUT;
        let mut saw_busy = false;
        loop {
            match self.busy_indicator_visible().await {
                Ok(false) => break,
                Ok(true) => saw_busy = true,
                // Transient query failures mid-render are not diagnostic.
                Err(e) => debug!("busy indicator poll failed: {e}"),
            }
            if Instant::now() >= deadline {
                warn!("busy indicator never cleared, falling back to fixed wait");
                sleep(BUSY_FALLBACK_WAIT).await;
                break;
            }
            sleep(BUSY_POLL_INTERVAL).await;
        }

        if saw_busy {
            debug!("busy indicator cleared");
        }
        sleep(LOAD_FINAL_SETTLE).await;
        Ok(())
    }
}
