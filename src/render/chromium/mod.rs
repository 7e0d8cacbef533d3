//! `Renderer` backed by a headless Chrome driven over CDP
//!
//! Each session launches its own browser. Controls are resolved through
//! XPath inside the page and clicked with a script call, which survives
//! overlays that swallow synthetic mouse events.

pub mod browser;
pub mod executable;
pub mod timeout;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chromiumoxide::page::Page;
use std::time::Duration;
use tracing::{debug, info, warn};

use self::browser::{BrowserWrapper, launch_browser};
use self::timeout::with_page_timeout;
use super::{ActionHandle, ActionLocator, RenderSession, Renderer, SessionOptions, default_overlay_locators};

pub use executable::{download_managed_browser, find_browser_executable};

/// Per-script timeout inside an open page
const SCRIPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Launches one Chrome per session
#[derive(Debug, Clone, Default)]
pub struct ChromiumRenderer;

impl ChromiumRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn open_session(&self, options: &SessionOptions) -> Result<Box<dyn RenderSession>> {
        let wrapper = launch_browser(options).await?;
        let page = with_page_timeout(
            async {
                wrapper
                    .browser()
                    .new_page("about:blank")
                    .await
                    .context("Failed to create blank page")
            },
            options.navigation_timeout,
            "New page",
        )
        .await?;

        Ok(Box::new(ChromiumSession {
            wrapper,
            page: Some(page),
            navigation_timeout: options.navigation_timeout,
        }))
    }
}

pub struct ChromiumSession {
    wrapper: BrowserWrapper,
    page: Option<Page>,
    navigation_timeout: Duration,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page> {
        match self.page.as_ref() {
            Some(page) => Ok(page),
            None => bail!("Session already closed"),
        }
    }

    async fn evaluate_json(&self, script: String, operation_name: &str) -> Result<serde_json::Value> {
        let page = self.page()?;
        with_page_timeout(
            async {
                let result = page
                    .evaluate(script)
                    .await
                    .with_context(|| format!("{operation_name} script failed"))?;
                Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
            },
            SCRIPT_TIMEOUT,
            operation_name,
        )
        .await
    }
}

/// Script that finds the first visible, enabled match of `xpath` and runs
/// `action` on it as `el`. Evaluates to `true` when an element was found.
fn element_script(xpath: &str, action: &str) -> Result<String> {
    let xpath = serde_json::to_string(xpath)?;
    Ok(format!(
        r"(() => {{
            const r = document.evaluate({xpath}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
            for (let i = 0; i < r.snapshotLength; i++) {{
                const el = r.snapshotItem(i);
                if (el && !el.disabled && el.offsetParent !== null) {{
                    {action}
                    return true;
                }}
            }}
            return false;
        }})()"
    ))
}

/// Script returning the index of the first locator with a clickable match, or -1
fn probe_script(locators: &[ActionLocator]) -> Result<String> {
    let xpaths: Vec<String> = locators.iter().map(ActionLocator::xpath).collect();
    let xpaths = serde_json::to_string(&xpaths)?;
    Ok(format!(
        r"(() => {{
            const xpaths = {xpaths};
            for (let i = 0; i < xpaths.length; i++) {{
                const r = document.evaluate(xpaths[i], document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
                for (let j = 0; j < r.snapshotLength; j++) {{
                    const el = r.snapshotItem(j);
                    if (el && !el.disabled && el.offsetParent !== null) return i;
                }}
            }}
            return -1;
        }})()"
    ))
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let page = self.page()?;
        info!(url, "Navigating");
        with_page_timeout(
            async {
                page.goto(url).await.context("Navigation failed")?;
                page.wait_for_navigation()
                    .await
                    .context("Waiting for navigation failed")?;
                Ok(())
            },
            self.navigation_timeout,
            "Navigation",
        )
        .await
    }

    async fn current_url(&mut self) -> Result<Option<String>> {
        let page = self.page()?;
        with_page_timeout(
            async { page.url().await.context("Failed to read page URL") },
            SCRIPT_TIMEOUT,
            "Read URL",
        )
        .await
    }

    async fn current_html(&mut self) -> Result<String> {
        let page = self.page()?;
        with_page_timeout(
            async { page.content().await.context("Failed to read page content") },
            SCRIPT_TIMEOUT,
            "Read content",
        )
        .await
    }

    async fn find_clickable(&mut self, locators: &[ActionLocator]) -> Result<Option<ActionHandle>> {
        if locators.is_empty() {
            return Ok(None);
        }
        let index = self
            .evaluate_json(probe_script(locators)?, "Probe")
            .await?
            .as_i64()
            .unwrap_or(-1);

        Ok(usize::try_from(index)
            .ok()
            .and_then(|i| locators.get(i))
            .map(|locator| ActionHandle {
                locator: locator.clone(),
            }))
    }

    async fn scroll_into_view(&mut self, handle: &ActionHandle) -> Result<()> {
        let script = element_script(
            &handle.locator.xpath(),
            "el.scrollIntoView({behavior: 'instant', block: 'center'});",
        )?;
        self.evaluate_json(script, "Scroll").await?;
        Ok(())
    }

    async fn click(&mut self, handle: &ActionHandle) -> Result<()> {
        let script = element_script(&handle.locator.xpath(), "el.click();")?;
        let clicked = self.evaluate_json(script, "Click").await?;
        if clicked.as_bool() != Some(true) {
            bail!("No clickable element for {}", handle.locator);
        }
        // Nudge lazy loaders bound to scroll position
        let scroll = "window.scrollTo(0, document.body.scrollHeight);".to_string();
        if let Err(e) = self.evaluate_json(scroll, "Scroll to bottom").await {
            debug!("Scroll after click failed: {e}");
        }
        Ok(())
    }

    async fn dismiss_overlays(&mut self) -> Result<()> {
        for locator in default_overlay_locators() {
            let script = element_script(&locator.xpath(), "el.click();")?;
            if self.evaluate_json(script, "Dismiss overlay").await?.as_bool() == Some(true) {
                debug!(locator = %locator, "Overlay dismissed");
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(page) = self.page.take()
            && let Err(e) = page.close().await
        {
            warn!("Page close failed: {e}");
        }
        self.wrapper.shutdown().await
    }
}
