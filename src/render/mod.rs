//! Render collaborator: a scriptable browser session
//!
//! The rendered-session strategy only needs to navigate, read the current
//! document and click things. Clickable controls are addressed by locator,
//! never by a live element handle, so a control re-rendered between lookup
//! and click is simply looked up again.

pub mod chromium;
pub mod load_more;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::utils::constants::{DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_TABLE_WAIT_SECS};

pub use chromium::ChromiumRenderer;
pub use load_more::{IncrementalLoadController, LoadMoreConfig, LoadOutcome, LoadState};

/// How to find a clickable control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionLocator {
    /// `tag` element whose text contains `text`
    Text { tag: String, text: String },
    /// `tag` element whose class attribute contains `fragment`
    Class { tag: String, fragment: String },
    /// Raw XPath expression
    XPath(String),
}

impl ActionLocator {
    #[must_use]
    pub fn text(tag: &str, text: &str) -> Self {
        Self::Text {
            tag: tag.to_string(),
            text: text.to_string(),
        }
    }

    #[must_use]
    pub fn class(tag: &str, fragment: &str) -> Self {
        Self::Class {
            tag: tag.to_string(),
            fragment: fragment.to_string(),
        }
    }

    /// XPath equivalent, usable with `document.evaluate`
    #[must_use]
    pub fn xpath(&self) -> String {
        match self {
            Self::Text { tag, text } => format!("//{tag}[contains(text(), '{text}')]"),
            Self::Class { tag, fragment } => format!("//{tag}[contains(@class, '{fragment}')]"),
            Self::XPath(expression) => expression.clone(),
        }
    }
}

impl fmt::Display for ActionLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.xpath())
    }
}

/// "Load more" controls, tried in order
#[must_use]
pub fn default_load_more_locators() -> Vec<ActionLocator> {
    vec![
        ActionLocator::text("button", "Plus"),
        ActionLocator::class("button", "more"),
        ActionLocator::text("a", "Plus"),
        ActionLocator::class("a", "more"),
        ActionLocator::class("button", "load-more"),
        ActionLocator::class("button", "pagination"),
    ]
}

/// Close buttons and cookie banners that can intercept clicks
#[must_use]
pub fn default_overlay_locators() -> Vec<ActionLocator> {
    vec![
        ActionLocator::class("button", "close"),
        ActionLocator::XPath("//div[contains(@class, 'cookie')]//button".to_string()),
    ]
}

/// A control found by `find_clickable`, carrying the locator that matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionHandle {
    pub locator: ActionLocator,
}

/// Options for opening a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub headless: bool,
    pub user_agent: Option<String>,
    pub navigation_timeout: Duration,
    /// How long to wait for a table to show up after navigation
    pub table_wait: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: None,
            navigation_timeout: Duration::from_secs(DEFAULT_NAVIGATION_TIMEOUT_SECS),
            table_wait: Duration::from_secs(DEFAULT_TABLE_WAIT_SECS),
        }
    }
}

/// Opens rendering sessions
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn open_session(&self, options: &SessionOptions) -> Result<Box<dyn RenderSession>>;
}

/// One live page. Callers must `close` it on every exit path.
#[async_trait]
pub trait RenderSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    async fn current_html(&mut self) -> Result<String>;

    /// Address of the loaded document after redirects and client-side routing
    async fn current_url(&mut self) -> Result<Option<String>> {
        Ok(None)
    }

    /// First locator (in order) matching a visible, enabled control
    async fn find_clickable(&mut self, locators: &[ActionLocator]) -> Result<Option<ActionHandle>>;

    async fn scroll_into_view(&mut self, _handle: &ActionHandle) -> Result<()> {
        Ok(())
    }

    async fn click(&mut self, handle: &ActionHandle) -> Result<()>;

    /// Best-effort removal of overlays that intercept clicks
    async fn dismiss_overlays(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locators_render_as_xpath() {
        assert_eq!(
            ActionLocator::text("button", "Plus").xpath(),
            "//button[contains(text(), 'Plus')]"
        );
        assert_eq!(
            ActionLocator::class("a", "more").to_string(),
            "//a[contains(@class, 'more')]"
        );
    }
}
