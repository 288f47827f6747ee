//! Browser capability the extractor runs against.
//!
//! [`PageFetcher`] plays the role of a shared browsing context: it is created
//! once per process and opens a fresh [`ProfilePage`] for every extraction.
//! The real implementation drives Chromium ([`crate::chromium`]); tests use the
//! scripted fake in `crate::fake`.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScraperError;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Opens a new page scoped to this browsing context.
    async fn open_page(&self) -> Result<Box<dyn ProfilePage>, ScraperError>;
}

/// One browser page. Selector arguments are CSS selectors.
#[async_trait]
pub trait ProfilePage: Send + Sync {
    /// Navigates to `url` and waits until the page has settled.
    async fn goto(&self, url: &str) -> Result<(), ScraperError>;

    /// Waits until at least one element matches `selector`.
    ///
    /// Fails with [`ScraperError::SelectorTimeout`] after `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), ScraperError>;

    /// Rendered text of the first element matching `selector`.
    async fn inner_text(&self, selector: &str) -> Result<String, ScraperError>;

    /// Rendered text of every element matching `selector`, in document order.
    async fn inner_texts(&self, selector: &str) -> Result<Vec<String>, ScraperError>;

    /// Attribute `name` of the first element matching `selector`.
    async fn attribute(&self, selector: &str, name: &str) -> Result<String, ScraperError>;

    async fn close(self: Box<Self>) -> Result<(), ScraperError>;
}
