//! [`PageFetcher`] backed by a headless Chromium over the DevTools protocol.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::ScraperError;
use crate::fetcher::{PageFetcher, ProfilePage};

/// Interval between selector probes while waiting.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub navigation_timeout: Duration,
}

impl BrowserOptions {
    #[must_use]
    pub fn from_app_config(config: &trailscrape_core::AppConfig) -> Self {
        Self {
            headless: config.headless,
            chrome_path: config.chrome_path.clone(),
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
        }
    }
}

/// One browser process shared by every extraction for the process lifetime.
pub struct ChromiumFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl ChromiumFetcher {
    /// Launches the browser and starts driving its event stream.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Launch`] if the configuration is rejected, or
    /// [`ScraperError::Browser`] if the process cannot be started.
    pub async fn launch(options: &BrowserOptions) -> Result<Self, ScraperError> {
        let mut builder = BrowserConfig::builder().request_timeout(options.navigation_timeout);
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(ScraperError::Launch)?;

        let (browser, mut events) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    tracing::warn!(error = %e, "browser event stream error");
                }
            }
            tracing::debug!("browser event stream closed");
        });

        tracing::info!(headless = options.headless, "browser launched");
        Ok(Self {
            browser,
            handler,
            navigation_timeout: options.navigation_timeout,
        })
    }

    /// Closes the browser process and stops the event task.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "browser did not close cleanly");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
    }

    /// Shuts the browser down if `fetcher` is the last handle to it.
    ///
    /// A batch task may still hold a handle; the browser process is then
    /// killed when that handle drops.
    pub async fn shutdown_shared(fetcher: Arc<Self>) {
        match Arc::try_unwrap(fetcher) {
            Ok(fetcher) => fetcher.shutdown().await,
            Err(_) => tracing::debug!("browser still in use; leaving it to drop"),
        }
    }
}

#[async_trait]
impl PageFetcher for ChromiumFetcher {
    async fn open_page(&self) -> Result<Box<dyn ProfilePage>, ScraperError> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(Box::new(ChromiumPage {
            page,
            navigation_timeout: self.navigation_timeout,
        }))
    }
}

struct ChromiumPage {
    page: Page,
    navigation_timeout: Duration,
}

#[async_trait]
impl ProfilePage for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        let navigation = async {
            self.page.goto(url).await?;
            // Wait for the client-side app to settle after the initial load.
            self.page.wait_for_navigation().await?;
            Ok::<(), ScraperError>(())
        };

        match tokio::time::timeout(self.navigation_timeout, navigation).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ScraperError::Navigation {
                url: url.to_owned(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ScraperError::Navigation {
                url: url.to_owned(),
                reason: format!(
                    "timed out after {}s",
                    self.navigation_timeout.as_secs()
                ),
            }),
        }
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), ScraperError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ScraperError::SelectorTimeout {
                    selector: selector.to_owned(),
                    timeout_ms: timeout.as_millis(),
                });
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn inner_text(&self, selector: &str) -> Result<String, ScraperError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| ScraperError::ElementMissing {
                selector: selector.to_owned(),
            })?;
        Ok(element.inner_text().await?.unwrap_or_default())
    }

    async fn inner_texts(&self, selector: &str) -> Result<Vec<String>, ScraperError> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|_| ScraperError::ElementMissing {
                selector: selector.to_owned(),
            })?;

        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            texts.push(element.inner_text().await?.unwrap_or_default());
        }
        Ok(texts)
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<String, ScraperError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| ScraperError::ElementMissing {
                selector: selector.to_owned(),
            })?;
        element
            .attribute(name)
            .await?
            .ok_or_else(|| ScraperError::AttributeMissing {
                selector: selector.to_owned(),
                attribute: name.to_owned(),
            })
    }

    async fn close(self: Box<Self>) -> Result<(), ScraperError> {
        self.page.close().await?;
        Ok(())
    }
}
