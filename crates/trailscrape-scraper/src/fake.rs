//! Scripted in-memory [`PageFetcher`] for tests.
//!
//! Each profile URL maps to a [`FakePage`] describing which selectors exist
//! and what they contain. Every call is appended to a shared event log so
//! tests can assert ordering across pages.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::error::ScraperError;
use crate::fetcher::{PageFetcher, ProfilePage};
use crate::selectors::ProfileSelectors;

/// One element on a scripted page.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub text: String,
    pub attributes: HashMap<String, String>,
}

impl FakeElement {
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            attributes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_owned(), value.to_owned());
        self
    }
}

/// A scripted page: selector to matching elements.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub elements: HashMap<String, Vec<FakeElement>>,
    /// Panic inside `goto`, simulating an abnormal extraction.
    pub panic_on_goto: bool,
}

impl FakePage {
    #[must_use]
    pub fn with(mut self, selector: &str, elements: Vec<FakeElement>) -> Self {
        self.elements.insert(selector.to_owned(), elements);
        self
    }

    #[must_use]
    pub fn without(mut self, selector: &str) -> Self {
        self.elements.remove(selector);
        self
    }

    /// A fully populated profile page for the default selectors.
    #[must_use]
    pub fn profile(name: &str, counts: [&str; 3]) -> Self {
        let selectors = ProfileSelectors::default();
        Self::default()
            .with(&selectors.heading, vec![FakeElement::text(name)])
            .with(
                &selectors.tally_counts,
                counts.iter().map(|c| FakeElement::text(c)).collect(),
            )
            .with(
                &selectors.level_image,
                vec![FakeElement::default()
                    .with_attribute("alt", "Ranger")
                    .with_attribute("src", "https://example.com/ranger.png")],
            )
            .with(
                &selectors.certifications[0],
                vec![FakeElement::text("3 Certifications")],
            )
            .with(
                &selectors.superbadges[0],
                vec![FakeElement::text("2 Superbadges")],
            )
    }
}

/// Calls observed by the fake, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    Open,
    Goto(String),
    Close(String),
}

#[derive(Debug, Default)]
pub struct FakeFetcher {
    pages: HashMap<String, FakePage>,
    events: Arc<Mutex<Vec<FetchEvent>>>,
    hold: Option<Arc<Semaphore>>,
    fail_open: bool,
}

impl FakeFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `page` when `url` is visited. Unknown URLs load as blank pages.
    #[must_use]
    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_owned(), page);
        self
    }

    /// Makes every `goto` wait for a permit from `hold` first. The permit is
    /// returned once the navigation completes.
    #[must_use]
    pub fn with_hold(mut self, hold: Arc<Semaphore>) -> Self {
        self.hold = Some(hold);
        self
    }

    /// Makes `open_page` fail.
    #[must_use]
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Snapshot of the calls seen so far.
    ///
    /// # Panics
    ///
    /// Panics if a previous holder of the log panicked.
    #[must_use]
    pub fn events(&self) -> Vec<FetchEvent> {
        self.events.lock().expect("fake event log poisoned").clone()
    }

    fn record(events: &Mutex<Vec<FetchEvent>>, event: FetchEvent) {
        events.lock().expect("fake event log poisoned").push(event);
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn open_page(&self) -> Result<Box<dyn ProfilePage>, ScraperError> {
        if self.fail_open {
            return Err(ScraperError::Launch("browser is gone".to_owned()));
        }
        Self::record(&self.events, FetchEvent::Open);
        Ok(Box::new(ScriptedPage {
            pages: self.pages.clone(),
            current: Mutex::new(None),
            events: Arc::clone(&self.events),
            hold: self.hold.clone(),
        }))
    }
}

struct ScriptedPage {
    pages: HashMap<String, FakePage>,
    current: Mutex<Option<(String, FakePage)>>,
    events: Arc<Mutex<Vec<FetchEvent>>>,
    hold: Option<Arc<Semaphore>>,
}

impl ScriptedPage {
    fn elements(&self, selector: &str) -> Vec<FakeElement> {
        self.current
            .lock()
            .expect("fake page poisoned")
            .as_ref()
            .and_then(|(_, page)| page.elements.get(selector).cloned())
            .unwrap_or_default()
    }

    fn first(&self, selector: &str) -> Result<FakeElement, ScraperError> {
        self.elements(selector)
            .into_iter()
            .next()
            .ok_or_else(|| ScraperError::ElementMissing {
                selector: selector.to_owned(),
            })
    }
}

#[async_trait]
impl ProfilePage for ScriptedPage {
    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        if let Some(hold) = &self.hold {
            let _permit = hold
                .acquire()
                .await
                .map_err(|_| ScraperError::Navigation {
                    url: url.to_owned(),
                    reason: "hold closed".to_owned(),
                })?;
        }
        FakeFetcher::record(&self.events, FetchEvent::Goto(url.to_owned()));

        let page = self.pages.get(url).cloned().unwrap_or_default();
        let panic_on_goto = page.panic_on_goto;
        *self.current.lock().expect("fake page poisoned") = Some((url.to_owned(), page));
        assert!(!panic_on_goto, "scripted panic while loading {url}");
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), ScraperError> {
        if self.elements(selector).is_empty() {
            return Err(ScraperError::SelectorTimeout {
                selector: selector.to_owned(),
                timeout_ms: timeout.as_millis(),
            });
        }
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> Result<String, ScraperError> {
        Ok(self.first(selector)?.text)
    }

    async fn inner_texts(&self, selector: &str) -> Result<Vec<String>, ScraperError> {
        Ok(self
            .elements(selector)
            .into_iter()
            .map(|element| element.text)
            .collect())
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<String, ScraperError> {
        self.first(selector)?
            .attributes
            .get(name)
            .cloned()
            .ok_or_else(|| ScraperError::AttributeMissing {
                selector: selector.to_owned(),
                attribute: name.to_owned(),
            })
    }

    async fn close(self: Box<Self>) -> Result<(), ScraperError> {
        let url = self
            .current
            .lock()
            .expect("fake page poisoned")
            .as_ref()
            .map_or_else(String::new, |(url, _)| url.clone());
        FakeFetcher::record(&self.events, FetchEvent::Close(url));
        Ok(())
    }
}
