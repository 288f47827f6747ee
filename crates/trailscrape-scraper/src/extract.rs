//! Profile extractor: one identifier in, one stored record out.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt as _;
use trailscrape_core::{ExtractionStatus, ProfileRecord, StoredProfile};
use trailscrape_store::ProfileStore;

use crate::error::ScraperError;
use crate::fetcher::PageFetcher;
use crate::profile::{profile_url, read_profile, Waits};
use crate::selectors::ProfileSelectors;

#[derive(Debug, Clone)]
pub struct ExtractSettings {
    pub profile_base_url: String,
    pub selectors: ProfileSelectors,
    pub selector_timeout: Duration,
    pub optional_selector_timeout: Duration,
    /// Delete the whole store before each extraction.
    ///
    /// Lookups running during a refresh may then see an empty store, and ids
    /// not in the current batch are lost until they are refreshed again.
    pub wipe_store_before_extract: bool,
}

impl ExtractSettings {
    #[must_use]
    pub fn from_app_config(config: &trailscrape_core::AppConfig) -> Self {
        Self {
            profile_base_url: config.profile_base_url.clone(),
            selectors: ProfileSelectors::default(),
            selector_timeout: Duration::from_secs(config.selector_timeout_secs),
            optional_selector_timeout: Duration::from_secs(config.optional_selector_timeout_secs),
            wipe_store_before_extract: config.store_wipe_before_extract,
        }
    }
}

/// Reads profiles through a shared [`PageFetcher`] and persists the results.
pub struct ProfileExtractor {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<ProfileStore>,
    settings: ExtractSettings,
}

impl ProfileExtractor {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<ProfileStore>,
        settings: ExtractSettings,
    ) -> Self {
        Self {
            fetcher,
            store,
            settings,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ProfileStore> {
        &self.store
    }

    /// Extracts the profile for `id` and stores the result under `id`.
    ///
    /// Never fails: an extraction error degrades to a partial or empty record,
    /// which is stored all the same with the error attached. A panic while
    /// reading the page is caught and treated as an extraction error. The page
    /// is closed on every path. The returned status is the one that was stored.
    pub async fn extract(&self, id: &str) -> ExtractionStatus {
        if self.settings.wipe_store_before_extract {
            if let Err(e) = self.store.wipe().await {
                tracing::warn!(id, error = %e, "failed to wipe profile store before extraction");
            }
        }

        let mut record = ProfileRecord::default();
        let outcome = self.read_into(id, &mut record).await;
        if let Err(e) = &outcome {
            tracing::error!(id, error = %e, "profile extraction failed");
        }

        tracing::debug!(
            id,
            name = ?record.name,
            badges = ?record.badges,
            points = ?record.points,
            trails = ?record.trails,
            level_text = ?record.level_text,
            level_image = ?record.level_image,
            certifications = ?record.certifications,
            superbadges = ?record.superbadges,
            "extracted profile fields"
        );

        let stored = StoredProfile::from_extraction(record, outcome.err().map(|e| e.to_string()));
        let status = stored.status;
        if let Err(e) = self.store.put(id, stored).await {
            tracing::error!(id, error = %e, "failed to persist profile record");
        }
        status
    }

    async fn read_into(&self, id: &str, record: &mut ProfileRecord) -> Result<(), ScraperError> {
        let url = profile_url(&self.settings.profile_base_url, id)?;
        tracing::info!(id, url = %url, "scraping profile");

        let page = self.fetcher.open_page().await?;
        let waits = Waits {
            required: self.settings.selector_timeout,
            optional: self.settings.optional_selector_timeout,
        };
        let result = AssertUnwindSafe(read_profile(
            page.as_ref(),
            &url,
            &self.settings.selectors,
            waits,
            record,
        ))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(ScraperError::Panicked(panic_message(payload.as_ref()))));

        if let Err(e) = page.close().await {
            tracing::warn!(id, error = %e, "failed to close page");
        }
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_owned())
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
