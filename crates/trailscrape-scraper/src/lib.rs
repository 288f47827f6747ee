pub mod chromium;
pub mod error;
pub mod extract;
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
pub mod fetcher;
pub mod normalize;
pub mod profile;
pub mod refresh;
pub mod selectors;

pub use chromium::{BrowserOptions, ChromiumFetcher};
pub use error::ScraperError;
pub use extract::{ExtractSettings, ProfileExtractor};
pub use fetcher::{PageFetcher, ProfilePage};
pub use refresh::{
    parse_ids, ProgressEvent, RefreshBusy, RefreshGate, RefreshOrchestrator, RefreshRun,
};
pub use selectors::ProfileSelectors;
