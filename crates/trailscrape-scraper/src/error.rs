use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {timeout_ms}ms waiting for selector \"{selector}\"")]
    SelectorTimeout { selector: String, timeout_ms: u128 },

    #[error("no element matches selector \"{selector}\"")]
    ElementMissing { selector: String },

    #[error("element \"{selector}\" has no \"{attribute}\" attribute")]
    AttributeMissing { selector: String, attribute: String },

    #[error("expected at least {expected} tally counters, found {found}")]
    CounterCount { expected: usize, found: usize },

    #[error("extraction panicked: {0}")]
    Panicked(String),

    #[error("invalid profile identifier \"{id}\": {reason}")]
    InvalidIdentifier { id: String, reason: &'static str },
}
