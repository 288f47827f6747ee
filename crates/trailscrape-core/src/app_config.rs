use std::net::SocketAddr;
use std::path::PathBuf;

/// Cron schedule plus the identifiers a scheduled refresh should cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSchedule {
    pub cron: String,
    pub ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub store_path: PathBuf,
    pub store_wipe_before_extract: bool,
    pub profile_base_url: String,
    pub navigation_timeout_secs: u64,
    pub selector_timeout_secs: u64,
    pub optional_selector_timeout_secs: u64,
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
    pub codespace_repo: Option<String>,
    pub gh_bin: String,
    pub refresh_schedule: Option<RefreshSchedule>,
}
