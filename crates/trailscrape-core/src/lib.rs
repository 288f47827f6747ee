pub mod app_config;
pub mod config;
pub mod fragment;
pub mod profile;

pub use app_config::{AppConfig, RefreshSchedule};
pub use config::{load_app_config, load_app_config_from_env};
pub use fragment::render_fragment;
pub use profile::{ExtractionStatus, ProfileRecord, StoredProfile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
