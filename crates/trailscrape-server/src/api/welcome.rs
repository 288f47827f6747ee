//! `GET /`: best-effort publication of the listening port.

use axum::extract::State;
use tokio::process::Command;

use super::AppState;

pub const WELCOME_PUBLIC: &str = "Welcome to Trailhead Scraper, the API endpoint is now public";
pub const WELCOME: &str = "Welcome to Trailhead Scraper";

/// How to make the listening port publicly visible in a hosted dev
/// environment (`gh codespace ports visibility <port>:public`).
#[derive(Debug, Clone)]
pub struct PortVisibility {
    pub gh_bin: String,
    pub repo: Option<String>,
    pub port: u16,
}

impl PortVisibility {
    #[must_use]
    pub fn from_app_config(config: &trailscrape_core::AppConfig) -> Self {
        Self {
            gh_bin: config.gh_bin.clone(),
            repo: config.codespace_repo.clone(),
            port: config.bind_addr.port(),
        }
    }

    /// Runs the visibility command and reports whether it succeeded.
    ///
    /// Never fails: a missing repository, a missing binary and a non-zero
    /// exit all yield `false`.
    pub async fn publish(&self) -> bool {
        let Some(repo) = self.repo.as_deref() else {
            tracing::debug!("no codespace repository configured; skipping port visibility");
            return false;
        };

        let result = Command::new(&self.gh_bin)
            .args(["codespace", "ports", "visibility"])
            .arg(format!("{}:public", self.port))
            .args(["--repo", repo])
            .kill_on_drop(true)
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                tracing::info!(port = self.port, repo, "port made public");
                true
            }
            Ok(output) => {
                tracing::debug!(
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "port visibility command failed"
                );
                false
            }
            Err(e) => {
                tracing::debug!(bin = %self.gh_bin, error = %e, "port visibility command not runnable");
                false
            }
        }
    }
}

pub(super) async fn welcome(State(state): State<AppState>) -> &'static str {
    if state.visibility.publish().await {
        WELCOME_PUBLIC
    } else {
        WELCOME
    }
}
