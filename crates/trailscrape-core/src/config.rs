use crate::app_config::{AppConfig, RefreshSchedule};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing is decoupled from the real environment so it can be tested with a
/// plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u16 = |var: &str, default: &str| -> Result<u16, ConfigError> {
        or_default(var, default)
            .parse::<u16>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_flag = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_bool(&or_default(var, default)).ok_or_else(|| {
            invalid(
                var,
                "expected one of true/false, 1/0, yes/no, on/off".to_string(),
            )
        })
    };

    let host = or_default("TRAILSCRAPE_HOST", "0.0.0.0");
    let port = parse_u16("PORT", "8888")?;
    let bind_addr = format!("{host}:{port}")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("TRAILSCRAPE_HOST", e.to_string()))?;

    let log_level = or_default("TRAILSCRAPE_LOG_LEVEL", "info");
    let store_path = PathBuf::from(or_default("TRAILSCRAPE_STORE_PATH", "store.json"));
    let store_wipe_before_extract = parse_flag("TRAILSCRAPE_STORE_WIPE_BEFORE_EXTRACT", "false")?;

    let profile_base_url = or_default(
        "TRAILSCRAPE_PROFILE_BASE_URL",
        "https://trailblazer.me/id",
    )
    .trim_end_matches('/')
    .to_string();
    if !profile_base_url.starts_with("http://") && !profile_base_url.starts_with("https://") {
        return Err(invalid(
            "TRAILSCRAPE_PROFILE_BASE_URL",
            format!("\"{profile_base_url}\" is not an http(s) URL"),
        ));
    }

    let navigation_timeout_secs = parse_u64("TRAILSCRAPE_NAVIGATION_TIMEOUT_SECS", "30")?;
    let selector_timeout_secs = parse_u64("TRAILSCRAPE_SELECTOR_TIMEOUT_SECS", "30")?;
    let optional_selector_timeout_secs =
        parse_u64("TRAILSCRAPE_OPTIONAL_SELECTOR_TIMEOUT_SECS", "5")?;
    let headless = parse_flag("TRAILSCRAPE_HEADLESS", "true")?;
    let chrome_path = optional("TRAILSCRAPE_CHROME_PATH").map(PathBuf::from);

    let request_timeout_secs = parse_u64("TRAILSCRAPE_REQUEST_TIMEOUT_SECS", "120")?;
    let max_concurrent_requests = parse_usize("TRAILSCRAPE_MAX_CONCURRENT_REQUESTS", "10")?;
    if max_concurrent_requests == 0 {
        return Err(invalid(
            "TRAILSCRAPE_MAX_CONCURRENT_REQUESTS",
            "must be at least 1".to_string(),
        ));
    }

    let codespace_repo = optional("TRAILSCRAPE_CODESPACE_REPO");
    let gh_bin = or_default("TRAILSCRAPE_GH_BIN", "gh");

    let refresh_schedule = match (
        optional("TRAILSCRAPE_REFRESH_CRON"),
        optional("TRAILSCRAPE_REFRESH_IDS"),
    ) {
        (None, None) => None,
        (Some(cron), Some(raw_ids)) => {
            let ids = split_ids(&raw_ids);
            if ids.is_empty() {
                return Err(invalid(
                    "TRAILSCRAPE_REFRESH_IDS",
                    "no identifiers after splitting on commas".to_string(),
                ));
            }
            Some(RefreshSchedule { cron, ids })
        }
        (Some(_), None) => {
            return Err(ConfigError::MissingEnvVar(
                "TRAILSCRAPE_REFRESH_IDS".to_string(),
            ))
        }
        (None, Some(_)) => {
            return Err(ConfigError::MissingEnvVar(
                "TRAILSCRAPE_REFRESH_CRON".to_string(),
            ))
        }
    };

    Ok(AppConfig {
        bind_addr,
        log_level,
        store_path,
        store_wipe_before_extract,
        profile_base_url,
        navigation_timeout_secs,
        selector_timeout_secs,
        optional_selector_timeout_secs,
        headless,
        chrome_path,
        request_timeout_secs,
        max_concurrent_requests,
        codespace_repo,
        gh_bin,
        refresh_schedule,
    })
}

/// Parse a boolean flag. Accepts the usual spellings, case-insensitively.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
