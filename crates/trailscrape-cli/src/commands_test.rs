use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use trailscrape_core::{ProfileRecord, StoredProfile};
use trailscrape_scraper::fake::{FakeFetcher, FakePage};
use trailscrape_scraper::ProfileSelectors;

use super::*;

const BASE: &str = "https://trailblazer.test/id";

async fn store() -> (TempDir, Arc<ProfileStore>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ProfileStore::open(dir.path().join("store.json"))
        .await
        .expect("open store");
    (dir, Arc::new(store))
}

fn output(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).expect("utf-8 output")
}

#[tokio::test]
async fn stream_batch_copies_progress_and_counts_degraded() {
    let (_dir, store) = store().await;
    let fetcher = FakeFetcher::new()
        .with_page(&format!("{BASE}/a"), FakePage::profile("A", ["1", "2", "3"]));
    let settings = ExtractSettings {
        profile_base_url: BASE.to_string(),
        selectors: ProfileSelectors::default(),
        selector_timeout: Duration::from_millis(10),
        optional_selector_timeout: Duration::from_millis(10),
        wipe_store_before_extract: false,
    };
    let extractor = Arc::new(ProfileExtractor::new(
        Arc::new(fetcher),
        Arc::clone(&store),
        settings,
    ));
    let orchestrator = RefreshOrchestrator::new(extractor);

    let mut out = Vec::new();
    let degraded = stream_batch(
        &orchestrator,
        vec!["a".to_string(), "ghost".to_string()],
        &mut out,
    )
    .await
    .expect("batch runs");

    assert_eq!(degraded, 1);
    assert!(!orchestrator.is_busy());
    let text = output(out);
    assert!(text.contains("Scraping a ✅\n"), "got: {text}");
    assert!(text.contains("Scraping ghost ❌ failed\n"), "got: {text}");
    assert_eq!(store.ids().await, vec!["a".to_string(), "ghost".to_string()]);
}

#[tokio::test]
async fn refresh_rejects_empty_id_list_before_launching() {
    let config = trailscrape_core::AppConfig {
        bind_addr: "127.0.0.1:0".parse().expect("addr"),
        log_level: "info".to_string(),
        store_path: "unused.json".into(),
        store_wipe_before_extract: false,
        profile_base_url: BASE.to_string(),
        navigation_timeout_secs: 1,
        selector_timeout_secs: 1,
        optional_selector_timeout_secs: 1,
        headless: true,
        chrome_path: Some("/nonexistent/chrome".into()),
        request_timeout_secs: 1,
        max_concurrent_requests: 1,
        codespace_repo: None,
        gh_bin: "gh".to_string(),
        refresh_schedule: None,
    };
    let mut out = Vec::new();
    let err = run_refresh(&config, " , ", &mut out)
        .await
        .expect_err("empty list must fail");
    assert!(err.to_string().contains("no ids given"));
    assert!(out.is_empty());
}

#[tokio::test]
async fn show_prints_fragment_or_nothing() {
    let (_dir, store) = store().await;
    store
        .put(
            "jdoe",
            StoredProfile::from_extraction(
                ProfileRecord {
                    name: Some("Jane".to_string()),
                    ..ProfileRecord::default()
                },
                None,
            ),
        )
        .await
        .expect("seed");

    let mut out = Vec::new();
    write_fragment(&store, "jdoe", &mut out).await.expect("show");
    let text = output(out);
    assert!(text.starts_with("<result><div class='result name'>Jane</div>"));
    assert!(text.ends_with("</result>\n"));

    let mut out = Vec::new();
    write_fragment(&store, "ghost", &mut out).await.expect("show");
    assert!(out.is_empty());
}

#[tokio::test]
async fn list_prints_status_and_error_per_id() {
    let (_dir, store) = store().await;
    store
        .put("b", StoredProfile::from_extraction(ProfileRecord::default(), Some("boom".to_string())))
        .await
        .expect("seed b");
    store
        .put(
            "a",
            StoredProfile::from_extraction(
                ProfileRecord {
                    name: Some("A".to_string()),
                    ..ProfileRecord::default()
                },
                None,
            ),
        )
        .await
        .expect("seed a");

    let mut out = Vec::new();
    write_listing(&store, &mut out).await.expect("list");
    let text = output(out);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("a\tcomplete\t"), "got: {}", lines[0]);
    assert!(lines[1].starts_with("b\tfailed\t"), "got: {}", lines[1]);
    assert!(lines[1].ends_with("\tboom"));
}
