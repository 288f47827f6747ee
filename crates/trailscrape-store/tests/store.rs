//! Integration tests for `ProfileStore` against real files in a temp dir.

use trailscrape_core::{ExtractionStatus, ProfileRecord, StoredProfile};
use trailscrape_store::{ProfileStore, StoreError};

fn record(name: &str) -> ProfileRecord {
    ProfileRecord {
        name: Some(name.to_string()),
        badges: Some("10".to_string()),
        points: Some("1234".to_string()),
        trails: Some("2".to_string()),
        ..ProfileRecord::default()
    }
}

#[tokio::test]
async fn never_refreshed_id_is_absent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ProfileStore::open(dir.path().join("store.json"))
        .await
        .expect("open");
    assert!(store.get("nobody").await.is_none());
    assert!(store.is_empty().await);
    assert!(
        !store.path().exists(),
        "file should not be created before the first put"
    );
}

#[tokio::test]
async fn put_persists_and_reopens() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.json");

    let store = ProfileStore::open(&path).await.expect("open");
    store
        .put("jdoe", StoredProfile::from_extraction(record("Jane"), None))
        .await
        .expect("put");
    drop(store);

    let reopened = ProfileStore::open(&path).await.expect("reopen");
    let entry = reopened.get("jdoe").await.expect("entry survives reopen");
    assert_eq!(entry.record.name.as_deref(), Some("Jane"));
    assert_eq!(entry.status, ExtractionStatus::Complete);
    assert!(
        !dir.path().join("store.json.tmp").exists(),
        "temp file should be renamed away"
    );
}

#[tokio::test]
async fn put_replaces_entry_wholesale() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ProfileStore::open(dir.path().join("store.json"))
        .await
        .expect("open");

    store
        .put("jdoe", StoredProfile::from_extraction(record("Jane"), None))
        .await
        .expect("first put");
    store
        .put(
            "jdoe",
            StoredProfile::from_extraction(ProfileRecord::default(), Some("timeout".into())),
        )
        .await
        .expect("second put");

    let entry = store.get("jdoe").await.expect("entry");
    assert!(entry.record.is_empty(), "old fields must not be merged in");
    assert_eq!(entry.status, ExtractionStatus::Failed);
}

#[tokio::test]
async fn put_for_one_id_keeps_other_ids() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ProfileStore::open(dir.path().join("store.json"))
        .await
        .expect("open");

    store
        .put("a", StoredProfile::from_extraction(record("A"), None))
        .await
        .expect("put a");
    store
        .put("b", StoredProfile::from_extraction(record("B"), None))
        .await
        .expect("put b");

    assert_eq!(store.ids().await, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(
        store.get("a").await.and_then(|e| e.record.name),
        Some("A".to_string())
    );
}

#[tokio::test]
async fn wipe_removes_file_and_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.json");
    let store = ProfileStore::open(&path).await.expect("open");
    store
        .put("a", StoredProfile::from_extraction(record("A"), None))
        .await
        .expect("put");
    assert!(path.exists());

    store.wipe().await.expect("wipe");
    assert!(!path.exists());
    assert!(store.get("a").await.is_none());

    // Wiping an already-missing file is not an error.
    store.wipe().await.expect("second wipe");
}

#[tokio::test]
async fn loads_legacy_store_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.json");
    std::fs::write(
        &path,
        r#"{"jdoe":{"name":"Jane","badges":"5","certifications":0,"superbadges":0},"ghost":{}}"#,
    )
    .expect("write legacy file");

    let store = ProfileStore::open(&path).await.expect("open legacy");
    let jdoe = store.get("jdoe").await.expect("jdoe");
    assert_eq!(jdoe.record.certifications.as_deref(), Some("0"));
    assert!(store.get("ghost").await.expect("ghost").record.is_empty());
}

#[tokio::test]
async fn empty_file_opens_as_empty_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.json");
    std::fs::write(&path, "").expect("write empty file");

    let store = ProfileStore::open(&path).await.expect("open");
    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn corrupt_file_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.json");
    std::fs::write(&path, "not json").expect("write corrupt file");

    let result = ProfileStore::open(&path).await;
    assert!(
        matches!(result, Err(StoreError::Corrupt { .. })),
        "expected Corrupt, got: {result:?}"
    );
}

#[tokio::test]
async fn put_creates_missing_parent_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("store.json");
    let store = ProfileStore::open(&path).await.expect("open");
    store
        .put("a", StoredProfile::from_extraction(record("A"), None))
        .await
        .expect("put");
    assert!(path.exists());
}
