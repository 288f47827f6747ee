use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::Semaphore;
use trailscrape_store::ProfileStore;

use super::*;
use crate::extract::ExtractSettings;
use crate::fake::{FakeFetcher, FakePage, FetchEvent};
use crate::selectors::ProfileSelectors;

const BASE: &str = "https://trailblazer.test/id";

fn url(id: &str) -> String {
    format!("{BASE}/{id}")
}

async fn orchestrator(fetcher: FakeFetcher) -> (TempDir, Arc<FakeFetcher>, RefreshOrchestrator) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(
        ProfileStore::open(dir.path().join("store.json"))
            .await
            .expect("open store"),
    );
    let fetcher = Arc::new(fetcher);
    let settings = ExtractSettings {
        profile_base_url: BASE.to_string(),
        selectors: ProfileSelectors::default(),
        selector_timeout: Duration::from_millis(10),
        optional_selector_timeout: Duration::from_millis(10),
        wipe_store_before_extract: false,
    };
    let extractor = Arc::new(ProfileExtractor::new(fetcher.clone(), store, settings));
    (dir, fetcher, RefreshOrchestrator::new(extractor))
}

async fn drain(mut rx: mpsc::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[test]
fn parse_ids_splits_and_trims() {
    assert_eq!(
        parse_ids(Some("jdoe, foobar")),
        Some(vec!["jdoe".to_string(), "foobar".to_string()])
    );
}

#[test]
fn parse_ids_drops_blank_entries() {
    assert_eq!(
        parse_ids(Some(",a,,b,")),
        Some(vec!["a".to_string(), "b".to_string()])
    );
}

#[test]
fn parse_ids_missing_or_empty_is_none() {
    assert_eq!(parse_ids(None), None);
    assert_eq!(parse_ids(Some("")), None);
    assert_eq!(parse_ids(Some(" , ,")), None);
}

#[test]
fn progress_lines_match_stream_format() {
    assert_eq!(
        ProgressEvent::Started.render(),
        "============================== start ==============================\n"
    );
    assert_eq!(
        ProgressEvent::Scraping { id: "jdoe".into() }.render(),
        "Scraping jdoe"
    );
    assert_eq!(
        ProgressEvent::Finished {
            id: "jdoe".into(),
            status: ExtractionStatus::Complete
        }
        .render(),
        " ✅\n"
    );
    assert_eq!(
        ProgressEvent::Ended.render(),
        "\n============================== end =============================="
    );
}

#[test]
fn gate_admits_one_holder_at_a_time() {
    let gate = RefreshGate::new();
    let permit = gate.try_acquire().expect("first acquire");
    assert!(gate.is_busy());
    assert!(gate.try_acquire().is_none());
    drop(permit);
    assert!(!gate.is_busy());
    assert!(gate.try_acquire().is_some());
}

#[test]
fn busy_checks_never_take_an_idle_gate() {
    let gate = RefreshGate::new();
    let stop = AtomicBool::new(false);

    let rejected = std::thread::scope(|scope| {
        scope.spawn(|| {
            while !stop.load(Ordering::Relaxed) {
                std::hint::black_box(gate.is_busy());
            }
        });

        let rejected = (0..20_000)
            .filter(|_| gate.try_acquire().is_none())
            .count();
        stop.store(true, Ordering::Relaxed);
        rejected
    });

    assert_eq!(rejected, 0, "an idle gate refused a batch");
}

#[tokio::test]
async fn gate_is_released_when_its_holder_panics() {
    let gate = RefreshGate::new();
    let permit = gate.try_acquire().expect("gate free");

    let holder = tokio::spawn(async move {
        let _permit = permit;
        panic!("batch task died");
    });

    assert!(holder.await.is_err());
    assert!(!gate.is_busy());
}

#[tokio::test]
async fn batch_processes_ids_strictly_in_order() {
    let fetcher = FakeFetcher::new()
        .with_page(&url("a"), FakePage::profile("A", ["1", "2", "3"]))
        .with_page(&url("b"), FakePage::profile("B", ["4", "5", "6"]));
    let (_dir, fetcher, orchestrator) = orchestrator(fetcher).await;

    let run = orchestrator
        .start(vec!["a".to_string(), "b".to_string()])
        .expect("gate free");
    let progress = drain(run.progress).await;

    assert_eq!(
        progress,
        vec![
            ProgressEvent::Started,
            ProgressEvent::Scraping { id: "a".into() },
            ProgressEvent::Finished {
                id: "a".into(),
                status: ExtractionStatus::Complete
            },
            ProgressEvent::Scraping { id: "b".into() },
            ProgressEvent::Finished {
                id: "b".into(),
                status: ExtractionStatus::Complete
            },
            ProgressEvent::Ended,
        ]
    );
    assert_eq!(
        fetcher.events(),
        vec![
            FetchEvent::Open,
            FetchEvent::Goto(url("a")),
            FetchEvent::Close(url("a")),
            FetchEvent::Open,
            FetchEvent::Goto(url("b")),
            FetchEvent::Close(url("b")),
        ]
    );
}

#[tokio::test]
async fn failed_id_does_not_stop_the_batch() {
    let fetcher =
        FakeFetcher::new().with_page(&url("b"), FakePage::profile("B", ["4", "5", "6"]));
    let (_dir, _fetcher, orchestrator) = orchestrator(fetcher).await;

    let run = orchestrator
        .start(vec!["missing".to_string(), "b".to_string()])
        .expect("gate free");
    let progress = drain(run.progress).await;

    assert!(progress.contains(&ProgressEvent::Finished {
        id: "missing".into(),
        status: ExtractionStatus::Failed
    }));
    assert!(progress.contains(&ProgressEvent::Finished {
        id: "b".into(),
        status: ExtractionStatus::Complete
    }));
    assert_eq!(progress.last(), Some(&ProgressEvent::Ended));
}

#[tokio::test]
async fn second_batch_is_rejected_while_first_runs() {
    let hold = Arc::new(Semaphore::new(0));
    let fetcher = FakeFetcher::new()
        .with_page(&url("a"), FakePage::profile("A", ["1", "2", "3"]))
        .with_hold(Arc::clone(&hold));
    let (_dir, fetcher, orchestrator) = orchestrator(fetcher).await;

    let run = orchestrator
        .start(vec!["a".to_string()])
        .expect("first batch admitted");
    assert!(orchestrator.is_busy());

    let second = orchestrator.start(vec!["b".to_string()]);
    assert_eq!(second.err(), Some(RefreshBusy));

    hold.add_permits(1);
    drain(run.progress).await;
    run.task.await.expect("batch finishes");

    // Only the first batch touched the browser.
    assert!(!fetcher.events().contains(&FetchEvent::Goto(url("b"))));
    assert!(orchestrator.start(vec!["a".to_string()]).is_ok());
}

#[tokio::test]
async fn panicking_page_fails_its_id_and_the_batch_continues() {
    let fetcher = FakeFetcher::new().with_page(
        &url("boom"),
        FakePage {
            panic_on_goto: true,
            ..FakePage::default()
        },
    );
    let (_dir, fetcher, orchestrator) = orchestrator(fetcher).await;

    let run = orchestrator
        .start(vec!["boom".to_string(), "next".to_string()])
        .expect("gate free");
    let progress = drain(run.progress).await;
    run.task.await.expect("batch survives the panic");

    assert_eq!(
        progress,
        vec![
            ProgressEvent::Started,
            ProgressEvent::Scraping { id: "boom".into() },
            ProgressEvent::Finished {
                id: "boom".into(),
                status: ExtractionStatus::Failed
            },
            ProgressEvent::Scraping { id: "next".into() },
            ProgressEvent::Finished {
                id: "next".into(),
                status: ExtractionStatus::Failed
            },
            ProgressEvent::Ended,
        ]
    );
    assert!(fetcher.events().contains(&FetchEvent::Close(url("boom"))));
    assert!(orchestrator.start(vec!["again".to_string()]).is_ok());
}

#[tokio::test]
async fn gate_is_free_once_the_end_marker_arrives() {
    let fetcher =
        FakeFetcher::new().with_page(&url("a"), FakePage::profile("A", ["1", "2", "3"]));
    let (_dir, _fetcher, orchestrator) = orchestrator(fetcher).await;

    let mut run = orchestrator
        .start(vec!["a".to_string()])
        .expect("gate free");
    while let Some(event) = run.progress.recv().await {
        if event == ProgressEvent::Ended {
            break;
        }
    }

    assert!(!orchestrator.is_busy());
}

#[tokio::test]
async fn dropped_receiver_does_not_abort_the_batch() {
    let fetcher = FakeFetcher::new()
        .with_page(&url("a"), FakePage::profile("A", ["1", "2", "3"]))
        .with_page(&url("b"), FakePage::profile("B", ["4", "5", "6"]));
    let (_dir, fetcher, orchestrator) = orchestrator(fetcher).await;

    let run = orchestrator
        .start(vec!["a".to_string(), "b".to_string()])
        .expect("gate free");
    drop(run.progress);

    run.task.await.expect("batch finishes");
    assert!(!orchestrator.is_busy());
    assert!(fetcher.events().contains(&FetchEvent::Close(url("b"))));
}
