//! Integration tests for item-by-item harvest runs

use super::support::{ok, rate_limited, seed_ledger, status, read_ledger, Call, ScriptedFetcher};
use serde_json::json;
use snapshot_harvester::engine::HarvestEngine;
use snapshot_harvester::store::SnapshotStore;
use tempfile::TempDir;

fn harness(dir: &TempDir, rows: &[(&str, bool)], fetcher: &ScriptedFetcher) -> HarvestEngine {
    let ledger_path = dir.path().join("ids.csv");
    let items_dir = dir.path().join("items");
    std::fs::create_dir_all(&items_dir).unwrap();
    seed_ledger(&ledger_path, rows);
    HarvestEngine::new(
        "tracks",
        Box::new(fetcher.clone()),
        SnapshotStore::new(&items_dir),
        &ledger_path,
    )
}

#[tokio::test]
async fn test_sequential_fetches_each_uncached_id() {
    let dir = TempDir::new().unwrap();
    let items_dir = dir.path().join("items");
    std::fs::create_dir_all(&items_dir).unwrap();
    std::fs::write(items_dir.join("c.json"), "{}").unwrap();

    let fetcher = ScriptedFetcher::new(
        "tracks",
        vec![ok(json!({"name": "A"})), ok(json!({"name": "B"}))],
    );
    let engine = harness(&dir, &[("a", false), ("b", false), ("c", true)], &fetcher);

    let report = engine.run(1).await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.already_cached, 1);
    assert!(report.failed.is_empty());
    assert_eq!(
        fetcher.calls(),
        vec![Call::One("a".to_string()), Call::One("b".to_string())]
    );
    assert!(items_dir.join("a.json").exists());
    assert!(items_dir.join("b.json").exists());
    assert_eq!(
        read_ledger(&dir.path().join("ids.csv")),
        vec![
            ("a".to_string(), true),
            ("b".to_string(), true),
            ("c".to_string(), true)
        ]
    );
}

#[tokio::test]
async fn test_rejected_id_dropped_at_commit() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new("tracks", vec![status(404), ok(json!({"name": "B"}))]);
    let engine = harness(&dir, &[("a", false), ("b", false)], &fetcher);

    let report = engine.run(1).await.unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(report.failed, vec!["a".to_string()]);
    assert!(!dir.path().join("items/a.json").exists());
    assert!(dir.path().join("items/b.json").exists());
    // The rejected id is gone from the ledger
    assert_eq!(
        read_ledger(&dir.path().join("ids.csv")),
        vec![("b".to_string(), true)]
    );
}

#[tokio::test]
async fn test_unparseable_body_counts_as_failure() {
    let dir = TempDir::new().unwrap();
    let garbage = snapshot_harvester::fetcher::ApiResponse {
        status: 200,
        retry_after: None,
        body: "not json".to_string(),
    };
    let fetcher = ScriptedFetcher::new("tracks", vec![garbage]);
    let engine = harness(&dir, &[("a", false)], &fetcher);

    let report = engine.run(1).await.unwrap();

    assert_eq!(report.fetched, 0);
    assert_eq!(report.failed, vec!["a".to_string()]);
    assert!(!dir.path().join("items/a.json").exists());
}

#[tokio::test]
async fn test_second_run_issues_no_requests() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new("tracks", vec![ok(json!({"name": "A"}))]);
    let engine = harness(&dir, &[("a", false)], &fetcher);
    engine.run(1).await.unwrap();

    // Fresh engine over the same folder; an empty script proves no call is made
    let silent = ScriptedFetcher::new("tracks", vec![]);
    let engine = HarvestEngine::new(
        "tracks",
        Box::new(silent.clone()),
        SnapshotStore::new(dir.path().join("items")),
        dir.path().join("ids.csv"),
    );
    let report = engine.run(1).await.unwrap();

    assert_eq!(report.fetched, 0);
    assert_eq!(report.already_cached, 1);
    assert_eq!(silent.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_fetch_is_retried() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new(
        "tracks",
        vec![rate_limited(3), ok(json!({"name": "A"}))],
    );
    let engine = harness(&dir, &[("a", false)], &fetcher);

    let started = tokio::time::Instant::now();
    let report = engine.run(1).await.unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(fetcher.call_count(), 2);
    assert!(started.elapsed() >= std::time::Duration::from_secs(3));
}
