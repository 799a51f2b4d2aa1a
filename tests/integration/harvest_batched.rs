//! Integration tests for batched harvest runs and per-item fallback

use super::support::{ok, read_ledger, seed_ledger, status, Call, ScriptedFetcher};
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

fn batch_body(ids: &[&str]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| json!({"id": id, "name": id.to_uppercase()}))
        .collect();
    json!({ "tracks": items })
}

#[tokio::test]
async fn test_batched_run_chunks_ids() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new(
        "tracks",
        vec![
            ok(batch_body(&["a", "b"])),
            ok(batch_body(&["c", "d"])),
            ok(batch_body(&["e"])),
        ],
    );
    let rows = [
        ("a", false),
        ("b", false),
        ("c", false),
        ("d", false),
        ("e", false),
    ];
    let engine = harness(&dir, &rows, &fetcher);

    let report = engine.run(2).await.unwrap();

    assert_eq!(report.fetched, 5);
    assert!(report.failed.is_empty());
    assert!(report.missing.is_empty());
    assert_eq!(
        fetcher.calls(),
        vec![
            Call::Batch(vec!["a".to_string(), "b".to_string()]),
            Call::Batch(vec!["c".to_string(), "d".to_string()]),
            Call::Batch(vec!["e".to_string()]),
        ]
    );
    for id in ["a", "b", "c", "d", "e"] {
        assert!(dir.path().join(format!("items/{id}.json")).exists());
    }
}

#[tokio::test]
async fn test_null_items_are_skipped() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new(
        "tracks",
        vec![ok(json!({"tracks": [{"id": "a", "name": "A"}, null]}))],
    );
    let engine = harness(&dir, &[("a", false), ("b", false)], &fetcher);

    let report = engine.run(2).await.unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(report.missing, vec!["b".to_string()]);
    assert!(dir.path().join("items/a.json").exists());
    assert!(!dir.path().join("items/b.json").exists());
}

#[tokio::test]
async fn test_omitted_id_stays_pending_for_next_run() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new(
        "tracks",
        vec![ok(json!({"tracks": [{"id": "a", "name": "A"}, null]}))],
    );
    let engine = harness(&dir, &[("a", false), ("b", false)], &fetcher);
    engine.run(2).await.unwrap();

    // The next run reconciles the ledger against the snapshot folder and
    // retries the omitted id.
    let retry = ScriptedFetcher::new("tracks", vec![ok(batch_body(&["b"]))]);
    let engine = HarvestEngine::new(
        "tracks",
        Box::new(retry.clone()),
        SnapshotStore::new(dir.path().join("items")),
        dir.path().join("ids.csv"),
    );
    let report = engine.run(2).await.unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(retry.calls(), vec![Call::Batch(vec!["b".to_string()])]);
    assert!(dir.path().join("items/b.json").exists());
}

#[tokio::test]
async fn test_batch_failure_falls_back_to_single_fetches() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new(
        "tracks",
        vec![
            status(500),
            ok(json!({"id": "a", "name": "A"})),
            ok(json!({"id": "b", "name": "B"})),
        ],
    );
    let engine = harness(&dir, &[("a", false), ("b", false)], &fetcher);

    let report = engine.run(2).await.unwrap();

    assert_eq!(report.fetched, 2);
    assert!(report.failed.is_empty());
    assert_eq!(
        fetcher.calls(),
        vec![
            Call::Batch(vec!["a".to_string(), "b".to_string()]),
            Call::One("a".to_string()),
            Call::One("b".to_string()),
        ]
    );
    assert!(dir.path().join("items/a.json").exists());
    assert!(dir.path().join("items/b.json").exists());
}

#[tokio::test]
async fn test_fallback_failure_is_counted_once() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new(
        "tracks",
        vec![status(500), ok(json!({"id": "a", "name": "A"})), status(404)],
    );
    let engine = harness(&dir, &[("a", false), ("b", false)], &fetcher);

    let report = engine.run(2).await.unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(report.failed, vec!["b".to_string()]);
    // A fallback failure is an error, not a missing id
    assert!(report.missing.is_empty());
    assert_eq!(
        read_ledger(&dir.path().join("ids.csv")),
        vec![("a".to_string(), true)]
    );
}
