// tests/watch_pipeline.rs
use std::collections::HashMap;

use anyhow::anyhow;
use async_trait::async_trait;
use docwatch::fingerprint::fingerprint;
use docwatch::watch::{self, WatchOptions};
use docwatch::{PageFetcher, SnapshotStore, Target};

struct MapFetcher {
    pages: HashMap<String, String>,
}

impl MapFetcher {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(u, c)| (u.to_string(), c.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl PageFetcher for MapFetcher {
    async fn fetch_text(&self, target: &Target) -> anyhow::Result<String> {
        self.pages
            .get(&target.url)
            .cloned()
            .ok_or_else(|| anyhow!("connection refused: {}", target.url))
    }
}

fn opts_in(dir: &std::path::Path) -> WatchOptions {
    WatchOptions {
        snapshot_path: dir.join("data/api_doc_snapshots.json"),
        report_path: dir.join("changes_out.json"),
        diff_max_lines: 120,
    }
}

#[tokio::test]
async fn full_lifecycle_baseline_then_idempotent_then_change() {
    let tmp = tempfile::tempdir().unwrap();
    let opts = opts_in(tmp.path());
    let targets = vec![Target::new(
        "Anthropic",
        "https://a.test/docs",
        "Anthropic API Reference",
    )];

    // Run 1: no persisted state -> baseline.
    let v1 = MapFetcher::new(&[("https://a.test/docs", "v1\nline2")]);
    let report = watch::execute(&targets, &v1, &opts).await.unwrap();
    assert!(report.baseline);
    assert!(report.changes.is_empty());

    let store = SnapshotStore::new(&opts.snapshot_path);
    assert!(store.exists());
    let map = store.load();
    assert_eq!(map.len(), 1);
    let h1 = map["https://a.test/docs"].fingerprint.clone();
    assert_eq!(h1, fingerprint("v1\nline2"));

    // Run 2: same remote content -> empty change set, unchanged map.
    let report = watch::execute(&targets, &v1, &opts).await.unwrap();
    assert!(!report.baseline);
    assert!(report.changes.is_empty());
    assert_eq!(store.load(), map);

    // Run 3: remote grew a line -> exactly one change record.
    let v2 = MapFetcher::new(&[("https://a.test/docs", "v1\nline2\nline3")]);
    let report = watch::execute(&targets, &v2, &opts).await.unwrap();
    assert!(!report.baseline);
    assert_eq!(report.changes.len(), 1);

    let change = &report.changes[0];
    let h2 = fingerprint("v1\nline2\nline3");
    assert_eq!(change.old_fingerprint, h1);
    assert_eq!(change.new_fingerprint, h2);
    assert!(change.diff.lines().any(|l| l == "+line3"));

    let map = store.load();
    assert_eq!(map["https://a.test/docs"].fingerprint, h2);
    assert_eq!(map["https://a.test/docs"].content, "v1\nline2\nline3");
}

#[tokio::test]
async fn failed_target_keeps_stale_snapshot_while_others_proceed() {
    let tmp = tempfile::tempdir().unwrap();
    let opts = opts_in(tmp.path());
    let targets = vec![
        Target::new("A", "https://a.test/docs", "A Docs"),
        Target::new("B", "https://b.test/docs", "B Docs"),
    ];

    let both = MapFetcher::new(&[
        ("https://a.test/docs", "alpha v1"),
        ("https://b.test/docs", "beta v1"),
    ]);
    watch::execute(&targets, &both, &opts).await.unwrap();

    let store = SnapshotStore::new(&opts.snapshot_path);
    let stored_b = store.load()["https://b.test/docs"].clone();

    // B's host disappears while A changes.
    let only_a = MapFetcher::new(&[("https://a.test/docs", "alpha v2")]);
    let report = watch::execute(&targets, &only_a, &opts).await.unwrap();

    assert_eq!(report.changes.len(), 1);
    assert_eq!(report.changes[0].provider, "A");
    assert_eq!(report.fetch_errors.len(), 1);
    assert_eq!(report.fetch_errors[0].url, "https://b.test/docs");

    let map = store.load();
    assert_eq!(map["https://b.test/docs"], stored_b);
    assert_eq!(map["https://a.test/docs"].content, "alpha v2");
}

#[tokio::test]
async fn new_target_joining_later_never_reports_a_change() {
    let tmp = tempfile::tempdir().unwrap();
    let opts = opts_in(tmp.path());
    let first = Target::new("A", "https://a.test/docs", "A Docs");
    let second = Target::new("B", "https://b.test/docs", "B Docs");

    let fetcher = MapFetcher::new(&[
        ("https://a.test/docs", "stable"),
        ("https://b.test/docs", "fresh"),
    ]);

    watch::execute(std::slice::from_ref(&first), &fetcher, &opts)
        .await
        .unwrap();
    let report = watch::execute(&[first, second], &fetcher, &opts).await.unwrap();

    assert!(!report.baseline);
    assert!(report.changes.is_empty());
    assert_eq!(SnapshotStore::new(&opts.snapshot_path).load().len(), 2);
}

#[tokio::test]
async fn corrupt_store_triggers_fresh_history_without_crashing() {
    let tmp = tempfile::tempdir().unwrap();
    let opts = opts_in(tmp.path());
    std::fs::create_dir_all(opts.snapshot_path.parent().unwrap()).unwrap();
    std::fs::write(&opts.snapshot_path, "{ definitely not json").unwrap();

    let targets = vec![Target::new("A", "https://a.test/docs", "A Docs")];
    let fetcher = MapFetcher::new(&[("https://a.test/docs", "content")]);
    let report = watch::execute(&targets, &fetcher, &opts).await.unwrap();

    // The blob existed, so this is not a baseline run; the unreadable map
    // just means every target is seen for the first time again.
    assert!(!report.baseline);
    assert!(report.changes.is_empty());
    assert_eq!(SnapshotStore::new(&opts.snapshot_path).load().len(), 1);
}
