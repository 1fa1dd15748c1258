//! Watch orchestrator — one pass over the configured targets.
//!
//! Loads the snapshot map, obtains normalized text per target through a
//! [`PageFetcher`], compares fingerprints, accumulates the change set and
//! the error set, then persists the map once and writes the run report.

use std::collections::hash_map::Entry;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::diff;
use crate::fetch::PageFetcher;
use crate::fingerprint::fingerprint;
use crate::report::{ChangeRecord, FetchError, RunReport};
use crate::snapshot::{Snapshot, SnapshotMap, SnapshotStore};
use crate::targets::Target;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("watch_runs_total", "Completed watch runs.");
        describe_counter!("watch_changes_total", "Content changes detected.");
        describe_counter!(
            "watch_fetch_errors_total",
            "Targets whose content could not be obtained."
        );
        describe_counter!("watch_fetch_retries_total", "Individual fetch attempts that failed.");
        describe_gauge!("watch_last_run_ts", "Unix ts when a watch run last completed.");
    });
}

/// Per-run knobs; everything has a default matching the shipped setup.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub snapshot_path: PathBuf,
    pub report_path: PathBuf,
    pub diff_max_lines: usize,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("data/api_doc_snapshots.json"),
            report_path: PathBuf::from("changes_out.json"),
            diff_max_lines: diff::DEFAULT_MAX_LINES,
        }
    }
}

impl WatchOptions {
    /// Read overrides from the environment. Unset or malformed values keep
    /// the defaults.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Ok(p) = std::env::var("DOCWATCH_SNAPSHOT_PATH") {
            opts.snapshot_path = PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("DOCWATCH_REPORT_PATH") {
            opts.report_path = PathBuf::from(p);
        }
        opts.diff_max_lines = std::env::var("DOCWATCH_DIFF_MAX_LINES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(opts.diff_max_lines);
        opts
    }
}

/// Outcome of processing one target.
#[derive(Debug)]
enum TargetOutcome {
    Baseline,
    Unchanged,
    Changed(ChangeRecord),
    Failed(FetchError),
}

async fn process_target(
    target: &Target,
    fetcher: &dyn PageFetcher,
    snapshots: &mut SnapshotMap,
    diff_max_lines: usize,
) -> TargetOutcome {
    let content = match fetcher.fetch_text(target).await {
        Ok(c) => c,
        Err(e) => {
            return TargetOutcome::Failed(FetchError {
                provider: target.provider.clone(),
                url: target.url.clone(),
                error: format!("{e:#}"),
            });
        }
    };

    let new_fingerprint = fingerprint(&content);
    let now = Utc::now();

    match snapshots.entry(target.url.clone()) {
        Entry::Vacant(slot) => {
            // First sighting of this target; recorded silently whatever
            // the run mode.
            slot.insert(Snapshot {
                provider: target.provider.clone(),
                title: target.title.clone(),
                fingerprint: new_fingerprint,
                content,
                fetched_at: now,
            });
            TargetOutcome::Baseline
        }
        Entry::Occupied(mut slot) => {
            let prev = slot.get_mut();
            if prev.fingerprint == new_fingerprint {
                return TargetOutcome::Unchanged;
            }
            let rendered = diff::render_unified(&prev.content, &content, diff_max_lines);
            let record = ChangeRecord {
                provider: target.provider.clone(),
                url: target.url.clone(),
                title: target.title.clone(),
                old_fingerprint: prev.fingerprint.clone(),
                new_fingerprint: new_fingerprint.clone(),
                diff: rendered,
            };
            prev.fingerprint = new_fingerprint;
            prev.content = content;
            prev.fetched_at = now;
            TargetOutcome::Changed(record)
        }
    }
}

/// One pass over `targets`, mutating `snapshots` in place.
///
/// Targets are processed independently and in order: a fetch failure
/// records an error and leaves that target's snapshot untouched, never
/// aborting the run. With `is_baseline` set the returned report carries no
/// changes; the run only establishes history.
pub async fn run_once(
    targets: &[Target],
    fetcher: &dyn PageFetcher,
    snapshots: &mut SnapshotMap,
    is_baseline: bool,
    diff_max_lines: usize,
) -> RunReport {
    ensure_metrics_described();

    let mut changes = Vec::new();
    let mut fetch_errors = Vec::new();

    for target in targets {
        match process_target(target, fetcher, snapshots, diff_max_lines).await {
            TargetOutcome::Baseline => {
                tracing::info!(provider = %target.provider, title = %target.title, "baseline added");
            }
            TargetOutcome::Unchanged => {
                tracing::debug!(provider = %target.provider, title = %target.title, "no change");
            }
            TargetOutcome::Changed(record) => {
                tracing::info!(provider = %target.provider, title = %target.title, "content changed");
                counter!("watch_changes_total").increment(1);
                changes.push(record);
            }
            TargetOutcome::Failed(err) => {
                tracing::warn!(
                    provider = %target.provider,
                    url = %target.url,
                    error = %err.error,
                    "fetch failed"
                );
                counter!("watch_fetch_errors_total").increment(1);
                fetch_errors.push(err);
            }
        }
    }

    counter!("watch_runs_total").increment(1);
    gauge!("watch_last_run_ts").set(Utc::now().timestamp().max(0) as f64);

    if is_baseline {
        // The first-ever run never reports changes, only establishes
        // history; per-target insertions stay in the map.
        return RunReport {
            baseline: true,
            generated_at: None,
            changes: Vec::new(),
            fetch_errors,
        };
    }

    RunReport {
        baseline: false,
        generated_at: Some(Utc::now()),
        changes,
        fetch_errors,
    }
}

/// Full run: decide baseline mode, load, process every target, persist the
/// map exactly once, write the report.
pub async fn execute(
    targets: &[Target],
    fetcher: &dyn PageFetcher,
    opts: &WatchOptions,
) -> Result<RunReport> {
    let store = SnapshotStore::new(&opts.snapshot_path);
    // Baseline mode is decided by prior existence of the persisted blob,
    // sampled before anything is written.
    let is_baseline = !store.exists();
    let mut snapshots = store.load();

    let report = run_once(targets, fetcher, &mut snapshots, is_baseline, opts.diff_max_lines).await;

    store.save(&snapshots).context("persisting snapshot store")?;
    report.write_to(&opts.report_path).context("writing run report")?;
    Ok(report)
}
