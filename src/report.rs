// src/report.rs
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One detected content change, immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub provider: String,
    pub url: String,
    pub title: String,
    pub old_fingerprint: String,
    pub new_fingerprint: String,
    pub diff: String,
}

/// A target whose content could not be obtained this run. Its stored
/// snapshot is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchError {
    pub provider: String,
    pub url: String,
    pub error: String,
}

/// Single output artifact of one watch run.
///
/// `baseline == true` means this run only established history: `changes`
/// is empty by construction and `generated_at` is omitted. `fetch_errors`
/// is always present, baseline or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub baseline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    pub changes: Vec<ChangeRecord>,
    pub fetch_errors: Vec<FetchError>,
}

impl RunReport {
    /// Write the report as pretty JSON. A write failure here is fatal to
    /// the run (silently dropping it would desynchronize stored history
    /// from what was reported).
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing report to {}", path.display()))?;
        Ok(())
    }
}
