//! docwatch — Binary Entrypoint
//! One invocation performs one watch run over the configured provider
//! pages and writes the change report.
//!
//! Scheduling lives outside this binary (cron, CI workflow); downstream
//! consumers turn the report into issues or notifications.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use docwatch::fetch::{self, HttpFetcher};
use docwatch::targets;
use docwatch::watch::{self, WatchOptions};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in CI environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let targets = targets::load_targets_default()?;
    let opts = WatchOptions::from_env();

    let timeout_secs: u64 = std::env::var("DOCWATCH_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fetch::DEFAULT_TIMEOUT_SECS);
    let fetcher = HttpFetcher::with_timeout(std::time::Duration::from_secs(timeout_secs))?;

    let report = watch::execute(&targets, &fetcher, &opts).await?;

    if report.baseline {
        tracing::info!(
            targets = targets.len(),
            fetch_errors = report.fetch_errors.len(),
            "first run: baseline established, no changes reported"
        );
    } else {
        tracing::info!(
            changes = report.changes.len(),
            fetch_errors = report.fetch_errors.len(),
            "watch run complete"
        );
    }
    Ok(())
}
