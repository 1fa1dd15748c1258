// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod diff;
pub mod fetch;
pub mod fingerprint;
pub mod report;
pub mod snapshot;
pub mod targets;
pub mod watch;

// ---- Re-exports for stable public API ----
pub use crate::fetch::{HttpFetcher, PageFetcher};
pub use crate::report::{ChangeRecord, FetchError, RunReport};
pub use crate::snapshot::{Snapshot, SnapshotMap, SnapshotStore};
pub use crate::targets::Target;
pub use crate::watch::WatchOptions;
