//! Fragment ingestion for ReportDesk: the Archive Store, filename-pattern
//! discovery, collision-safe relocation, and the downloads watch loop.

pub mod discovery;
pub mod relocate;
pub mod store;
pub mod watcher;

pub use discovery::Discovery;
pub use relocate::{MoveOutcome, Relocator};
pub use store::{ArchiveStore, StoredFragment};
pub use watcher::{SilentWatch, WatchReporter, WatchSummary, Watcher};
