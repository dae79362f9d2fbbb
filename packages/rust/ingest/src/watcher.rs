//! The downloads watch loop: poll, diff against the previous snapshot, move
//! whatever is new.
//!
//! The loop has exactly two states — sleeping and scanning. Cancellation
//! (Ctrl-C) is cooperative and only takes effect between ticks, never in the
//! middle of a relocation. `seen` is not persisted: a restarted watcher
//! primes itself from a fresh scan, so files that arrived while it was down
//! are treated as pre-existing and left for an explicit `move`.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::discovery::Discovery;
use crate::relocate::{MoveOutcome, Relocator};

/// Progress callbacks for a running watch loop.
pub trait WatchReporter: Send + Sync {
    /// Called after a scanning tick that offered files to the relocator.
    fn scanned(&self, outcomes: &[MoveOutcome]);
    /// Called after a tick that found nothing new.
    fn idle(&self);
}

/// No-op reporter for headless/test usage.
pub struct SilentWatch;

impl WatchReporter for SilentWatch {
    fn scanned(&self, _outcomes: &[MoveOutcome]) {}
    fn idle(&self) {}
}

/// Totals for a finished watch run.
#[derive(Debug, Default, Clone, Copy)]
pub struct WatchSummary {
    /// Scanning ticks executed.
    pub ticks: u64,
    /// Files moved into the store.
    pub moved: usize,
    /// Files whose relocation failed.
    pub failed: usize,
}

/// Polling watcher feeding new discoveries to the relocator.
pub struct Watcher {
    discovery: Discovery,
    relocator: Relocator,
    source_dir: PathBuf,
    seen: HashSet<PathBuf>,
}

impl Watcher {
    /// A watcher with an empty `seen` set. The first tick will offer every
    /// currently matching file; call [`Watcher::prime`] first to only react
    /// to files that appear later.
    pub fn new(discovery: Discovery, relocator: Relocator, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            discovery,
            relocator,
            source_dir: source_dir.into(),
            seen: HashSet::new(),
        }
    }

    /// Snapshot the source directory into `seen` without moving anything.
    pub fn prime(&mut self) {
        match self.discovery.scan(&self.source_dir) {
            Ok(current) => {
                debug!(pre_existing = current.len(), "watcher primed");
                self.seen = current.into_iter().collect();
            }
            Err(e) => {
                warn!(error = %e, "initial scan failed, starting from an empty snapshot");
                self.seen.clear();
            }
        }
    }

    /// One scanning tick: discover, relocate what is new, update `seen`.
    ///
    /// `seen` becomes the pre-move snapshot, so a file moved this tick is
    /// never re-offered and a file that failed to move is not retried
    /// automatically. A scan failure leaves `seen` untouched.
    pub fn tick(&mut self) -> Vec<MoveOutcome> {
        let current = match self.discovery.scan(&self.source_dir) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(error = %e, "scan failed, skipping tick");
                return Vec::new();
            }
        };

        let current: HashSet<PathBuf> = current.into_iter().collect();
        let mut new: Vec<PathBuf> = current.difference(&self.seen).cloned().collect();
        new.sort();

        let outcomes = if new.is_empty() {
            Vec::new()
        } else {
            info!(count = new.len(), "new fragments detected");
            self.relocator.relocate_all(&new)
        };

        self.seen = current;
        outcomes
    }

    /// Run until Ctrl-C, scanning every `interval`.
    ///
    /// Primes `seen` first, so only files that appear after startup are
    /// moved. Returns totals once interrupted.
    pub async fn run(
        &mut self,
        interval: Duration,
        reporter: &dyn WatchReporter,
    ) -> WatchSummary {
        info!(
            dir = %self.source_dir.display(),
            interval_secs = interval.as_secs(),
            "watching for fragments"
        );

        self.prime();
        let mut summary = WatchSummary::default();

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("interrupt received, stopping watch");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    let outcomes = self.tick();
                    summary.ticks += 1;

                    if outcomes.is_empty() {
                        reporter.idle();
                    } else {
                        summary.moved += outcomes.iter().filter(|o| o.is_moved()).count();
                        summary.failed += outcomes.iter().filter(|o| !o.is_moved()).count();
                        reporter.scanned(&outcomes);
                    }
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ArchiveStore;

    fn setup() -> (tempfile::TempDir, PathBuf, Watcher) {
        let tmp = tempfile::tempdir().unwrap();
        let source_dir = tmp.path().join("downloads");
        std::fs::create_dir(&source_dir).unwrap();

        let store = ArchiveStore::open(tmp.path().join("saved_sections")).unwrap();
        let discovery = Discovery::new(&["action-plan_*.json".to_string()]);
        let watcher = Watcher::new(discovery, Relocator::new(store), &source_dir);
        (tmp, source_dir, watcher)
    }

    #[test]
    fn unprimed_tick_moves_existing_files() {
        let (tmp, source_dir, mut watcher) = setup();
        std::fs::write(source_dir.join("action-plan_a.json"), "{}").unwrap();

        let outcomes = watcher.tick();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_moved());
        assert!(tmp
            .path()
            .join("saved_sections/action-plan_a.json")
            .exists());
    }

    #[test]
    fn primed_watcher_ignores_pre_existing_files() {
        let (_tmp, source_dir, mut watcher) = setup();
        let pre_existing = source_dir.join("action-plan_old.json");
        std::fs::write(&pre_existing, "{}").unwrap();

        watcher.prime();
        assert!(watcher.tick().is_empty());
        assert!(pre_existing.exists());

        std::fs::write(source_dir.join("action-plan_new.json"), "{}").unwrap();
        let outcomes = watcher.tick();
        assert_eq!(outcomes.len(), 1);
        assert!(pre_existing.exists());
    }

    #[test]
    fn moved_file_is_not_reoffered_next_tick() {
        let (_tmp, source_dir, mut watcher) = setup();
        std::fs::write(source_dir.join("action-plan_a.json"), "{}").unwrap();

        let first = watcher.tick();
        assert_eq!(first.len(), 1);

        let second = watcher.tick();
        assert!(second.is_empty());
    }

    #[test]
    fn failed_move_is_not_retried_automatically() {
        let (tmp, source_dir, mut watcher) = setup();
        let path = source_dir.join("action-plan_flaky.json");
        std::fs::write(&path, "{}").unwrap();

        // Replace the store directory with a plain file so the move itself
        // fails while the source stays discoverable.
        let store_dir = tmp.path().join("saved_sections");
        std::fs::remove_dir(&store_dir).unwrap();
        std::fs::write(&store_dir, "").unwrap();

        let outcomes = watcher.tick();
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].is_moved());
        assert!(path.exists());

        // The failed path landed in `seen`; the next tick does not offer it.
        assert!(watcher.tick().is_empty());
    }

    #[test]
    fn vanished_source_dir_skips_tick() {
        let (_tmp, source_dir, mut watcher) = setup();
        std::fs::remove_dir(&source_dir).unwrap();
        assert!(watcher.tick().is_empty());
    }
}
