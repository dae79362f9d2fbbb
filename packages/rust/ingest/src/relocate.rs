//! Collision-safe relocation of discovered fragments into the Archive Store.
//!
//! The relocator is non-interactive by contract: batch moves return a
//! per-file result list and a failure for one file never aborts the rest.
//! Any confirmation UI belongs to the caller.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use reportdesk_shared::{ReportDeskError, Result};

use crate::store::ArchiveStore;

/// Result of one attempted relocation within a batch.
#[derive(Debug)]
pub struct MoveOutcome {
    /// The source path offered to the relocator.
    pub source: PathBuf,
    /// Final destination on success, the per-file error otherwise.
    pub outcome: Result<PathBuf>,
}

impl MoveOutcome {
    /// Whether this file landed in the store.
    pub fn is_moved(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Moves fragments into an [`ArchiveStore`].
#[derive(Debug, Clone)]
pub struct Relocator {
    store: ArchiveStore,
}

impl Relocator {
    pub fn new(store: ArchiveStore) -> Self {
        Self { store }
    }

    /// The store this relocator feeds.
    pub fn store(&self) -> &ArchiveStore {
        &self.store
    }

    /// Move one file into the store, resolving filename collisions.
    ///
    /// Returns the final destination path. The existing same-named file, if
    /// any, is left untouched; the incoming file gets a timestamp-suffixed
    /// name instead.
    pub fn relocate(&self, source: &Path) -> Result<PathBuf> {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                ReportDeskError::validation(format!(
                    "source has no file name: {}",
                    source.display()
                ))
            })?;

        let dest = self.store.destination_for(&file_name);
        move_file(source, &dest)?;

        info!(
            from = %source.display(),
            to = %dest.display(),
            "fragment archived"
        );
        Ok(dest)
    }

    /// Move a batch of files, isolating failures to the single file.
    pub fn relocate_all(&self, sources: &[PathBuf]) -> Vec<MoveOutcome> {
        sources
            .iter()
            .map(|source| {
                let outcome = self.relocate(source);
                if let Err(e) = &outcome {
                    warn!(file = %source.display(), error = %e, "relocation failed, continuing batch");
                }
                MoveOutcome {
                    source: source.clone(),
                    outcome,
                }
            })
            .collect()
    }
}

/// Rename, degrading to copy+delete when rename is not possible (typically a
/// cross-volume move). The degraded path is not atomic and is logged as such.
fn move_file(source: &Path, dest: &Path) -> Result<()> {
    match std::fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            warn!(
                from = %source.display(),
                to = %dest.display(),
                error = %rename_err,
                "rename failed, degrading to non-atomic copy+delete"
            );
            std::fs::copy(source, dest).map_err(|e| ReportDeskError::io(dest, e))?;
            std::fs::remove_file(source).map_err(|e| ReportDeskError::io(source, e))?;
            Ok(())
        }
    }
}
