//! Latest-revision fragment selection from the Archive Store.

use std::path::PathBuf;
use std::time::SystemTime;

use tracing::{debug, info};

use reportdesk_ingest::ArchiveStore;
use reportdesk_shared::{Fragment, ReportDeskError, Result};

/// A fragment parsed from the store, together with its source file.
#[derive(Debug, Clone)]
pub struct LoadedFragment {
    /// The store file the fragment was read from.
    pub path: PathBuf,
    /// Parsed body.
    pub fragment: Fragment,
}

/// Load the most recently modified fragment for one section.
///
/// `Ok(None)` means the section has not been contributed yet — the caller
/// proceeds with partial data. A fragment that exists but fails to parse is
/// a hard error; it is never skipped in favor of an older revision.
pub fn load_latest(store: &ArchiveStore, section_id: &str) -> Result<Option<LoadedFragment>> {
    // Ties are broken arbitrarily; collision renaming keeps real revisions
    // a second apart.
    let latest = store.revisions(section_id)?.into_iter().max_by_key(|path| {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH)
    });

    let Some(latest) = latest else {
        debug!(section = section_id, "no fragments contributed yet");
        return Ok(None);
    };

    let body = std::fs::read_to_string(&latest).map_err(|e| ReportDeskError::io(&latest, e))?;
    let fragment: Fragment = serde_json::from_str(&body).map_err(|e| {
        ReportDeskError::parse(format!("invalid fragment {}: {e}", latest.display()))
    })?;

    info!(
        section = section_id,
        file = %latest.display(),
        "loaded section data"
    );

    Ok(Some(LoadedFragment {
        path: latest,
        fragment,
    }))
}
