//! Filename-pattern discovery of candidate fragments.
//!
//! Discovery is a pure query: it matches a fixed set of glob-style patterns
//! against the immediate entries of a source directory, without recursing.
//! The result is deduplicated by path and sorted, so the same directory
//! snapshot always yields the same answer.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use reportdesk_shared::{ReportDeskError, Result};

/// Pattern-based enumerator of candidate fragment files.
#[derive(Debug)]
pub struct Discovery {
    patterns: Vec<regex::Regex>,
}

impl Discovery {
    /// Compile the glob-style patterns. Invalid patterns are logged and
    /// skipped rather than failing the whole table.
    pub fn new(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match glob_to_regex(p) {
                Some(re) => Some(re),
                None => {
                    warn!(pattern = %p, "invalid discovery pattern, skipping");
                    None
                }
            })
            .collect();

        Self { patterns }
    }

    /// Enumerate matching files in `source_dir`.
    ///
    /// Subdirectories are never entered; directory entries that match a
    /// pattern by name are ignored. A missing or unreadable source directory
    /// is an error — callers that want to treat it as empty (the watch loop)
    /// do so explicitly.
    pub fn scan(&self, source_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut found = BTreeSet::new();

        for entry in std::fs::read_dir(source_dir).map_err(|e| ReportDeskError::io(source_dir, e))?
        {
            let entry = entry.map_err(|e| ReportDeskError::io(source_dir, e))?;
            if !entry.path().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if self.patterns.iter().any(|re| re.is_match(&name)) {
                found.insert(entry.path());
            }
        }

        debug!(
            dir = %source_dir.display(),
            matched = found.len(),
            "discovery scan complete"
        );

        Ok(found.into_iter().collect())
    }
}

/// Convert a filename glob (`*`, `?`) into an anchored regex.
fn glob_to_regex(pattern: &str) -> Option<regex::Regex> {
    let escaped = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\?", ".");
    regex::Regex::new(&format!("^{escaped}$")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovery() -> Discovery {
        Discovery::new(&[
            "action-plan_*.json".to_string(),
            "report_complete_*.json".to_string(),
        ])
    }

    #[test]
    fn scan_matches_patterns_only() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("action-plan_20240101.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("report_complete_x.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("unrelated.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("action-plan_draft.txt"), "x").unwrap();

        let found = discovery().scan(tmp.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["action-plan_20240101.json", "report_complete_x.json"]);
    }

    #[test]
    fn scan_does_not_recurse() {
        let tmp = tempfile::tempdir().unwrap();
        let sub = tmp.path().join("action-plan_dir.json");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("action-plan_nested.json"), "{}").unwrap();

        let found = discovery().scan(tmp.path()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn scan_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("action-plan_a.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("action-plan_b.json"), "{}").unwrap();

        let first = discovery().scan(tmp.path()).unwrap();
        let second = discovery().scan(tmp.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn overlapping_patterns_deduplicate() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("action-plan_1.json"), "{}").unwrap();

        let overlapping = Discovery::new(&[
            "action-plan_*.json".to_string(),
            "action-*.json".to_string(),
        ]);
        let found = overlapping.scan(tmp.path()).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn missing_source_dir_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let gone = tmp.path().join("nope");
        assert!(discovery().scan(&gone).is_err());
    }

    #[test]
    fn invalid_pattern_is_skipped() {
        let d = Discovery::new(&["valid_*.json".to_string()]);
        assert_eq!(d.patterns.len(), 1);
    }
}
