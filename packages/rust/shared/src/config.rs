//! Application configuration for ReportDesk.
//!
//! User config lives at `~/.reportdesk/reportdesk.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReportDeskError, Result};
use crate::types::SectionEntry;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "reportdesk.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".reportdesk";

// ---------------------------------------------------------------------------
// Config structs (matching reportdesk.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory layout.
    #[serde(default)]
    pub directories: DirectoriesConfig,

    /// Watch loop settings.
    #[serde(default)]
    pub watch: WatchConfig,

    /// Template placeholder conventions.
    #[serde(default)]
    pub template: TemplateConfig,

    /// Filename patterns recognized by discovery.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// The section table: known report sections and their metadata-span
    /// prefixes. New report types are added here, not in code.
    #[serde(default = "default_sections")]
    pub sections: Vec<SectionEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            directories: DirectoriesConfig::default(),
            watch: WatchConfig::default(),
            template: TemplateConfig::default(),
            discovery: DiscoveryConfig::default(),
            sections: default_sections(),
        }
    }
}

/// `[directories]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoriesConfig {
    /// Source directory watched for incoming fragments.
    /// Defaults to the OS downloads directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads_dir: Option<PathBuf>,

    /// The Archive Store directory.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,

    /// Directory receiving rendered artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            downloads_dir: None,
            archive_dir: default_archive_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_archive_dir() -> PathBuf {
    "saved_sections".into()
}
fn default_output_dir() -> PathBuf {
    "generated_pdfs".into()
}

impl DirectoriesConfig {
    /// Resolve the source directory for discovery: the configured override,
    /// or the OS downloads location.
    pub fn resolve_downloads_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.downloads_dir {
            return Ok(dir.clone());
        }
        dirs::download_dir()
            .ok_or_else(|| ReportDeskError::config("could not determine downloads directory"))
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Seconds between watch ticks.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    5
}

/// `[template]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Path to the HTML template document.
    #[serde(default = "default_template_path")]
    pub path: PathBuf,

    /// Prefix marking an untouched field placeholder region.
    #[serde(default = "default_empty_marker")]
    pub empty_marker: String,

    /// Text shown by an unset `<prefix>-author` span.
    #[serde(default = "default_author_placeholder")]
    pub author_placeholder: String,

    /// Text shown by an unset `<prefix>-date` span.
    #[serde(default = "default_date_placeholder")]
    pub date_placeholder: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            path: default_template_path(),
            empty_marker: default_empty_marker(),
            author_placeholder: default_author_placeholder(),
            date_placeholder: default_date_placeholder(),
        }
    }
}

fn default_template_path() -> PathBuf {
    "report_template.html".into()
}
fn default_empty_marker() -> String {
    "[Enter".into()
}
fn default_author_placeholder() -> String {
    "Not recorded".into()
}
fn default_date_placeholder() -> String {
    "-".into()
}

/// `[discovery]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Glob-style filename patterns: one per known section-category plus
    /// catch-alls for complete-report exports.
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
        }
    }
}

fn default_patterns() -> Vec<String> {
    [
        "overall-assessment_*.json",
        "completeness-analysis_*.json",
        "accuracy-consistency_*.json",
        "action-plan_*.json",
        "report_complete_*.json",
        "data_quality_report_full_*.json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_sections() -> Vec<SectionEntry> {
    [
        ("executive-summary", "exec", "Executive summary"),
        ("technical-analysis", "tech", "Technical analysis"),
        ("financial-analysis", "fin", "Financial analysis"),
        ("summary", "sum", "Summary"),
    ]
    .into_iter()
    .map(|(id, prefix, title)| SectionEntry {
        id: id.into(),
        prefix: prefix.into(),
        title: title.into(),
    })
    .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.reportdesk/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ReportDeskError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.reportdesk/reportdesk.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ReportDeskError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ReportDeskError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ReportDeskError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ReportDeskError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ReportDeskError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("archive_dir"));
        assert!(toml_str.contains("executive-summary"));
        assert!(toml_str.contains("action-plan_*.json"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.watch.interval_secs, 5);
        assert_eq!(parsed.sections.len(), 4);
        assert_eq!(parsed.discovery.patterns.len(), 6);
        assert_eq!(parsed.template.empty_marker, "[Enter");
    }

    #[test]
    fn config_with_custom_sections() {
        let toml_str = r#"
[directories]
archive_dir = "/tmp/sections"

[[sections]]
id = "risk-register"
prefix = "risk"
title = "Risk register"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.sections.len(), 1);
        assert_eq!(config.sections[0].prefix, "risk");
        assert_eq!(config.directories.archive_dir, PathBuf::from("/tmp/sections"));
        // Untouched tables keep their defaults.
        assert_eq!(config.discovery.patterns.len(), 6);
    }

    #[test]
    fn downloads_dir_override_wins() {
        let config = AppConfig {
            directories: DirectoriesConfig {
                downloads_dir: Some("/tmp/incoming".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = config.directories.resolve_downloads_dir().unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/incoming"));
    }
}
