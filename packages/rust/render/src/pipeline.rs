//! End-to-end `generate` pipeline: Archive Store → load latest fragments →
//! inject into the template → render the artifact.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use tracing::{info, instrument, warn};

use reportdesk_ingest::ArchiveStore;
use reportdesk_shared::{AppConfig, Fragment, ReportDeskError, Result, SectionEntry};

use crate::backend::{Artifact, Renderer};
use crate::inject::{InjectOptions, inject};
use crate::loader::load_latest;

/// Configuration for one generate run.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// The Archive Store directory.
    pub archive_dir: PathBuf,
    /// The HTML template document.
    pub template_path: PathBuf,
    /// Directory receiving the artifact.
    pub output_dir: PathBuf,
    /// Artifact file name; auto-timestamped when `None`.
    pub output_name: Option<String>,
    /// The section table.
    pub sections: Vec<SectionEntry>,
    /// Template placeholder conventions.
    pub empty_marker: String,
    pub author_placeholder: String,
    pub date_placeholder: String,
}

impl GenerateConfig {
    /// Build from the application config, with optional CLI overrides.
    pub fn from_app(
        config: &AppConfig,
        output_name: Option<String>,
        template_path: Option<PathBuf>,
    ) -> Self {
        Self {
            archive_dir: config.directories.archive_dir.clone(),
            template_path: template_path.unwrap_or_else(|| config.template.path.clone()),
            output_dir: config.directories.output_dir.clone(),
            output_name,
            sections: config.sections.clone(),
            empty_marker: config.template.empty_marker.clone(),
            author_placeholder: config.template.author_placeholder.clone(),
            date_placeholder: config.template.date_placeholder.clone(),
        }
    }
}

/// Result of a generate run.
#[derive(Debug)]
pub struct GenerateResult {
    /// What was produced (PDF, or filled HTML plus instructions).
    pub artifact: Artifact,
    /// Name of the backend that produced it (`"manual"` for the fallback).
    pub backend: String,
    /// Sections whose latest fragment was injected.
    pub sections_loaded: Vec<String>,
    /// Sections with no contribution yet.
    pub sections_missing: Vec<String>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Run the assembly pipeline.
///
/// Sections without a contributed fragment are reported, not fatal; a
/// fragment that exists but cannot be parsed aborts the run. Rendering
/// itself always yields an artifact — backend failures degrade to the
/// filled-HTML fallback inside the renderer.
#[instrument(skip_all, fields(template = %config.template_path.display()))]
pub fn generate(config: &GenerateConfig, renderer: &Renderer) -> Result<GenerateResult> {
    let start = Instant::now();

    if !config.template_path.exists() {
        return Err(ReportDeskError::validation(format!(
            "template not found: {}",
            config.template_path.display()
        )));
    }

    // --- Phase 1: load the latest fragment per section ---
    let store = ArchiveStore::open(&config.archive_dir)?;
    let mut fragments: BTreeMap<String, Fragment> = BTreeMap::new();
    let mut missing = Vec::new();

    for entry in &config.sections {
        match load_latest(&store, &entry.id)? {
            Some(loaded) => {
                fragments.insert(entry.id.clone(), loaded.fragment);
            }
            None => {
                warn!(section = %entry.id, "no data contributed for section");
                missing.push(entry.id.clone());
            }
        }
    }

    // --- Phase 2: inject into the template ---
    let template = std::fs::read_to_string(&config.template_path)
        .map_err(|e| ReportDeskError::io(&config.template_path, e))?;

    let opts = InjectOptions {
        empty_marker: &config.empty_marker,
        author_placeholder: &config.author_placeholder,
        date_placeholder: &config.date_placeholder,
        sections: &config.sections,
    };
    let filled = inject(&template, &fragments, &opts)?;

    // --- Phase 3: render ---
    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| ReportDeskError::io(&config.output_dir, e))?;

    let output_name = config.output_name.clone().unwrap_or_else(|| {
        format!(
            "report_final_{}.pdf",
            Local::now().format("%Y%m%d_%H%M%S")
        )
    });
    let output_path = config.output_dir.join(output_name);

    let artifact = renderer.render(&filled, &output_path)?;

    let result = GenerateResult {
        backend: renderer.active_name().to_string(),
        sections_loaded: fragments.keys().cloned().collect(),
        sections_missing: missing,
        artifact,
        elapsed: start.elapsed(),
    };

    info!(
        backend = %result.backend,
        loaded = result.sections_loaded.len(),
        missing = result.sections_missing.len(),
        artifact = %result.artifact.path().display(),
        elapsed_ms = result.elapsed.as_millis(),
        "report generated"
    );

    Ok(result)
}
