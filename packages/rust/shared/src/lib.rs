//! Shared types, error model, and configuration for ReportDesk.
//!
//! This crate is the foundation depended on by all other ReportDesk crates.
//! It provides:
//! - [`ReportDeskError`] — the unified error type
//! - Domain types ([`Fragment`], [`SectionEntry`], timestamp helpers)
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DirectoriesConfig, DiscoveryConfig, TemplateConfig, WatchConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ReportDeskError, Result};
pub use types::{
    Fragment, SectionEntry, format_metadata_datetime, parse_fragment_timestamp, section_prefix,
};
