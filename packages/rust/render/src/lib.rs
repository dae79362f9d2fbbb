//! Report assembly for ReportDesk: latest-fragment selection, template
//! placeholder injection, and PDF rendering through interchangeable
//! backends with a manual fallback.

pub mod backend;
pub mod inject;
pub mod loader;
pub mod pipeline;

pub use backend::{Artifact, RenderBackend, Renderer};
pub use inject::{InjectOptions, inject};
pub use loader::{LoadedFragment, load_latest};
pub use pipeline::{GenerateConfig, GenerateResult, generate};
