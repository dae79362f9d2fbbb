//! Render backend selection and the manual fallback.
//!
//! Backends are external HTML-to-PDF converters probed once at startup, in a
//! fixed priority order, into an immutable selection. When no converter is
//! usable — or the selected one fails mid-render — the filled HTML itself is
//! persisted and returned with print-to-PDF instructions. Rendering never
//! surfaces a bare failure.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use reportdesk_shared::{ReportDeskError, Result};

/// Print-media override applied before rendering: hide interactive controls,
/// show static value representations.
const PRINT_CSS: &str = "\
@media print {
    .controls, .section-actions, .btn {
        display: none !important;
    }
    body {
        background-color: white;
        padding: 0;
    }
    .container {
        box-shadow: none;
        max-width: 100%;
    }
    .field-input {
        display: none !important;
    }
    .field-value {
        display: block !important;
    }
}
";

/// The artifact a render request produced.
#[derive(Debug, Clone)]
pub enum Artifact {
    /// A PDF written by a real backend.
    Pdf(PathBuf),
    /// The manual fallback: the filled HTML plus conversion instructions.
    FilledHtml {
        path: PathBuf,
        instructions: String,
    },
}

impl Artifact {
    /// Path of whatever was produced.
    pub fn path(&self) -> &Path {
        match self {
            Artifact::Pdf(path) => path,
            Artifact::FilledHtml { path, .. } => path,
        }
    }
}

/// A PDF-producing backend candidate.
pub trait RenderBackend: Send + Sync {
    /// Short name for logs and summaries.
    fn name(&self) -> &str;
    /// Whether the backend is usable on this machine.
    fn available(&self) -> bool;
    /// Render `html` into a PDF at `output`.
    fn render(&self, html: &str, output: &Path) -> Result<()>;
}

// ---------------------------------------------------------------------------
// External converter backends
// ---------------------------------------------------------------------------

/// How a converter binary is invoked.
#[derive(Debug, Clone, Copy)]
enum Invocation {
    /// `<binary> <input.html> <output.pdf>`
    InputOutput,
    /// `<binary> --headless --disable-gpu --print-to-pdf=<output> <input>`
    ChromiumHeadless,
}

/// A backend wrapping an external converter command.
struct CliBackend {
    name: &'static str,
    binary: &'static str,
    invocation: Invocation,
}

impl CliBackend {
    fn boxed(
        name: &'static str,
        binary: &'static str,
        invocation: Invocation,
    ) -> Box<dyn RenderBackend> {
        Box::new(Self {
            name,
            binary,
            invocation,
        })
    }
}

impl RenderBackend for CliBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn available(&self) -> bool {
        match Command::new(self.binary).arg("--version").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                debug!(backend = self.name, version = %version.trim(), "converter found");
                true
            }
            _ => false,
        }
    }

    fn render(&self, html: &str, output: &Path) -> Result<()> {
        // Converters want a file, not stdin; stage the HTML next to the
        // output and clean it up afterwards.
        let input = staging_path(output);
        std::fs::write(&input, html).map_err(|e| ReportDeskError::io(&input, e))?;

        let mut command = Command::new(self.binary);
        match self.invocation {
            Invocation::InputOutput => {
                command.arg(&input).arg(output);
            }
            Invocation::ChromiumHeadless => {
                command
                    .arg("--headless")
                    .arg("--disable-gpu")
                    .arg(format!("--print-to-pdf={}", output.display()))
                    .arg(&input);
            }
        }

        let result = command.output();
        let _ = std::fs::remove_file(&input);

        let output_status =
            result.map_err(|e| ReportDeskError::Render(format!("{}: {e}", self.binary)))?;

        if !output_status.status.success() {
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            return Err(ReportDeskError::Render(format!(
                "{} exited with {}: {}",
                self.binary,
                output_status.status,
                stderr.trim()
            )));
        }

        if !output.exists() {
            return Err(ReportDeskError::Render(format!(
                "{} reported success but produced no file at {}",
                self.binary,
                output.display()
            )));
        }

        Ok(())
    }
}

/// Where a backend stages its HTML input for a given output path.
fn staging_path(output: &Path) -> PathBuf {
    let parent = output.parent().unwrap_or_else(|| Path::new("."));
    parent.join(".reportdesk_render_input.html")
}

/// The fixed priority order of real backends.
pub fn default_backends() -> Vec<Box<dyn RenderBackend>> {
    vec![
        CliBackend::boxed("weasyprint", "weasyprint", Invocation::InputOutput),
        CliBackend::boxed("wkhtmltopdf", "wkhtmltopdf", Invocation::InputOutput),
        CliBackend::boxed("chromium", "chromium", Invocation::ChromiumHeadless),
        CliBackend::boxed(
            "chromium-browser",
            "chromium-browser",
            Invocation::ChromiumHeadless,
        ),
        CliBackend::boxed("google-chrome", "google-chrome", Invocation::ChromiumHeadless),
    ]
}

// ---------------------------------------------------------------------------
// Renderer (the selector)
// ---------------------------------------------------------------------------

/// An immutable backend selection, resolved once at startup.
pub struct Renderer {
    backends: Vec<Box<dyn RenderBackend>>,
    active: Option<usize>,
}

impl Renderer {
    /// Probe candidates in order; the first usable one becomes active.
    /// With none usable, every render goes through the manual fallback.
    pub fn probe(backends: Vec<Box<dyn RenderBackend>>) -> Self {
        let active = backends.iter().position(|b| b.available());

        match active {
            Some(i) => info!(backend = backends[i].name(), "render backend selected"),
            None => info!("no PDF converter found, using manual fallback"),
        }

        Self { backends, active }
    }

    /// Probe the default converter ladder.
    pub fn with_defaults() -> Self {
        Self::probe(default_backends())
    }

    /// Name of the active backend, `"manual"` when none is usable.
    pub fn active_name(&self) -> &str {
        match self.active {
            Some(i) => self.backends[i].name(),
            None => "manual",
        }
    }

    /// Render the filled HTML to `output`.
    ///
    /// The print-media override is injected first. A failing backend is
    /// caught and degrades to the manual fallback; the only error this can
    /// return is an I/O failure persisting the fallback HTML itself.
    pub fn render(&self, html: &str, output: &Path) -> Result<Artifact> {
        let styled = apply_print_style(html);

        if let Some(i) = self.active {
            let backend = &self.backends[i];
            match backend.render(&styled, output) {
                Ok(()) => {
                    info!(backend = backend.name(), pdf = %output.display(), "PDF rendered");
                    return Ok(Artifact::Pdf(output.to_path_buf()));
                }
                Err(e) => {
                    warn!(
                        backend = backend.name(),
                        error = %e,
                        "backend failed, falling back to manual conversion"
                    );
                }
            }
        }

        self.manual_fallback(&styled, output)
    }

    /// Persist the filled HTML and describe how to finish the job by hand.
    fn manual_fallback(&self, html: &str, output: &Path) -> Result<Artifact> {
        let path = output.with_extension("html");
        std::fs::write(&path, html).map_err(|e| ReportDeskError::io(&path, e))?;

        let instructions = format!(
            "Filled report saved to: {}\n\
             To produce the PDF manually:\n\
             1. Open the file in a browser\n\
             2. Press Ctrl+P (Cmd+P on macOS)\n\
             3. Choose \"Save as PDF\"\n\
             4. Save as: {}",
            path.display(),
            output
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "report.pdf".to_string()),
        );

        info!(html = %path.display(), "filled HTML persisted for manual conversion");
        Ok(Artifact::FilledHtml { path, instructions })
    }
}

/// Inject the print-media override into the document head.
fn apply_print_style(html: &str) -> String {
    let style_block = format!("<style>\n{PRINT_CSS}</style>");
    if html.contains("</head>") {
        html.replacen("</head>", &format!("{style_block}\n</head>"), 1)
    } else {
        format!("{style_block}\n{html}")
    }
}
