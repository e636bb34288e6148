//! # cvpress
//!
//! Turn a CV written as YAML or JSON into a paginated PDF, without a browser.
//!
//! The pipeline has three stages:
//!
//! 1. [`Record::load`] reads the data file into a schema-free [`Record`].
//! 2. [`Renderer`] merges the record into a Jinja template. Templates get the
//!    [`linkify`] filter, which turns contact details such as
//!    `"✉ jane@example.com"` into clickable links.
//! 3. [`export`] lays the HTML out with [Blitz](https://github.com/DioxusLabs/blitz)
//!    and paints it onto A4 or Letter pages with Krilla.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cvpress::{export, BlitzRasterizer, PaperSize, PdfOptions, Record, Renderer};
//!
//! let record = Record::load("cv.yaml")?;
//! let renderer = Renderer::new("templates");
//! let html = renderer.render("modern.html.j2", &record, PaperSize::A4)?;
//!
//! let options = PdfOptions::new().paper_size(PaperSize::A4);
//! export(&BlitzRasterizer::new(), &html, "out/cv.pdf", &options, None)?;
//! # Ok::<(), cvpress::Error>(())
//! ```
//!
//! Or run everything at once with [`generate`].

mod config;
mod error;
mod export;
mod linkify;
mod record;
mod render;
mod template;

pub use config::{ColorScheme, PageGeometry, PaperSize, PdfOptions};
pub use error::{Error, Result};
pub use export::{export, write_html, ExportReport};
pub use linkify::linkify;
pub use record::{DataFormat, Record};
pub use render::{css_page_size, BlitzRasterizer, HtmlSource, PdfDocument, Rasterizer};
pub use template::Renderer;

use std::path::{Path, PathBuf};

/// Everything [`generate`] needs for one run.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// CV data file (`.yaml`, `.yml` or `.json`).
    pub input: PathBuf,
    /// Template name, relative to `templates_dir`.
    pub template: String,
    pub templates_dir: PathBuf,
    /// Destination of the PDF.
    pub pdf_path: PathBuf,
    /// Optional destination of the rendered HTML.
    pub html_path: Option<PathBuf>,
    pub options: PdfOptions,
}

/// Files produced by [`generate`].
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub pdf: ExportReport,
    pub html: Option<PathBuf>,
}

/// Load, render and export in one call.
///
/// Relative references in the template resolve against the PDF's directory,
/// which is where the HTML copy lands as well.
///
/// # Errors
///
/// Propagates the first failure of any stage unchanged; nothing is retried.
pub fn generate(request: &GenerateRequest) -> Result<GenerateReport> {
    generate_with(&BlitzRasterizer::new(), request)
}

/// [`generate`] with a caller-supplied rasterizer.
pub fn generate_with<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    request: &GenerateRequest,
) -> Result<GenerateReport> {
    let record = Record::load(&request.input)?;

    let renderer = Renderer::new(&request.templates_dir);
    let html = renderer.render(&request.template, &record, request.options.paper_size)?;

    let base_dir = asset_dir(&request.pdf_path);
    std::fs::create_dir_all(&base_dir)?;
    let pdf = export(
        rasterizer,
        &html,
        &request.pdf_path,
        &request.options,
        Some(&base_dir),
    )?;

    if let Some(html_path) = &request.html_path {
        write_html(&html, html_path)?;
    }

    Ok(GenerateReport {
        pdf,
        html: request.html_path.clone(),
    })
}

fn asset_dir(pdf_path: &Path) -> PathBuf {
    match pdf_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
