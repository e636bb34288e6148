//! HTML to PDF rasterization.
//!
//! [`Rasterizer`] is the seam between the pipeline and the engine that turns
//! HTML into PDF pages. [`BlitzRasterizer`] is the production engine: Blitz
//! parses, styles and lays out the document, and Krilla paints it onto PDF
//! pages (see `pdf.rs`). Linked `file://` resources are read from disk
//! (see `net.rs`).

mod net;
mod pdf;

use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use blitz_dom::DocumentConfig;
use blitz_html::HtmlDocument;
use blitz_traits::shell::Viewport;
use regex::Regex;

use crate::config::{mm_to_px, PageGeometry, PaperSize, PdfOptions};
use crate::error::Result;
use net::FileProvider;

static CSS_PAGE_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)@page[^{]*\{[^}]*\bsize\s*:\s*(A4|letter)\b")
        .expect("BUG: invalid CSS_PAGE_SIZE_RE regex literal")
});

/// Where the rasterizer reads the HTML from.
#[derive(Debug, Clone, Copy)]
pub enum HtmlSource<'a> {
    /// HTML held in memory; relative references have nothing to resolve
    /// against.
    Memory(&'a str),
    /// An HTML file; relative references resolve against its directory.
    File(&'a Path),
}

impl<'a> HtmlSource<'a> {
    /// Read the HTML text.
    pub fn load(&self) -> Result<Cow<'a, str>> {
        match *self {
            HtmlSource::Memory(html) => Ok(Cow::Borrowed(html)),
            HtmlSource::File(path) => Ok(Cow::Owned(fs::read_to_string(path)?)),
        }
    }

    /// `file://` URL of the source file, used as the document base URL.
    pub fn base_url(&self) -> Option<String> {
        match *self {
            HtmlSource::Memory(_) => None,
            HtmlSource::File(path) => {
                let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
                url::Url::from_file_path(path).ok().map(String::from)
            }
        }
    }
}

/// A finished PDF.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub bytes: Vec<u8>,
    pub pages: usize,
    /// Geometry the pages were laid out with, after any `@page` override.
    pub geometry: PageGeometry,
}

/// Converts HTML into a paginated PDF.
pub trait Rasterizer {
    fn rasterize(&self, source: &HtmlSource<'_>, options: &PdfOptions) -> Result<PdfDocument>;
}

/// Chromium-free rasterizer built on Blitz layout and Krilla PDF output.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlitzRasterizer;

impl BlitzRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl Rasterizer for BlitzRasterizer {
    fn rasterize(&self, source: &HtmlSource<'_>, options: &PdfOptions) -> Result<PdfDocument> {
        let html = source.load()?;
        let paper_size = effective_paper_size(&html, options);
        let geometry = paper_size.geometry();
        options.validate_for(&geometry)?;

        let (provider, resources) = FileProvider::new();
        let mut document = create_document(&html, source.base_url(), provider, &geometry, options);
        let loaded = resources.drain_into(&mut document);
        if loaded > 0 {
            tracing::debug!(loaded, "applied linked resources");
        }
        document.resolve(0.0);

        let (bytes, pages) = pdf::render_to_pdf(&document, &geometry, options)?;
        tracing::debug!(pages, paper = %paper_size, bytes = bytes.len(), "rasterized document");

        Ok(PdfDocument {
            bytes,
            pages,
            geometry,
        })
    }
}

/// The paper size the document asks for through `@page { size: ... }`.
pub fn css_page_size(html: &str) -> Option<PaperSize> {
    CSS_PAGE_SIZE_RE
        .captures(html)
        .map(|caps| PaperSize::from_name(&caps[1]))
}

fn effective_paper_size(html: &str, options: &PdfOptions) -> PaperSize {
    if !options.prefer_css_page_size {
        return options.paper_size;
    }
    match css_page_size(html) {
        Some(size) if size != options.paper_size => {
            tracing::debug!(requested = %options.paper_size, css = %size, "using @page size");
            size
        }
        _ => options.paper_size,
    }
}

/// Create and configure a Blitz document laid out one printable page wide.
fn create_document(
    html: &str,
    base_url: Option<String>,
    provider: Arc<FileProvider>,
    geometry: &PageGeometry,
    options: &PdfOptions,
) -> HtmlDocument {
    let printable_height = geometry.height_px() - 2.0 * mm_to_px(options.margin_mm);
    let viewport = Viewport::new(
        geometry.width_px().round() as u32,
        printable_height.round().max(1.0) as u32,
        1.0,
        options.color_scheme.into(),
    );

    let doc_config = DocumentConfig {
        viewport: Some(viewport),
        base_url,
        net_provider: Some(provider),
        ..Default::default()
    };

    HtmlDocument::from_html(html, doc_config)
}
