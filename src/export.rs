//! Writing rendered HTML and PDFs to disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::PdfOptions;
use crate::error::Result;
use crate::render::{HtmlSource, Rasterizer};

/// Prefix of the scratch HTML files written next to a document's assets.
const SCRATCH_PREFIX: &str = ".cvpress-";

/// Outcome of a successful [`export`].
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    pub pages: usize,
    pub bytes: usize,
}

/// Rasterize `html` and write the PDF to `output_path`.
///
/// When `base_dir` is given, relative references in the HTML (images,
/// stylesheets) resolve against it: the HTML is written to a scratch file in
/// that directory and rasterized from there. The scratch file is removed when
/// this function returns, whether it succeeds or fails.
///
/// Parent directories of `output_path` are created as needed.
pub fn export<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    html: &str,
    output_path: impl AsRef<Path>,
    options: &PdfOptions,
    base_dir: Option<&Path>,
) -> Result<ExportReport> {
    let output_path = output_path.as_ref();

    let document = match base_dir {
        Some(dir) => {
            let mut scratch = tempfile::Builder::new()
                .prefix(SCRATCH_PREFIX)
                .suffix(".html")
                .tempfile_in(dir)?;
            scratch.write_all(html.as_bytes())?;
            scratch.flush()?;
            tracing::debug!(scratch = %scratch.path().display(), "rasterizing from asset directory");

            // `scratch` is deleted on drop, including when rasterizing fails.
            rasterizer.rasterize(&HtmlSource::File(scratch.path()), options)?
        }
        None => rasterizer.rasterize(&HtmlSource::Memory(html), options)?,
    };

    create_parent_dir(output_path)?;
    fs::write(output_path, &document.bytes)?;
    tracing::info!(path = %output_path.display(), pages = document.pages, "wrote PDF");

    Ok(ExportReport {
        path: output_path.to_path_buf(),
        pages: document.pages,
        bytes: document.bytes.len(),
    })
}

/// Write the rendered HTML verbatim to `path`, creating parent directories.
pub fn write_html(html: &str, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    create_parent_dir(path)?;
    fs::write(path, html)?;
    tracing::info!(path = %path.display(), "wrote HTML");
    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(fs::create_dir_all(parent)?),
        _ => Ok(()),
    }
}
