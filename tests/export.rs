//! Integration tests for export: scratch-file cleanup and written outputs.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use cvpress::{
    export, generate_with, write_html, Error, GenerateRequest, HtmlSource, PaperSize, PdfDocument,
    PdfOptions, Rasterizer, Result,
};
use tempfile::TempDir;

/// Records what it was asked to rasterize and either fails or returns a
/// fixed fake PDF.
struct StubRasterizer {
    fail: bool,
    seen: RefCell<Option<(Option<PathBuf>, bool, String)>>,
}

impl StubRasterizer {
    fn ok() -> Self {
        Self {
            fail: false,
            seen: RefCell::new(None),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            seen: RefCell::new(None),
        }
    }

    /// Path rasterized from, whether it existed at the time, and its HTML.
    fn seen(&self) -> (Option<PathBuf>, bool, String) {
        self.seen.borrow().clone().expect("rasterizer was called")
    }
}

impl Rasterizer for StubRasterizer {
    fn rasterize(&self, source: &HtmlSource<'_>, options: &PdfOptions) -> Result<PdfDocument> {
        let path = match source {
            HtmlSource::File(path) => Some(path.to_path_buf()),
            HtmlSource::Memory(_) => None,
        };
        let existed = path.as_deref().is_some_and(Path::exists);
        let html = source.load()?.into_owned();
        *self.seen.borrow_mut() = Some((path, existed, html));

        if self.fail {
            return Err(Error::RenderBackend("engine exploded".into()));
        }
        Ok(PdfDocument {
            bytes: b"%PDF-1.7 fake".to_vec(),
            pages: 1,
            geometry: options.paper_size.geometry(),
        })
    }
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_scratch_file_removed_after_success() {
    let assets = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let pdf = out.path().join("cv.pdf");
    let stub = StubRasterizer::ok();

    let report = export(&stub, "<p>hi</p>", &pdf, &PdfOptions::new(), Some(assets.path())).unwrap();

    let (scratch, existed, html) = stub.seen();
    let scratch = scratch.expect("rasterized from a file");
    assert!(existed, "scratch file exists while rasterizing");
    assert_eq!(scratch.parent(), Some(assets.path()));
    assert_eq!(html, "<p>hi</p>");

    assert!(!scratch.exists(), "scratch file removed after export");
    assert!(dir_entries(assets.path()).is_empty());

    assert_eq!(report.path, pdf);
    assert_eq!(report.pages, 1);
    assert_eq!(fs::read(&pdf).unwrap(), b"%PDF-1.7 fake");
}

#[test]
fn test_scratch_file_removed_after_failure() {
    let assets = TempDir::new().unwrap();
    let pdf = assets.path().join("cv.pdf");
    let stub = StubRasterizer::failing();

    let err = export(&stub, "<p>hi</p>", &pdf, &PdfOptions::new(), Some(assets.path())).unwrap_err();
    assert!(matches!(err, Error::RenderBackend(_)));

    let (scratch, existed, _) = stub.seen();
    assert!(existed);
    assert!(!scratch.unwrap().exists(), "scratch file removed after failure");
    assert!(dir_entries(assets.path()).is_empty(), "no PDF and no scratch left");
}

#[test]
fn test_without_base_dir_rasterizes_from_memory() {
    let out = TempDir::new().unwrap();
    let stub = StubRasterizer::ok();

    export(&stub, "<p>mem</p>", out.path().join("cv.pdf"), &PdfOptions::new(), None).unwrap();

    let (path, _, html) = stub.seen();
    assert!(path.is_none());
    assert_eq!(html, "<p>mem</p>");
}

#[test]
fn test_export_creates_parent_directories() {
    let out = TempDir::new().unwrap();
    let pdf = out.path().join("nested").join("deeper").join("cv.pdf");

    export(&StubRasterizer::ok(), "<p/>", &pdf, &PdfOptions::new(), None).unwrap();
    assert!(pdf.exists());
}

#[test]
fn test_missing_base_dir_is_io_error() {
    let out = TempDir::new().unwrap();
    let missing = out.path().join("not-there");

    let err = export(
        &StubRasterizer::ok(),
        "<p/>",
        out.path().join("cv.pdf"),
        &PdfOptions::new(),
        Some(&missing),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_write_html_is_verbatim() {
    let out = TempDir::new().unwrap();
    let path = out.path().join("html").join("cv.html");
    let html = "<!DOCTYPE html>\n<p>✉ <a href=\"mailto:a@b.io\">a@b.io</a></p>\n";

    write_html(html, &path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), html);
}

#[test]
fn test_generate_writes_identical_html() {
    let templates = TempDir::new().unwrap();
    fs::write(
        templates.path().join("cv.html"),
        "<p>{{ name }}</p><span>{{ email|linkify }}</span><i>{{ page_size }}</i>",
    )
    .unwrap();

    let work = TempDir::new().unwrap();
    let input = work.path().join("cv.yaml");
    fs::write(&input, "name: Jane\nemail: \"✉ jane@example.com\"\n").unwrap();

    let out = work.path().join("out");
    let request = GenerateRequest {
        input,
        template: "cv.html".into(),
        templates_dir: templates.path().to_path_buf(),
        pdf_path: out.join("cv.pdf"),
        html_path: Some(out.join("cv.html")),
        options: PdfOptions::new().paper_size(PaperSize::Letter),
    };

    let stub = StubRasterizer::ok();
    let report = generate_with(&stub, &request).unwrap();

    let (_, _, rasterized) = stub.seen();
    let written = fs::read_to_string(out.join("cv.html")).unwrap();
    assert_eq!(written, rasterized, "HTML file matches what was rasterized");
    assert!(written.contains(r#"href="mailto:jane@example.com""#));
    assert!(written.contains("<i>letter</i>"));

    assert_eq!(report.html, Some(out.join("cv.html")));
    assert_eq!(dir_entries(&out), ["cv.html", "cv.pdf"]);
}
