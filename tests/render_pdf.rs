//! Integration tests for PDF rasterization with the Blitz engine.

#![cfg(feature = "pdf")]

use std::fs;

use cvpress::{export, BlitzRasterizer, HtmlSource, PaperSize, PdfOptions, Rasterizer};
use tempfile::TempDir;

/// PDF magic bytes
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Check if bytes represent a valid PDF by looking for key markers.
fn is_valid_pdf(data: &[u8]) -> bool {
    if !data.starts_with(PDF_SIGNATURE) {
        return false;
    }

    let tail = if data.len() > 1024 {
        &data[data.len() - 1024..]
    } else {
        data
    };

    tail.windows(5).any(|w| w == b"%%EOF")
}

fn rasterize(html: &str, options: &PdfOptions) -> cvpress::PdfDocument {
    BlitzRasterizer::new()
        .rasterize(&HtmlSource::Memory(html), options)
        .expect("rasterize should succeed")
}

#[test]
fn test_basic_cv_page() {
    let html = r#"
        <html>
        <body style="font-family: sans-serif;">
            <h1>Jane Doe</h1>
            <p>✉ <a href="mailto:jane@example.com">jane@example.com</a></p>
        </body>
        </html>
    "#;

    let doc = rasterize(html, &PdfOptions::new());
    assert!(is_valid_pdf(&doc.bytes), "output should be valid PDF structure");
    assert_eq!(doc.pages, 1);
    assert_eq!(doc.geometry, PaperSize::A4.geometry());
}

#[test]
fn test_empty_document_still_has_a_page() {
    let doc = rasterize("", &PdfOptions::new());
    assert!(is_valid_pdf(&doc.bytes));
    assert_eq!(doc.pages, 1);
}

#[test]
fn test_letter_geometry() {
    let options = PdfOptions::new().paper_size(PaperSize::Letter);
    let doc = rasterize("<p>Letter</p>", &options);
    assert_eq!(doc.geometry.css_size_name, "letter");
    assert!(is_valid_pdf(&doc.bytes));
}

#[test]
fn test_css_page_size_overrides_option() {
    let html = "<html><head><style>@page { size: letter; }</style></head><body>x</body></html>";

    let doc = rasterize(html, &PdfOptions::new().paper_size(PaperSize::A4));
    assert_eq!(doc.geometry, PaperSize::Letter.geometry());

    let doc = rasterize(
        html,
        &PdfOptions::new()
            .paper_size(PaperSize::A4)
            .prefer_css_page_size(false),
    );
    assert_eq!(doc.geometry, PaperSize::A4.geometry());
}

#[test]
fn test_tall_content_is_paginated() {
    // An A4 page is about 1123 CSS pixels tall.
    let html = r#"
        <html>
        <body style="margin: 0;">
            <div style="height: 1000px; background: #eef;">one</div>
            <div style="height: 1000px; background: #fee;">two</div>
            <div style="height: 1000px; background: #efe;">three</div>
        </body>
        </html>
    "#;

    let doc = rasterize(html, &PdfOptions::new());
    assert!(is_valid_pdf(&doc.bytes));
    assert_eq!(doc.pages, 3);
}

#[test]
fn test_margins_add_pages() {
    let html = r#"<html><body style="margin: 0;"><div style="height: 1100px;"></div></body></html>"#;

    assert_eq!(rasterize(html, &PdfOptions::new()).pages, 1);
    assert_eq!(rasterize(html, &PdfOptions::new().margin_mm(20.0)).pages, 2);
}

#[test]
fn test_backgrounds_can_be_disabled() {
    let html = r#"
        <html>
        <body style="background: linear-gradient(90deg, #1f3a5f, #3c6e9f);">
            <div style="background: red; border-radius: 8px; width: 100px; height: 100px;"></div>
        </body>
        </html>
    "#;

    let with = rasterize(html, &PdfOptions::new());
    let without = rasterize(html, &PdfOptions::new().print_background(false));
    assert!(is_valid_pdf(&with.bytes));
    assert!(is_valid_pdf(&without.bytes));
    assert!(
        without.bytes.len() < with.bytes.len(),
        "skipping backgrounds should produce less content"
    );
}

#[test]
fn test_export_with_asset_directory() {
    let assets = TempDir::new().unwrap();
    let pdf = assets.path().join("cv.pdf");
    let html = r#"<html><body><img src="photo.png"><p>Jane</p></body></html>"#;

    let report = export(
        &BlitzRasterizer::new(),
        html,
        &pdf,
        &PdfOptions::new(),
        Some(assets.path()),
    )
    .unwrap();

    assert_eq!(report.pages, 1);
    assert!(is_valid_pdf(&fs::read(&pdf).unwrap()));
    let leftovers: Vec<_> = fs::read_dir(assets.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|name| name != "cv.pdf")
        .collect();
    assert!(leftovers.is_empty(), "scratch HTML should be gone: {leftovers:?}");
}

#[test]
fn test_unicode_content() {
    let html = r#"<html><body><p>Zoë Šimková · 日本語 · ✉ ☎</p></body></html>"#;
    let doc = rasterize(html, &PdfOptions::new());
    assert!(is_valid_pdf(&doc.bytes), "unicode content should render");
}

#[test]
fn test_linked_stylesheet_resolves_against_asset_directory() {
    let assets = TempDir::new().unwrap();
    fs::write(
        assets.path().join("cv.css"),
        "body { margin: 0; } .tall { height: 3000px; }",
    )
    .unwrap();
    let html = r#"<html><head><link rel="stylesheet" href="cv.css"></head>
        <body><div class="tall">tall</div></body></html>"#;

    let report = export(
        &BlitzRasterizer::new(),
        html,
        assets.path().join("cv.pdf"),
        &PdfOptions::new(),
        Some(assets.path()),
    )
    .unwrap();
    assert_eq!(report.pages, 3, "linked stylesheet should set the height");
}

#[test]
fn test_margin_checked_against_css_page_size() {
    // Fits on the requested A4 page, but the document asks for Letter.
    let html = "<html><head><style>@page { size: letter }</style></head><body>x</body></html>";
    let options = PdfOptions::new().paper_size(PaperSize::A4).margin_mm(140.0);

    let err = BlitzRasterizer::new()
        .rasterize(&HtmlSource::Memory(html), &options)
        .unwrap_err();
    assert!(matches!(err, cvpress::Error::InvalidConfig(_)));

    let doc = rasterize(html, &options.prefer_css_page_size(false));
    assert_eq!(doc.geometry, PaperSize::A4.geometry());
}
