//! Error types for cvpress.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for cvpress operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a CV record into a PDF.
#[derive(Debug, Error)]
pub enum Error {
    /// The CV data file does not exist.
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The CV data file could not be parsed into a record.
    #[error("failed to parse {}: {message}", path.display())]
    InputParse { path: PathBuf, message: String },

    /// The requested template does not exist in the template directory.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// The template failed to compile or render.
    #[error("template rendering failed: {0}")]
    TemplateRender(String),

    /// Layout or PDF generation failed inside the rasterizer.
    #[error("PDF rendering failed: {0}")]
    RenderBackend(String),

    /// Font loading or embedding failed.
    #[error("font error: {0}")]
    Font(String),

    /// The requested output format feature is not enabled.
    #[error("output format '{0}' is not enabled; enable the '{0}' feature in Cargo.toml")]
    FormatNotEnabled(&'static str),

    /// Rasterizer options are invalid.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
