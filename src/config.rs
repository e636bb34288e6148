//! Page sizes and rasterizer options.

use std::str::FromStr;

use crate::error::{Error, Result};

const MM_PER_INCH: f32 = 25.4;
const CSS_PX_PER_INCH: f32 = 96.0;
const PT_PER_INCH: f32 = 72.0;

/// Paper size selector accepted on the command line and by templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PaperSize {
    /// ISO A4, 210 × 297 mm.
    #[default]
    A4,
    /// US Letter, 8.5 × 11 in.
    Letter,
}

impl PaperSize {
    /// Look up a paper size by name, ignoring case and surrounding whitespace.
    ///
    /// Unknown or empty names fall back to [`PaperSize::A4`]; this never fails.
    ///
    /// ```rust
    /// use cvpress::PaperSize;
    ///
    /// assert_eq!(PaperSize::from_name("LETTER"), PaperSize::Letter);
    /// assert_eq!(PaperSize::from_name("tabloid"), PaperSize::A4);
    /// ```
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "letter" => PaperSize::Letter,
            _ => PaperSize::A4,
        }
    }

    /// Resolve a paper size name straight to its page geometry.
    pub fn resolve(name: &str) -> PageGeometry {
        Self::from_name(name).geometry()
    }

    /// The constant page geometry for this paper size.
    pub fn geometry(self) -> PageGeometry {
        match self {
            PaperSize::A4 => PageGeometry {
                css_size_name: "A4",
                css_width: "210mm",
                width_mm: 210.0,
                height_mm: 297.0,
            },
            PaperSize::Letter => PageGeometry {
                css_size_name: "letter",
                css_width: "216mm",
                width_mm: 215.9,
                height_mm: 279.4,
            },
        }
    }

    /// Lower-case selector, as exposed to templates as `paper_size`.
    pub fn as_str(self) -> &'static str {
        match self {
            PaperSize::A4 => "a4",
            PaperSize::Letter => "letter",
        }
    }
}

impl FromStr for PaperSize {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl std::fmt::Display for PaperSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical and CSS description of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Name used in CSS `@page { size: ... }`.
    pub css_size_name: &'static str,
    /// Page width as a CSS length, for templates sizing their container.
    pub css_width: &'static str,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageGeometry {
    pub fn width_px(&self) -> f32 {
        mm_to_px(self.width_mm)
    }

    pub fn height_px(&self) -> f32 {
        mm_to_px(self.height_mm)
    }

    pub fn width_pt(&self) -> f32 {
        mm_to_pt(self.width_mm)
    }

    pub fn height_pt(&self) -> f32 {
        mm_to_pt(self.height_mm)
    }
}

/// Convert millimetres to CSS pixels (96 dpi).
pub(crate) fn mm_to_px(mm: f32) -> f32 {
    mm / MM_PER_INCH * CSS_PX_PER_INCH
}

/// Convert millimetres to PDF points (72 dpi).
pub(crate) fn mm_to_pt(mm: f32) -> f32 {
    mm / MM_PER_INCH * PT_PER_INCH
}

/// Scale factor from CSS pixels to PDF points.
pub(crate) const PX_TO_PT: f32 = PT_PER_INCH / CSS_PX_PER_INCH;

/// Color scheme preference for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    /// Light color scheme.
    #[default]
    Light,
    /// Dark color scheme.
    Dark,
}

impl From<ColorScheme> for blitz_traits::shell::ColorScheme {
    fn from(scheme: ColorScheme) -> Self {
        match scheme {
            ColorScheme::Light => blitz_traits::shell::ColorScheme::Light,
            ColorScheme::Dark => blitz_traits::shell::ColorScheme::Dark,
        }
    }
}

/// Options handed to the rasterizer.
///
/// Use the builder methods to construct them:
///
/// ```rust
/// use cvpress::{PaperSize, PdfOptions};
///
/// let options = PdfOptions::new()
///     .paper_size(PaperSize::Letter)
///     .print_background(false)
///     .margin_mm(12.0);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct PdfOptions {
    /// Paper size used when the document does not declare its own.
    pub paper_size: PaperSize,

    /// Paint element backgrounds and the page background.
    ///
    /// When disabled only text is painted.
    pub print_background: bool,

    /// Let an `@page { size: ... }` rule in the document override
    /// [`PdfOptions::paper_size`].
    pub prefer_css_page_size: bool,

    /// Color scheme preference (light or dark mode).
    pub color_scheme: ColorScheme,

    /// Page background color as RGBA (default: white).
    pub background: [u8; 4],

    /// Blank band at the top and bottom of every page, in millimetres.
    pub margin_mm: f32,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            print_background: true,
            prefer_css_page_size: true,
            color_scheme: ColorScheme::Light,
            background: [255, 255, 255, 255],
            margin_mm: 0.0,
        }
    }
}

impl PdfOptions {
    /// Create options with default values.
    ///
    /// Defaults:
    /// - Paper size: A4
    /// - Background printing: on
    /// - CSS page size preferred: on
    /// - Color scheme: Light
    /// - Margin: none
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paper_size(mut self, paper_size: PaperSize) -> Self {
        self.paper_size = paper_size;
        self
    }

    pub fn print_background(mut self, enabled: bool) -> Self {
        self.print_background = enabled;
        self
    }

    pub fn prefer_css_page_size(mut self, enabled: bool) -> Self {
        self.prefer_css_page_size = enabled;
        self
    }

    /// Set the color scheme preference.
    ///
    /// This affects CSS media queries like `prefers-color-scheme`.
    pub fn color_scheme(mut self, scheme: ColorScheme) -> Self {
        self.color_scheme = scheme;
        self
    }

    /// Set the page background color as RGBA values.
    pub fn background(mut self, rgba: [u8; 4]) -> Self {
        self.background = rgba;
        self
    }

    pub fn margin_mm(mut self, margin: f32) -> Self {
        self.margin_mm = margin;
        self
    }

    /// Check that the options describe a printable page.
    pub fn validate(&self) -> Result<()> {
        self.validate_for(&self.paper_size.geometry())
    }

    /// Check the options against the page that will actually be printed,
    /// which differs from `paper_size` when the document's `@page` rule wins.
    pub fn validate_for(&self, geometry: &PageGeometry) -> Result<()> {
        if !self.margin_mm.is_finite() || self.margin_mm < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "margin must be a non-negative number of millimetres, got {}",
                self.margin_mm
            )));
        }

        let height = geometry.height_mm;
        if self.margin_mm * 2.0 >= height {
            return Err(Error::InvalidConfig(format!(
                "margin of {}mm leaves no printable height on a {}mm page",
                self.margin_mm, height
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_case_insensitive() {
        assert_eq!(PaperSize::resolve("A4"), PaperSize::A4.geometry());
        assert_eq!(PaperSize::resolve("a4"), PaperSize::A4.geometry());
        assert_eq!(PaperSize::resolve("LETTER"), PaperSize::Letter.geometry());
        assert_eq!(PaperSize::resolve(" Letter "), PaperSize::Letter.geometry());
    }

    #[test]
    fn test_resolve_falls_back_to_a4() {
        assert_eq!(PaperSize::resolve(""), PaperSize::A4.geometry());
        assert_eq!(PaperSize::resolve("unknown"), PaperSize::A4.geometry());
        assert_eq!(PaperSize::resolve("legal"), PaperSize::A4.geometry());
    }

    #[test]
    fn test_geometry_css_values() {
        let a4 = PaperSize::A4.geometry();
        assert_eq!(a4.css_size_name, "A4");
        assert_eq!(a4.css_width, "210mm");

        let letter = PaperSize::Letter.geometry();
        assert_eq!(letter.css_size_name, "letter");
        assert_eq!(letter.css_width, "216mm");
    }

    #[test]
    fn test_unit_conversions() {
        let a4 = PaperSize::A4.geometry();
        assert!((a4.width_pt() - 595.28).abs() < 0.1);
        assert!((a4.height_pt() - 841.89).abs() < 0.1);
        assert!((a4.width_px() - 793.7).abs() < 0.1);

        let letter = PaperSize::Letter.geometry();
        assert!((letter.width_pt() - 612.0).abs() < 0.1);
        assert!((letter.height_pt() - 792.0).abs() < 0.1);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("Letter".parse::<PaperSize>(), Ok(PaperSize::Letter));
        assert_eq!("bogus".parse::<PaperSize>(), Ok(PaperSize::A4));
        assert_eq!(PaperSize::Letter.to_string(), "letter");
    }

    #[test]
    fn test_options_validation() {
        assert!(PdfOptions::new().validate().is_ok());
        assert!(PdfOptions::new().margin_mm(-1.0).validate().is_err());
        assert!(PdfOptions::new().margin_mm(f32::NAN).validate().is_err());
        assert!(PdfOptions::new().margin_mm(150.0).validate().is_err());
        assert!(PdfOptions::new().margin_mm(20.0).validate().is_ok());
    }

    #[test]
    fn test_validate_for_uses_given_page() {
        // 140mm fits twice on A4 (297mm) but not on Letter (279.4mm).
        let options = PdfOptions::new().paper_size(PaperSize::A4).margin_mm(140.0);
        assert!(options.validate().is_ok());
        assert!(options.validate_for(&PaperSize::Letter.geometry()).is_err());
    }
}
