//! PDF painting using Krilla.
//!
//! The laid-out Blitz document is one page wide and arbitrarily tall. It is
//! cut into page-height bands; every PDF page paints the whole tree shifted
//! up to its band and clipped to the printable area, so CSS pixels map onto
//! points through a single page transform.
//!
//! Supports:
//! - Background colors and linear gradients (when background printing is on)
//! - Border-radius (rounded corners via clip paths)
//! - Text rendering with font embedding

use crate::config::{PageGeometry, PdfOptions};
use crate::error::{Error, Result};

#[cfg(feature = "pdf")]
use crate::config::{mm_to_px, PX_TO_PT};
#[cfg(feature = "pdf")]
use blitz_dom::{BaseDocument, Node};
#[cfg(feature = "pdf")]
use blitz_html::HtmlDocument;
#[cfg(feature = "pdf")]
use krilla::color::rgb;
#[cfg(feature = "pdf")]
use krilla::geom::{Path, PathBuilder, Point, Size, Transform};
#[cfg(feature = "pdf")]
use krilla::num::NormalizedF32;
#[cfg(feature = "pdf")]
use krilla::page::PageSettings;
#[cfg(feature = "pdf")]
use krilla::paint::{Fill, FillRule, LinearGradient, SpreadMethod, Stop};
#[cfg(feature = "pdf")]
use krilla::surface::Surface;
#[cfg(feature = "pdf")]
use krilla::text::{Font, GlyphId, KrillaGlyph};
#[cfg(feature = "pdf")]
use krilla::Document;
#[cfg(feature = "pdf")]
use parley::PositionedLayoutItem;
#[cfg(feature = "pdf")]
use std::collections::HashMap;
#[cfg(feature = "pdf")]
use style::color::{AbsoluteColor, ColorSpace};
#[cfg(feature = "pdf")]
use style::values::computed::{BorderCornerRadius, CSSPixelLength, LengthPercentage, Percentage};
#[cfg(feature = "pdf")]
use style::values::generics::color::GenericColor;
#[cfg(feature = "pdf")]
use style::values::generics::image::{GenericGradient, GenericGradientItem, GenericImage, GradientFlags};
#[cfg(feature = "pdf")]
use style::values::specified::position::{HorizontalPositionKeyword, VerticalPositionKeyword};

/// Tolerance for layout heights that overshoot a page by rounding noise.
#[cfg(feature = "pdf")]
const PAGE_SLACK_PX: f32 = 0.5;

#[cfg(feature = "pdf")]
type StopColor = GenericColor<Percentage>;

#[cfg(feature = "pdf")]
type GradientItem = GenericGradientItem<StopColor, LengthPercentage>;

#[cfg(feature = "pdf")]
#[derive(Clone, Copy)]
struct Rgb {
    r: u8,
    g: u8,
    b: u8,
}

#[cfg(feature = "pdf")]
impl Rgb {
    fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn from_unit(r: f32, g: f32, b: f32) -> Self {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u8;
        Self::new(channel(r), channel(g), channel(b))
    }

    fn fill(self) -> Fill {
        Fill {
            paint: rgb::Color::new(self.r, self.g, self.b).into(),
            opacity: NormalizedF32::ONE,
            rule: FillRule::NonZero,
        }
    }
}

/// Per-corner (horizontal, vertical) radii of a rounded rectangle.
#[cfg(feature = "pdf")]
#[derive(Clone, Copy, Default)]
struct BorderRadii {
    top_left: (f32, f32),
    top_right: (f32, f32),
    bottom_right: (f32, f32),
    bottom_left: (f32, f32),
}

#[cfg(feature = "pdf")]
impl BorderRadii {
    fn has_any_radius(&self) -> bool {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
            .iter()
            .any(|&corner| corner != (0.0, 0.0))
    }
}

/// Vertical slice of the document, in CSS pixels, that one page shows.
#[cfg(feature = "pdf")]
#[derive(Clone, Copy)]
struct PageBand {
    top: f32,
    bottom: f32,
}

#[cfg(feature = "pdf")]
impl PageBand {
    fn intersects(&self, y: f32, height: f32) -> bool {
        y < self.bottom && y + height > self.top
    }
}

/// Everything painting needs that stays fixed for one page.
#[cfg(feature = "pdf")]
struct PageContext<'d> {
    doc: &'d BaseDocument,
    band: PageBand,
    print_background: bool,
}

/// Fonts are shared across pages so each face is embedded once.
#[cfg(feature = "pdf")]
type FontCache = HashMap<u64, Font>;

/// Number of pages needed to show `content_height` in bands of
/// `page_height`. Always at least one.
#[cfg(feature = "pdf")]
fn page_count(content_height: f32, page_height: f32) -> usize {
    if page_height <= 0.0 || content_height <= page_height + PAGE_SLACK_PX {
        return 1;
    }
    ((content_height - PAGE_SLACK_PX) / page_height).ceil().max(1.0) as usize
}

/// Paint a laid-out document onto as many pages as it needs.
///
/// Returns the PDF bytes and the page count.
#[cfg(feature = "pdf")]
pub fn render_to_pdf(
    document: &HtmlDocument,
    geometry: &PageGeometry,
    options: &PdfOptions,
) -> Result<(Vec<u8>, usize)> {
    let doc = document.as_ref();
    let root = doc.root_element();

    let width_pt = geometry.width_pt();
    let height_pt = geometry.height_pt();
    let margin_px = mm_to_px(options.margin_mm);
    let printable_px = geometry.height_px() - 2.0 * margin_px;
    let pages = page_count(root.final_layout.size.height, printable_px);

    let size = Size::from_wh(width_pt, height_pt)
        .ok_or_else(|| Error::RenderBackend("invalid page dimensions".to_string()))?;

    let mut pdf_doc = Document::new();
    let mut fonts = FontCache::new();

    for index in 0..pages {
        let mut page = pdf_doc.start_page_with(PageSettings::new(size));
        let mut surface = page.surface();

        if options.print_background {
            let [r, g, b, a] = options.background;
            if a > 0 {
                fill_rect(&mut surface, 0.0, 0.0, width_pt, height_pt, Rgb::new(r, g, b));
            }
        }

        let top = index as f32 * printable_px;
        let ctx = PageContext {
            doc,
            band: PageBand {
                top,
                bottom: top + printable_px,
            },
            print_background: options.print_background,
        };

        let clip = rect_path(0.0, margin_px * PX_TO_PT, width_pt, printable_px * PX_TO_PT);
        if let Some(clip) = &clip {
            surface.push_clip_path(clip, &FillRule::NonZero);
        }
        surface.push_transform(&Transform::from_row(
            PX_TO_PT,
            0.0,
            0.0,
            PX_TO_PT,
            0.0,
            (margin_px - top) * PX_TO_PT,
        ));

        let painted = paint_node(&mut surface, &ctx, root, 0.0, 0.0, &mut fonts);

        surface.pop();
        if clip.is_some() {
            surface.pop();
        }
        surface.finish();
        page.finish();

        painted?;
    }

    let bytes = pdf_doc
        .finish()
        .map_err(|e| Error::RenderBackend(format!("{:?}", e)))?;
    Ok((bytes, pages))
}

#[cfg(feature = "pdf")]
fn rect_path(x: f32, y: f32, w: f32, h: f32) -> Option<Path> {
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    let mut builder = PathBuilder::new();
    builder.move_to(x, y);
    builder.line_to(x + w, y);
    builder.line_to(x + w, y + h);
    builder.line_to(x, y + h);
    builder.close();
    builder.finish()
}

#[cfg(feature = "pdf")]
fn fill_rect(surface: &mut Surface, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
    if let Some(path) = rect_path(x, y, w, h) {
        surface.set_fill(Some(color.fill()));
        surface.draw_path(&path);
    }
}

/// Recursively paint a node and its children.
///
/// Boxes outside the page band are not painted, but their children are
/// still visited since they may overflow into the band.
#[cfg(feature = "pdf")]
fn paint_node(
    surface: &mut Surface,
    ctx: &PageContext<'_>,
    node: &Node,
    offset_x: f32,
    offset_y: f32,
    fonts: &mut FontCache,
) -> Result<()> {
    let layout = &node.final_layout;
    let x = offset_x + layout.location.x;
    let y = offset_y + layout.location.y;
    let width = layout.size.width;
    let height = layout.size.height;

    let visible = width > 0.0 && height > 0.0 && ctx.band.intersects(y, height);
    if !visible {
        return paint_children(surface, ctx, node, x, y, fonts);
    }

    let style = node.primary_styles();

    let radii = style
        .as_ref()
        .map(|style| extract_border_radii(style, width, height))
        .unwrap_or_default();
    let clipped = match radii
        .has_any_radius()
        .then(|| rounded_rect_path(x, y, width, height, &radii))
        .flatten()
    {
        Some(clip_path) => {
            surface.push_clip_path(&clip_path, &FillRule::NonZero);
            true
        }
        None => false,
    };

    if ctx.print_background {
        if let Some(style) = &style {
            paint_background(surface, style, x, y, width, height);
        }
    }

    if let Some(text_layout) = node
        .element_data()
        .and_then(|data| data.inline_layout_data.as_ref())
    {
        paint_text(surface, ctx.doc, text_layout, x, y, fonts)?;
    }

    paint_children(surface, ctx, node, x, y, fonts)?;

    if clipped {
        surface.pop();
    }

    Ok(())
}

#[cfg(feature = "pdf")]
fn paint_children(
    surface: &mut Surface,
    ctx: &PageContext<'_>,
    node: &Node,
    x: f32,
    y: f32,
    fonts: &mut FontCache,
) -> Result<()> {
    for child_id in node.children.iter() {
        if let Some(child) = ctx.doc.get_node(*child_id) {
            paint_node(surface, ctx, child, x, y, fonts)?;
        }
    }
    Ok(())
}

/// Background color first, then any linear gradients on top of it.
#[cfg(feature = "pdf")]
fn paint_background(
    surface: &mut Surface,
    style: &style::properties::ComputedValues,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) {
    if let Some((r, g, b, a)) = extract_color(&style.clone_background_color()) {
        if a > 0.0 {
            fill_rect(surface, x, y, width, height, Rgb::from_unit(r, g, b));
        }
    }

    let current_color = style
        .get_inherited_text()
        .color
        .to_color_space(ColorSpace::Srgb);

    for image in style.get_background().background_image.0.iter() {
        let GenericImage::Gradient(gradient) = image else {
            continue;
        };
        // TODO: radial and conic gradients
        if let GenericGradient::Linear {
            direction,
            items,
            flags,
            ..
        } = gradient.as_ref()
        {
            if let Some(linear) =
                linear_gradient(direction, items, *flags, width, height, &current_color)
            {
                fill_gradient_rect(surface, x, y, width, height, linear);
            }
        }
    }
}

#[cfg(feature = "pdf")]
fn extract_border_radii(
    style: &style::properties::ComputedValues,
    width: f32,
    height: f32,
) -> BorderRadii {
    let border = style.get_border();
    let basis_w = CSSPixelLength::new(width);
    let basis_h = CSSPixelLength::new(height);

    let resolve = |radius: &BorderCornerRadius| -> (f32, f32) {
        (
            radius.0.width.0.resolve(basis_w).px(),
            radius.0.height.0.resolve(basis_h).px(),
        )
    };

    BorderRadii {
        top_left: resolve(&border.border_top_left_radius),
        top_right: resolve(&border.border_top_right_radius),
        bottom_right: resolve(&border.border_bottom_right_radius),
        bottom_left: resolve(&border.border_bottom_left_radius),
    }
}

/// Rounded rectangle with each corner approximated by one cubic bezier.
#[cfg(feature = "pdf")]
fn rounded_rect_path(x: f32, y: f32, w: f32, h: f32, radii: &BorderRadii) -> Option<Path> {
    const KAPPA: f32 = 0.5522847498;
    let k = 1.0 - KAPPA;

    let clamp = |(rx, ry): (f32, f32)| (rx.clamp(0.0, w / 2.0), ry.clamp(0.0, h / 2.0));
    let tl = clamp(radii.top_left);
    let tr = clamp(radii.top_right);
    let br = clamp(radii.bottom_right);
    let bl = clamp(radii.bottom_left);
    let round = |(rx, ry): (f32, f32)| rx > 0.0 && ry > 0.0;

    let mut builder = PathBuilder::new();
    builder.move_to(x + tl.0, y);

    builder.line_to(x + w - tr.0, y);
    if round(tr) {
        builder.cubic_to(x + w - tr.0 * k, y, x + w, y + tr.1 * k, x + w, y + tr.1);
    }

    builder.line_to(x + w, y + h - br.1);
    if round(br) {
        builder.cubic_to(x + w, y + h - br.1 * k, x + w - br.0 * k, y + h, x + w - br.0, y + h);
    }

    builder.line_to(x + bl.0, y + h);
    if round(bl) {
        builder.cubic_to(x + bl.0 * k, y + h, x, y + h - bl.1 * k, x, y + h - bl.1);
    }

    builder.line_to(x, y + tl.1);
    if round(tl) {
        builder.cubic_to(x, y + tl.1 * k, x + tl.0 * k, y, x + tl.0, y);
    }

    builder.close();
    builder.finish()
}

/// Start and end points of a CSS gradient line inside a `w` × `h` box.
#[cfg(feature = "pdf")]
fn gradient_line(
    direction: &style::values::computed::LineDirection,
    w: f32,
    h: f32,
) -> (f32, f32, f32, f32) {
    use style::values::computed::LineDirection;

    match direction {
        LineDirection::Angle(angle) => {
            // CSS angles run clockwise from "to top".
            let radians = -angle.radians() + std::f32::consts::PI;
            let (sin, cos) = radians.sin_cos();
            let (cx, cy) = (w / 2.0, h / 2.0);
            let reach = w / 2.0 * sin.abs() + h / 2.0 * cos.abs();
            (cx - reach * sin, cy - reach * cos, cx + reach * sin, cy + reach * cos)
        }
        LineDirection::Horizontal(HorizontalPositionKeyword::Right) => (0.0, h / 2.0, w, h / 2.0),
        LineDirection::Horizontal(HorizontalPositionKeyword::Left) => (w, h / 2.0, 0.0, h / 2.0),
        LineDirection::Vertical(VerticalPositionKeyword::Top) => (w / 2.0, h, w / 2.0, 0.0),
        LineDirection::Vertical(VerticalPositionKeyword::Bottom) => (w / 2.0, 0.0, w / 2.0, h),
        LineDirection::Corner(horizontal, vertical) => {
            let (x1, x2) = match horizontal {
                HorizontalPositionKeyword::Right => (0.0, w),
                HorizontalPositionKeyword::Left => (w, 0.0),
            };
            let (y1, y2) = match vertical {
                VerticalPositionKeyword::Top => (h, 0.0),
                VerticalPositionKeyword::Bottom => (0.0, h),
            };
            (x1, y1, x2, y2)
        }
    }
}

#[cfg(feature = "pdf")]
fn linear_gradient(
    direction: &style::values::computed::LineDirection,
    items: &[GradientItem],
    flags: GradientFlags,
    w: f32,
    h: f32,
    current_color: &AbsoluteColor,
) -> Option<LinearGradient> {
    let (x1, y1, x2, y2) = gradient_line(direction, w, h);
    let length = CSSPixelLength::new(((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt());

    let stops = gradient_stops(items, length, current_color);
    if stops.is_empty() {
        return None;
    }

    let spread_method = if flags.contains(GradientFlags::REPEATING) {
        SpreadMethod::Repeat
    } else {
        SpreadMethod::Pad
    };

    Some(LinearGradient {
        x1,
        y1,
        x2,
        y2,
        transform: Transform::identity(),
        spread_method,
        stops,
        anti_alias: true,
    })
}

/// Convert CSS color stops; stops without a position are spread evenly.
/// Interpolation hints are ignored.
#[cfg(feature = "pdf")]
fn gradient_stops(
    items: &[GradientItem],
    length: CSSPixelLength,
    current_color: &AbsoluteColor,
) -> Vec<Stop> {
    use style::values::specified::percentage::ToPercentage;

    let color_stops = items
        .iter()
        .filter(|item| !matches!(item, GenericGradientItem::InterpolationHint(_)))
        .count();
    let even_offset = |index: usize| {
        if color_stops > 1 {
            index as f32 / (color_stops - 1) as f32
        } else {
            0.0
        }
    };

    let mut stops = Vec::new();
    let mut index = 0;
    for item in items {
        let (color, offset) = match item {
            GenericGradientItem::SimpleColorStop(color) => (color, even_offset(index)),
            GenericGradientItem::ComplexColorStop { color, position } => {
                match position.to_percentage_of(length) {
                    Some(percentage) => (color, percentage.to_percentage()),
                    None => continue,
                }
            }
            GenericGradientItem::InterpolationHint(_) => continue,
        };
        index += 1;

        if let Some(stop) = gradient_stop(color, offset, current_color) {
            stops.push(stop);
        }
    }
    stops
}

#[cfg(feature = "pdf")]
fn gradient_stop(color: &StopColor, offset: f32, current_color: &AbsoluteColor) -> Option<Stop> {
    let srgb = color
        .resolve_to_absolute(current_color)
        .to_color_space(ColorSpace::Srgb);
    let Rgb { r, g, b } = Rgb::from_unit(srgb.components.0, srgb.components.1, srgb.components.2);

    Some(Stop {
        offset: NormalizedF32::new(offset.clamp(0.0, 1.0))?,
        color: rgb::Color::new(r, g, b).into(),
        opacity: NormalizedF32::new(srgb.alpha.clamp(0.0, 1.0)).unwrap_or(NormalizedF32::ONE),
    })
}

/// Fill a box with a gradient whose coordinates are relative to the box.
#[cfg(feature = "pdf")]
fn fill_gradient_rect(
    surface: &mut Surface,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    gradient: LinearGradient,
) {
    let Some(path) = rect_path(x, y, w, h) else {
        return;
    };
    let placed = LinearGradient {
        x1: x + gradient.x1,
        y1: y + gradient.y1,
        x2: x + gradient.x2,
        y2: y + gradient.y2,
        ..gradient
    };
    surface.set_fill(Some(Fill {
        paint: placed.into(),
        opacity: NormalizedF32::ONE,
        rule: FillRule::NonZero,
    }));
    surface.draw_path(&path);
}

/// Paint the glyph runs of a Parley layout.
#[cfg(feature = "pdf")]
fn paint_text(
    surface: &mut Surface,
    doc: &BaseDocument,
    text_layout: &blitz_dom::node::TextLayout,
    pos_x: f32,
    pos_y: f32,
    fonts: &mut FontCache,
) -> Result<()> {
    use linebender_resource_handle::FontData;

    let text = &text_layout.text;

    for line in text_layout.layout.lines() {
        for item in line.items() {
            let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                continue;
            };
            let run = glyph_run.run();
            let font_data: FontData = run.font().clone();
            let font_size = run.font_size();

            let (raw_data, font_id) = font_data.data.into_raw_parts();
            let font = match fonts.get(&font_id) {
                Some(font) => font.clone(),
                None => {
                    let data: krilla::Data = raw_data.into();
                    let font = Font::new(data, font_data.index)
                        .ok_or_else(|| Error::Font("failed to load font from data".to_string()))?;
                    fonts.insert(font_id, font.clone());
                    font
                }
            };

            // Text opacity is not applied; PDF text alpha needs its own
            // graphics state.
            let color = doc
                .get_node(glyph_run.style().brush.id)
                .and_then(|n| n.primary_styles())
                .map(|styles| {
                    let srgb = styles
                        .get_inherited_text()
                        .color
                        .to_color_space(ColorSpace::Srgb);
                    Rgb::from_unit(srgb.components.0, srgb.components.1, srgb.components.2)
                })
                .unwrap_or(Rgb::new(0, 0, 0));
            surface.set_fill(Some(color.fill()));

            let mut glyphs: Vec<KrillaGlyph> = Vec::new();
            for cluster in run.visual_clusters() {
                if cluster.is_ligature_continuation() {
                    if let Some(glyph) = glyphs.last_mut() {
                        glyph.text_range.end = cluster.text_range().end;
                    }
                    continue;
                }

                let text_range = cluster.text_range();
                for glyph in cluster.glyphs() {
                    glyphs.push(KrillaGlyph::new(
                        GlyphId::new(glyph.id),
                        glyph.advance / font_size,
                        glyph.x / font_size,
                        glyph.y / font_size,
                        0.0,
                        text_range.clone(),
                        None,
                    ));
                }
            }

            if glyphs.is_empty() {
                continue;
            }

            surface.draw_glyphs(
                Point::from_xy(pos_x + glyph_run.offset(), pos_y + glyph_run.baseline()),
                &glyphs,
                font,
                text,
                font_size,
                false,
            );
        }
    }

    Ok(())
}

#[cfg(feature = "pdf")]
fn extract_color(color: &style::values::computed::color::Color) -> Option<(f32, f32, f32, f32)> {
    match color {
        GenericColor::Absolute(abs) => {
            let srgb = abs.to_color_space(ColorSpace::Srgb);
            Some((
                srgb.components.0,
                srgb.components.1,
                srgb.components.2,
                srgb.alpha,
            ))
        }
        GenericColor::CurrentColor => Some((0.0, 0.0, 0.0, 1.0)),
        _ => None,
    }
}

#[cfg(not(feature = "pdf"))]
pub fn render_to_pdf(
    _document: &blitz_html::HtmlDocument,
    _geometry: &PageGeometry,
    _options: &PdfOptions,
) -> Result<(Vec<u8>, usize)> {
    Err(Error::FormatNotEnabled("pdf"))
}
