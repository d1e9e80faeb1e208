//! SVG output for kaishu glyph outlines.
//!
//! Converts the closed outlines produced by `kaishu-core` into an SVG
//! [`Document`] using the `svg` crate.
//!
//! Key design points:
//! - Outlines are stored relative (a start point plus displacement
//!   segments), so path data uses the relative `l`/`c` commands and only
//!   the initial `M` is absolute. A missing leading control offset
//!   collapses onto the segment start (`0,0`); a missing trailing one
//!   collapses onto the end displacement.
//! - Path data is built as raw `d` strings to preserve `f64` precision
//!   (the `svg` crate's `Data` builder uses `f32`).
//! - The glyph body is horizontally centered in the em by shifting every
//!   outline by the left side bearing from [`Metrics`].

use kaishu_core::Metrics;
use kaishu_graphics::{RelPath, Scalar, Vec2};
use svg::node::element::{Path as SvgPath, Style};
use svg::Document;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render one glyph's outlines to an SVG [`Document`].
///
/// The document spans the full em square (`viewBox` is
/// `0 0 font_size font_size`) and the outlines are shifted right by the
/// left side bearing so the glyph body is centered.
#[must_use]
pub fn render(outlines: &[RelPath], metrics: &Metrics) -> Document {
    render_with_options(outlines, metrics, &RenderOptions::default())
}

/// Render one glyph's outlines to an SVG string.
#[must_use]
pub fn render_to_string(outlines: &[RelPath], metrics: &Metrics) -> String {
    render(outlines, metrics).to_string()
}

/// Options controlling SVG output.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Number of decimal places for coordinates. Default: 2.
    pub precision: usize,
    /// Fill color of the glyph body. Default: `#000000`.
    pub fill: &'static str,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            precision: 2,
            fill: "#000000",
        }
    }
}

/// Render one glyph's outlines to an SVG [`Document`] with custom options.
#[must_use]
pub fn render_with_options(
    outlines: &[RelPath],
    metrics: &Metrics,
    opts: &RenderOptions,
) -> Document {
    let offset = Vec2::new(metrics.glyph_offset(), 0.0);
    let size = fmt_scalar(metrics.font_size, opts.precision);

    let mut doc = Document::new()
        .set("xmlns", "http://www.w3.org/2000/svg")
        .set("viewBox", format!("0 0 {size} {size}"))
        .add(Style::new(format!(".st0{{fill:{};}}", opts.fill)).set("type", "text/css"));

    for outline in outlines {
        let d = outline_to_d(outline, offset, opts.precision);
        doc = doc.add(SvgPath::new().set("class", "st0").set("d", d));
    }

    doc
}

// ---------------------------------------------------------------------------
// Outline → SVG "d" attribute
// ---------------------------------------------------------------------------

/// Convert a relative outline to an SVG path data string.
///
/// Emits an absolute `M` for the (shifted) start point, then one relative
/// `l` or `c` command per segment, and `z` when the outline is closed.
#[must_use]
pub fn outline_to_d(outline: &RelPath, offset: Vec2, precision: usize) -> String {
    if outline.is_empty() {
        return String::new();
    }

    let mut d = String::with_capacity(outline.len() * 40);
    let p0 = outline.start_pos() + offset;
    d.push('M');
    write_point(&mut d, p0.x, p0.y, precision);

    for seg in outline.segments() {
        if seg.is_line() {
            d.push('l');
            write_point(&mut d, seg.end.x, seg.end.y, precision);
        } else {
            let c1 = seg.c1.unwrap_or(Vec2::ZERO);
            let c2 = seg.c2.unwrap_or(seg.end);
            d.push('c');
            write_point(&mut d, c1.x, c1.y, precision);
            d.push(' ');
            write_point(&mut d, c2.x, c2.y, precision);
            d.push(' ');
            write_point(&mut d, seg.end.x, seg.end.y, precision);
        }
    }

    if outline.is_closed() {
        d.push('z');
    }

    d
}

/// Write "x,y" to the string with the given precision.
///
/// Normalizes negative zero to positive zero for cleaner output.
fn write_point(d: &mut String, x: Scalar, y: Scalar, precision: usize) {
    use std::fmt::Write;
    let x = if x == 0.0 { 0.0 } else { x };
    let y = if y == 0.0 { 0.0 } else { y };
    let _ = write!(d, "{x:.precision$},{y:.precision$}");
}

/// Format a scalar to the given precision, stripping trailing zeros.
fn fmt_scalar(v: Scalar, precision: usize) -> String {
    let s = format!("{v:.precision$}");
    // Strip trailing zeros after decimal point, but keep at least one digit.
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        trimmed.to_owned()
    } else {
        s
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use kaishu_graphics::{CtrlSegment, Point};

    /// Closed 10x10 square anchored at (100, 200).
    fn make_square() -> RelPath {
        let mut path = RelPath::new(Point::new(100.0, 200.0));
        path.line(Vec2::new(10.0, 0.0));
        path.line(Vec2::new(0.0, 10.0));
        path.line(Vec2::new(-10.0, 0.0));
        path.line(Vec2::new(0.0, -10.0));
        path.close();
        path
    }

    #[test]
    fn test_outline_to_d_empty() {
        let path = RelPath::new(Point::ZERO);
        assert_eq!(outline_to_d(&path, Vec2::ZERO, 2), "");
    }

    #[test]
    fn test_outline_to_d_square() {
        let d = outline_to_d(&make_square(), Vec2::ZERO, 2);
        assert!(d.starts_with("M100.00,200.00"), "unexpected start: {d}");
        assert!(d.contains("l10.00,0.00"), "missing line: {d}");
        assert!(d.ends_with('z'), "should close: {d}");
    }

    #[test]
    fn test_outline_to_d_open_path_has_no_z() {
        let mut path = RelPath::new(Point::ZERO);
        path.line(Vec2::new(5.0, 5.0));
        let d = outline_to_d(&path, Vec2::ZERO, 2);
        assert!(!d.contains('z'), "open path must stay open: {d}");
    }

    #[test]
    fn test_outline_to_d_shifts_start_only() {
        let d = outline_to_d(&make_square(), Vec2::new(122.88, 0.0), 2);
        // The move is shifted, the relative segments are not.
        assert!(d.starts_with("M222.88,200.00"), "unexpected start: {d}");
        assert!(d.contains("l10.00,0.00"), "segments must be unshifted: {d}");
    }

    #[test]
    fn test_outline_to_d_curve_controls() {
        let mut path = RelPath::new(Point::ZERO);
        path.push(CtrlSegment::with_c1(
            Vec2::new(10.0, 10.0),
            Vec2::new(4.0, 0.0),
        ));
        let d = outline_to_d(&path, Vec2::ZERO, 2);
        // Missing trailing control collapses onto the end displacement.
        assert!(
            d.contains("c4.00,0.00 10.00,10.00 10.00,10.00"),
            "unexpected curve: {d}"
        );
    }

    #[test]
    fn test_outline_to_d_negative_zero() {
        let mut path = RelPath::new(Point::ZERO);
        path.line(Vec2::new(-0.0, 3.0));
        let d = outline_to_d(&path, Vec2::ZERO, 2);
        assert!(!d.contains("-0.00"), "negative zero leaked: {d}");
    }

    #[test]
    fn test_fmt_scalar_trailing_zeros() {
        assert_eq!(fmt_scalar(1024.0, 2), "1024");
        assert_eq!(fmt_scalar(1.5, 4), "1.5");
        assert_eq!(fmt_scalar(1.25, 4), "1.25");
    }

    #[test]
    fn test_render_document_frame() {
        let metrics = Metrics::default();
        let svg = render_to_string(&[make_square()], &metrics);
        assert!(svg.contains("<svg"), "missing root: {svg}");
        assert!(
            svg.contains("viewBox=\"0 0 1024 1024\""),
            "missing viewBox: {svg}"
        );
        assert!(
            svg.contains(".st0{fill:#000000;}"),
            "missing style: {svg}"
        );
        assert!(svg.contains("class=\"st0\""), "missing class: {svg}");
    }

    #[test]
    fn test_render_applies_side_bearing() {
        let metrics = Metrics::default();
        let svg = render_to_string(&[make_square()], &metrics);
        // 100 + 122.88 left side bearing
        assert!(svg.contains("M222.88,200.00"), "missing shift: {svg}");
    }

    #[test]
    fn test_render_one_path_per_outline() {
        let metrics = Metrics::default();
        let svg = render_to_string(&[make_square(), make_square()], &metrics);
        assert_eq!(svg.matches("<path").count(), 2, "path count: {svg}");
    }
}
