//! Outline template warping.
//!
//! Stroke outlines are authored as small closed templates in a nominal
//! frame: the stroke runs straight from `(0, 0)` towards `+y`, the template
//! x coordinate is a perpendicular offset and the y coordinate an arc
//! position along the stroke. [`warp_template`] bends such a template so it
//! follows an actual (possibly curved) centerline span: each template point
//! is carried to the matching arc position on the curve and offset along a
//! normal frame interpolated between the span's chord frame and the local
//! tangent frame.

use crate::ctrl::CtrlSegment;
use crate::path::RelPath;
use crate::types::{Point, Scalar, Vec2, Vec2Ext, EPSILON};

/// Point mapper from template space onto a centerline span.
struct Warp<'a> {
    spine: &'a CtrlSegment,
    origin: Point,
    len: Scalar,
    chord_dir: Vec2,
    ratio: Scalar,
}

impl Warp<'_> {
    fn map(&self, p: Point) -> Point {
        // Arc positions past either end extrapolate along the end tangent.
        let (t, base) = if p.y < 0.0 {
            let dir = self.spine.tangent_at(0.0).normalized();
            (0.0, self.origin + dir * p.y)
        } else if p.y >= self.len - EPSILON {
            let dir = self.spine.tangent_at(1.0).normalized();
            let end = self.spine.value_at(1.0, self.origin);
            (1.0, end + dir * (p.y - self.len))
        } else {
            let t = self.spine.param_at_len(p.y);
            (t, self.spine.value_at(t, self.origin))
        };
        let local_dir = self.spine.tangent_at(t).normalized();
        let dir = (self.chord_dir * (1.0 - self.ratio) + local_dir * self.ratio).normalized();
        base + dir.perp() * p.x
    }
}

/// Bend `template` so it follows the centerline span `spine` anchored at
/// `origin`.
///
/// `ratio` selects the normal frame for perpendicular offsets: `0.0` uses
/// the span's chord direction everywhere, `1.0` the local tangent at each
/// arc position. A straight span reproduces the template unchanged up to
/// placement; template points at arc positions `0` and `len` stay pinned
/// to the span's endpoints.
#[must_use]
pub fn warp_template(
    spine: &CtrlSegment,
    template: &RelPath,
    origin: Point,
    ratio: Scalar,
) -> RelPath {
    let len = spine.approx_len();
    if len < EPSILON {
        let mut out = template.clone();
        out.set_start(origin + template.start_pos().to_vec2());
        return out;
    }
    let warp = Warp {
        spine,
        origin,
        len,
        chord_dir: spine.end.normalized(),
        ratio,
    };
    let straight = spine.is_line();

    let mut out = RelPath::new(warp.map(template.start_pos()));
    let mut pos = template.start_pos();
    let mut mapped_pos = out.start_pos();
    for seg in template.segments() {
        let next = pos + seg.end;
        let mapped_next = warp.map(next);
        if straight && seg.is_line() {
            out.line(mapped_next - mapped_pos);
        } else {
            let cubic = seg.to_cubic(pos);
            out.push(CtrlSegment::cubic(
                mapped_next - mapped_pos,
                warp.map(cubic.p1) - mapped_pos,
                warp.map(cubic.p2) - mapped_pos,
            ));
        }
        pos = next;
        mapped_pos = mapped_next;
    }
    if template.is_closed() {
        out.close();
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_template(width: Scalar, len: Scalar) -> RelPath {
        let mut t = RelPath::new(Point::ZERO);
        t.line(Vec2::new(0.0, len));
        t.line(Vec2::new(-width, 0.0));
        t.line(Vec2::new(0.0, -len));
        t.close();
        t
    }

    #[test]
    fn straight_vertical_span_is_identity() {
        let spine = CtrlSegment::line(Vec2::new(0.0, 100.0));
        let origin = Point::new(50.0, 20.0);
        let out = warp_template(&spine, &rect_template(32.0, 100.0), origin, 0.5);
        let verts = out.vertices();
        assert!((verts[0] - origin).hypot() < EPSILON);
        assert!((verts[1] - Point::new(50.0, 120.0)).hypot() < EPSILON);
        assert!((verts[2] - Point::new(18.0, 120.0)).hypot() < EPSILON);
        assert!((verts[3] - Point::new(18.0, 20.0)).hypot() < EPSILON);
        assert!(out.is_closed());
    }

    #[test]
    fn straight_diagonal_span_rotates_offsets() {
        // 45 degree down-right span keeps offsets perpendicular to it.
        let spine = CtrlSegment::line(Vec2::new(100.0, 100.0));
        let len = spine.approx_len();
        let out = warp_template(&spine, &rect_template(10.0, len), Point::ZERO, 0.5);
        let verts = out.vertices();
        // Spine direction (1,1)/sqrt2; perp of it is (1,-1)/sqrt2.
        let corner = verts[2];
        let expect = Point::new(100.0, 100.0) + Vec2::new(1.0, -1.0).normalized() * -10.0;
        assert!((corner - expect).hypot() < 1e-6, "{corner:?} vs {expect:?}");
    }

    #[test]
    fn curved_span_pins_endpoints() {
        let spine = CtrlSegment::with_c1(Vec2::new(30.0, 120.0), Vec2::new(-10.0, 60.0));
        let len = spine.approx_len();
        let origin = Point::new(200.0, 40.0);
        let out = warp_template(&spine, &rect_template(32.0, len), origin, 2.0 / 3.0);
        let verts = out.vertices();
        assert!((verts[0] - origin).hypot() < 1e-6);
        let end = origin + spine.end;
        assert!((verts[1] - end).hypot() < 1e-6, "{:?} vs {end:?}", verts[1]);
    }

    #[test]
    fn curved_span_bends_straight_sides() {
        let spine = CtrlSegment::with_c1(Vec2::new(30.0, 120.0), Vec2::new(-10.0, 60.0));
        let len = spine.approx_len();
        let out = warp_template(&spine, &rect_template(32.0, len), Point::ZERO, 0.5);
        // Sides that follow the span pick up curvature.
        assert!(!out.segments()[0].is_line());
    }

    #[test]
    fn degenerate_span_translates_template() {
        let spine = CtrlSegment::line(Vec2::ZERO);
        let origin = Point::new(7.0, 9.0);
        let out = warp_template(&spine, &rect_template(8.0, 8.0), origin, 0.5);
        assert!((out.start_pos() - origin).hypot() < EPSILON);
        assert_eq!(out.len(), 3);
    }
}
