//! Cubic Bezier segment operations.
//!
//! `CubicSegment` is the absolute-coordinate workhorse behind
//! [`crate::CtrlSegment`]: de Casteljau evaluation and splitting,
//! derivatives, bounding boxes, axis-crossing roots and curve-curve
//! intersection by bounding-box bisection.

use crate::types::{Point, Scalar, Vec2, EPSILON};

/// Four control points of a cubic Bezier segment.
#[derive(Debug, Clone, Copy)]
pub struct CubicSegment {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
}

impl CubicSegment {
    /// Create a new cubic segment from four control points.
    #[must_use]
    pub const fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Evaluate the point at parameter `t` in [0, 1].
    #[must_use]
    pub fn eval(&self, t: Scalar) -> Point {
        let s = 1.0 - t;
        let a = s * s * s;
        let b = 3.0 * s * s * t;
        let c = 3.0 * s * t * t;
        let d = t * t * t;
        Point::new(
            d.mul_add(
                self.p3.x,
                a.mul_add(self.p0.x, b.mul_add(self.p1.x, c * self.p2.x)),
            ),
            d.mul_add(
                self.p3.y,
                a.mul_add(self.p0.y, b.mul_add(self.p1.y, c * self.p2.y)),
            ),
        )
    }

    /// Evaluate the derivative (tangent vector) at parameter `t` in [0, 1].
    #[must_use]
    pub fn eval_deriv(&self, t: Scalar) -> Vec2 {
        let s = 1.0 - t;
        let a = 3.0 * s * s;
        let b = 6.0 * s * t;
        let c = 3.0 * t * t;
        Vec2::new(
            a.mul_add(
                self.p1.x - self.p0.x,
                b.mul_add(self.p2.x - self.p1.x, c * (self.p3.x - self.p2.x)),
            ),
            a.mul_add(
                self.p1.y - self.p0.y,
                b.mul_add(self.p2.y - self.p1.y, c * (self.p3.y - self.p2.y)),
            ),
        )
    }

    /// Split at parameter `t` using de Casteljau's algorithm.
    ///
    /// Returns `(left_half, right_half)`.
    #[must_use]
    pub fn split(&self, t: Scalar) -> (Self, Self) {
        let ab = self.p0.lerp(self.p1, t);
        let bc = self.p1.lerp(self.p2, t);
        let cd = self.p2.lerp(self.p3, t);
        let abc = ab.lerp(bc, t);
        let bcd = bc.lerp(cd, t);
        let abcd = abc.lerp(bcd, t);

        (
            Self {
                p0: self.p0,
                p1: ab,
                p2: abc,
                p3: abcd,
            },
            Self {
                p0: abcd,
                p1: bcd,
                p2: cd,
                p3: self.p3,
            },
        )
    }

    /// Axis-aligned bounding box of the control-point hull: `(min, max)`.
    #[must_use]
    pub fn bbox(&self) -> (Point, Point) {
        let min_x = self.p0.x.min(self.p1.x).min(self.p2.x).min(self.p3.x);
        let min_y = self.p0.y.min(self.p1.y).min(self.p2.y).min(self.p3.y);
        let max_x = self.p0.x.max(self.p1.x).max(self.p2.x).max(self.p3.x);
        let max_y = self.p0.y.max(self.p1.y).max(self.p2.y).max(self.p3.y);
        (Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    /// Maximum extent (diagonal of bounding box).
    #[must_use]
    pub fn extent(&self) -> Scalar {
        let (min, max) = self.bbox();
        (max.x - min.x).hypot(max.y - min.y)
    }

    /// Parameter values in [0, 1] where the segment's x (or y) coordinate
    /// equals `value`. Found by scanning for sign changes of the coordinate
    /// function and bisecting each bracketed root.
    #[must_use]
    pub fn axis_roots(&self, value: Scalar, vertical: bool) -> Vec<Scalar> {
        const STEPS: usize = 64;
        let coord = |t: Scalar| {
            let p = self.eval(t);
            if vertical {
                p.x - value
            } else {
                p.y - value
            }
        };

        let mut roots = Vec::new();
        let mut prev_t = 0.0;
        let mut prev_v = coord(0.0);
        if prev_v.abs() < EPSILON {
            roots.push(0.0);
        }
        for i in 1..=STEPS {
            let t = i as Scalar / STEPS as Scalar;
            let v = coord(t);
            if v.abs() < EPSILON {
                roots.push(t);
            } else if prev_v * v < 0.0 {
                // Bisect the bracketed interval.
                let (mut lo, mut hi) = (prev_t, t);
                let mut lo_v = prev_v;
                for _ in 0..50 {
                    let mid = f64::midpoint(lo, hi);
                    let mid_v = coord(mid);
                    if mid_v.abs() < EPSILON {
                        lo = mid;
                        break;
                    }
                    if lo_v * mid_v < 0.0 {
                        hi = mid;
                    } else {
                        lo = mid;
                        lo_v = mid_v;
                    }
                }
                roots.push(f64::midpoint(lo, hi));
            }
            prev_t = t;
            prev_v = v;
        }
        roots.dedup_by(|a, b| (*a - *b).abs() < 1e-4);
        roots
    }
}

// ---------------------------------------------------------------------------
// Curve-curve intersection
// ---------------------------------------------------------------------------

/// Maximum recursion depth for bisection.
const MAX_DEPTH: u32 = 40;

/// Tolerance for convergence.
const INTERSECT_TOL: Scalar = 1e-4;

/// Check if two bounding boxes overlap.
fn bbox_overlap(a: &(Point, Point), b: &(Point, Point)) -> bool {
    a.0.x <= b.1.x && a.1.x >= b.0.x && a.0.y <= b.1.y && a.1.y >= b.0.y
}

/// Find all intersections between two cubic segments.
///
/// Returns `(t1, t2)` parameter pairs, both in [0, 1], near-duplicates
/// removed. Recursively bisects both curves and prunes on bounding-box
/// overlap, the same scheme `MetaPost` uses for `intersectiontimes`.
#[must_use]
pub fn intersect(seg1: &CubicSegment, seg2: &CubicSegment) -> Vec<(Scalar, Scalar)> {
    let mut results = Vec::new();
    intersect_recursive(seg1, seg2, 0.0, 1.0, 0.0, 1.0, 0, &mut results);
    results
}

#[expect(
    clippy::too_many_arguments,
    reason = "recursive bisection carries interval bounds for both curves"
)]
fn intersect_recursive(
    seg1: &CubicSegment,
    seg2: &CubicSegment,
    t1_lo: Scalar,
    t1_hi: Scalar,
    t2_lo: Scalar,
    t2_hi: Scalar,
    depth: u32,
    results: &mut Vec<(Scalar, Scalar)>,
) {
    if !bbox_overlap(&seg1.bbox(), &seg2.bbox()) {
        return;
    }

    if (seg1.extent() < INTERSECT_TOL && seg2.extent() < INTERSECT_TOL) || depth >= MAX_DEPTH {
        let t1 = f64::midpoint(t1_lo, t1_hi);
        let t2 = f64::midpoint(t2_lo, t2_hi);
        let dominated = results
            .iter()
            .any(|r| (r.0 - t1).abs() < INTERSECT_TOL * 10.0 && (r.1 - t2).abs() < INTERSECT_TOL * 10.0);
        if !dominated {
            results.push((t1, t2));
        }
        return;
    }

    let t1_mid = f64::midpoint(t1_lo, t1_hi);
    let t2_mid = f64::midpoint(t2_lo, t2_hi);
    let (s1l, s1r) = seg1.split(0.5);
    let (s2l, s2r) = seg2.split(0.5);
    let d = depth + 1;

    intersect_recursive(&s1l, &s2l, t1_lo, t1_mid, t2_lo, t2_mid, d, results);
    intersect_recursive(&s1l, &s2r, t1_lo, t1_mid, t2_mid, t2_hi, d, results);
    intersect_recursive(&s1r, &s2l, t1_mid, t1_hi, t2_lo, t2_mid, d, results);
    intersect_recursive(&s1r, &s2r, t1_mid, t1_hi, t2_mid, t2_hi, d, results);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn line_seg(a: Point, b: Point) -> CubicSegment {
        CubicSegment::new(a, a.lerp(b, 1.0 / 3.0), a.lerp(b, 2.0 / 3.0), b)
    }

    #[test]
    fn eval_endpoints() {
        let seg = CubicSegment::new(
            Point::new(0.0, 0.0),
            Point::new(1.0, 2.0),
            Point::new(3.0, 2.0),
            Point::new(4.0, 0.0),
        );
        let p0 = seg.eval(0.0);
        assert!(p0.x.abs() < EPSILON && p0.y.abs() < EPSILON);
        let p1 = seg.eval(1.0);
        assert!((p1.x - 4.0).abs() < EPSILON && p1.y.abs() < EPSILON);
    }

    #[test]
    fn split_meets_at_midpoint() {
        let seg = CubicSegment::new(
            Point::new(0.0, 0.0),
            Point::new(1.0, 2.0),
            Point::new(3.0, 2.0),
            Point::new(4.0, 0.0),
        );
        let (left, right) = seg.split(0.5);
        assert!((left.p3.x - right.p0.x).abs() < EPSILON);
        assert!((left.p3.y - right.p0.y).abs() < EPSILON);
        assert!((right.p3.x - 4.0).abs() < EPSILON);
    }

    #[test]
    fn axis_roots_on_line() {
        let seg = line_seg(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let roots = seg.axis_roots(5.0, true);
        assert_eq!(roots.len(), 1);
        let p = seg.eval(roots[0]);
        assert!((p.x - 5.0).abs() < 1e-3, "x = {}", p.x);
        assert!((p.y - 5.0).abs() < 1e-3, "y = {}", p.y);
    }

    #[test]
    fn axis_roots_none_outside_range() {
        let seg = line_seg(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert!(seg.axis_roots(5.0, false).is_empty());
    }

    #[test]
    fn intersect_crossing_lines() {
        let a = line_seg(Point::new(0.0, 5.0), Point::new(10.0, 5.0));
        let b = line_seg(Point::new(5.0, 0.0), Point::new(5.0, 10.0));
        let hits = intersect(&a, &b);
        assert_eq!(hits.len(), 1);
        let (t1, t2) = hits[0];
        assert!((t1 - 0.5).abs() < 0.01, "t1 = {t1}");
        assert!((t2 - 0.5).abs() < 0.01, "t2 = {t2}");
    }

    #[test]
    fn intersect_parallel_is_empty() {
        let a = line_seg(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let b = line_seg(Point::new(0.0, 5.0), Point::new(10.0, 5.0));
        assert!(intersect(&a, &b).is_empty());
    }
}
