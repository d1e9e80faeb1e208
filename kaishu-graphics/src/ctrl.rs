//! Relative bezier control segments.
//!
//! A [`CtrlSegment`] is one directed bezier span described relative to its
//! start point: the displacement to the end point plus up to two control
//! offsets. Missing control offsets collapse onto the nearest endpoint, so
//! a bare displacement is a straight line, one offset gives a
//! quadratic-like bend and two give a full cubic.

use crate::bezier::{self, CubicSegment};
use crate::types::{Point, Scalar, Vec2, Vec2Ext, EPSILON};

/// A directed bezier span relative to its (implicit) start point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CtrlSegment {
    /// Displacement from start to end.
    pub end: Vec2,
    /// First control offset (relative to start). `None` collapses onto the
    /// start point.
    pub c1: Option<Vec2>,
    /// Second control offset (relative to start). `None` collapses onto the
    /// end point.
    pub c2: Option<Vec2>,
}

impl CtrlSegment {
    /// A straight segment.
    #[must_use]
    pub const fn line(end: Vec2) -> Self {
        Self {
            end,
            c1: None,
            c2: None,
        }
    }

    /// A curved segment with the leading control offset set.
    #[must_use]
    pub const fn with_c1(end: Vec2, c1: Vec2) -> Self {
        Self {
            end,
            c1: Some(c1),
            c2: None,
        }
    }

    /// A curved segment with the trailing control offset set.
    #[must_use]
    pub const fn with_c2(end: Vec2, c2: Vec2) -> Self {
        Self {
            end,
            c1: None,
            c2: Some(c2),
        }
    }

    /// A full cubic segment.
    #[must_use]
    pub const fn cubic(end: Vec2, c1: Vec2, c2: Vec2) -> Self {
        Self {
            end,
            c1: Some(c1),
            c2: Some(c2),
        }
    }

    /// True when the segment carries no curvature.
    #[must_use]
    pub const fn is_line(&self) -> bool {
        self.c1.is_none() && self.c2.is_none()
    }

    /// Absolute cubic representation anchored at `start`.
    ///
    /// Straight lines get collinear controls at 1/3 and 2/3 so that the
    /// parameterization is uniform; a missing control offset otherwise
    /// collapses onto its endpoint.
    #[must_use]
    pub fn to_cubic(&self, start: Point) -> CubicSegment {
        let p3 = start + self.end;
        if self.is_line() {
            return CubicSegment::new(
                start,
                start + self.end / 3.0,
                start + self.end * (2.0 / 3.0),
                p3,
            );
        }
        let p1 = start + self.c1.unwrap_or(Vec2::ZERO);
        let p2 = start + self.c2.unwrap_or(self.end);
        CubicSegment::new(start, p1, p2, p3)
    }

    /// Rebuild a relative segment from an absolute cubic.
    #[must_use]
    pub fn from_cubic(c: &CubicSegment) -> Self {
        Self::cubic(c.p3 - c.p0, c.p1 - c.p0, c.p2 - c.p0)
    }

    /// Point at parameter `t`, anchored at `start`.
    #[must_use]
    pub fn value_at(&self, t: Scalar, start: Point) -> Point {
        self.to_cubic(start).eval(t)
    }

    /// Tangent vector at parameter `t`.
    #[must_use]
    pub fn tangent_at(&self, t: Scalar) -> Vec2 {
        self.to_cubic(Point::ZERO).eval_deriv(t)
    }

    /// Two points spanning the tangent line at parameter `t`: the on-curve
    /// point and the on-curve point displaced by the tangent vector.
    #[must_use]
    pub fn tangent_line(&self, t: Scalar, start: Point) -> (Point, Point) {
        let cubic = self.to_cubic(start);
        let p = cubic.eval(t);
        (p, p + cubic.eval_deriv(t))
    }

    /// Unit normal at parameter `t`, scaled to length `len`.
    #[must_use]
    pub fn normal_at(&self, t: Scalar, len: Scalar) -> Vec2 {
        self.tangent_at(t).normalized().perp() * len
    }

    /// Split at parameter `t`. Returns the two halves as relative
    /// segments; the right half is anchored at the left half's end.
    #[must_use]
    pub fn split(&self, t: Scalar) -> (Self, Self) {
        if self.is_line() {
            let mid = self.end * t;
            return (Self::line(mid), Self::line(self.end - mid));
        }
        let (l, r) = self.to_cubic(Point::ZERO).split(t);
        (Self::from_cubic(&l), Self::from_cubic(&r))
    }

    /// Reversed segment: travels from the original end back to the start.
    #[must_use]
    pub fn reverse(&self) -> Self {
        if self.is_line() {
            return Self::line(-self.end);
        }
        let c = self.to_cubic(Point::ZERO);
        // Relative to the old end point.
        Self::cubic(-self.end, c.p2.to_vec2() - self.end, c.p1.to_vec2() - self.end)
    }

    /// Parameter values in [0, 1] where the segment, anchored at `start`,
    /// crosses the vertical line `x = value`.
    #[must_use]
    pub fn roots_x(&self, value: Scalar, start: Point) -> Vec<Scalar> {
        self.to_cubic(start).axis_roots(value, true)
    }

    /// Parameter values in [0, 1] where the segment, anchored at `start`,
    /// crosses the horizontal line `y = value`.
    #[must_use]
    pub fn roots_y(&self, value: Scalar, start: Point) -> Vec<Scalar> {
        self.to_cubic(start).axis_roots(value, false)
    }

    /// Intersections with another segment.
    ///
    /// `self` is anchored at `start`, `other` at `other_start`. Returns
    /// `(t_self, t_other)` pairs.
    #[must_use]
    pub fn intersections(
        &self,
        start: Point,
        other: &Self,
        other_start: Point,
    ) -> Vec<(Scalar, Scalar)> {
        bezier::intersect(&self.to_cubic(start), &other.to_cubic(other_start))
    }

    /// Polyline approximation of the arc length.
    #[must_use]
    pub fn approx_len(&self) -> Scalar {
        if self.is_line() {
            return self.end.hypot();
        }
        const STEPS: usize = 16;
        let cubic = self.to_cubic(Point::ZERO);
        let mut len = 0.0;
        let mut prev = cubic.eval(0.0);
        for i in 1..=STEPS {
            let p = cubic.eval(i as Scalar / STEPS as Scalar);
            len += (p - prev).hypot();
            prev = p;
        }
        len
    }

    /// Parameter at which the arc length from the start reaches `dist`.
    /// Clamped to [0, 1].
    #[must_use]
    pub fn param_at_len(&self, dist: Scalar) -> Scalar {
        let total = self.approx_len();
        if total < EPSILON {
            return 0.0;
        }
        if self.is_line() {
            return (dist / total).clamp(0.0, 1.0);
        }
        const STEPS: usize = 64;
        let cubic = self.to_cubic(Point::ZERO);
        let mut acc = 0.0;
        let mut prev = cubic.eval(0.0);
        for i in 1..=STEPS {
            let t = i as Scalar / STEPS as Scalar;
            let p = cubic.eval(t);
            let step = (p - prev).hypot();
            if acc + step >= dist {
                let back = if step < EPSILON {
                    0.0
                } else {
                    (acc + step - dist) / step
                };
                return (t - back / STEPS as Scalar).clamp(0.0, 1.0);
            }
            acc += step;
            prev = p;
        }
        1.0
    }

    /// Same segment with the end displacement shifted by `d` (control
    /// offsets untouched).
    #[must_use]
    pub fn shifted_end(&self, d: Vec2) -> Self {
        Self {
            end: self.end + d,
            c1: self.c1,
            c2: self.c2,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
