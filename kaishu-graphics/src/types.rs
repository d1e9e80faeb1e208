//! Scalar and vector types shared across the kaishu workspace.
//!
//! Coordinates follow the SVG convention: y grows downward. "Down" in
//! stroke terminology therefore means positive y.

pub use kurbo::{Point, Vec2};

/// Coordinate scalar. Skeleton coordinates are rounded to integers at load
/// time but all downstream geometry is done in `f64`.
pub type Scalar = f64;

/// Tolerance for floating-point comparisons.
pub const EPSILON: Scalar = 1e-6;

/// Vector helpers not provided by `kurbo::Vec2`.
pub trait Vec2Ext {
    /// Perpendicular vector, rotated a quarter turn counter-clockwise in
    /// screen coordinates (y-down): `(x, y) -> (y, -x)`.
    fn perp(self) -> Vec2;
    /// Rotate by `angle` radians (y-down screen sense).
    fn rotated(self, angle: Scalar) -> Vec2;
    /// Polar angle in radians, `atan2(y, x)`.
    fn polar_angle(self) -> Scalar;
    /// Unit vector in the same direction; zero stays zero.
    fn normalized(self) -> Vec2;
}

impl Vec2Ext for Vec2 {
    #[inline]
    fn perp(self) -> Vec2 {
        Vec2::new(self.y, -self.x)
    }

    #[inline]
    fn rotated(self, angle: Scalar) -> Vec2 {
        let (s, c) = angle.sin_cos();
        Vec2::new(
            c.mul_add(self.x, -s * self.y),
            s.mul_add(self.x, c * self.y),
        )
    }

    #[inline]
    fn polar_angle(self) -> Scalar {
        self.y.atan2(self.x)
    }

    #[inline]
    fn normalized(self) -> Vec2 {
        let len = self.hypot();
        if len < EPSILON {
            Vec2::ZERO
        } else {
            self / len
        }
    }
}

/// Intersection point of the infinite lines through (`a1`, `a2`) and
/// (`b1`, `b2`). `None` when the lines are parallel.
#[must_use]
pub fn line_intersection(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Point> {
    let da = a2 - a1;
    let db = b2 - b1;
    let denom = da.cross(db);
    if denom.abs() < EPSILON {
        return None;
    }
    let t = (b1 - a1).cross(db) / denom;
    Some(a1 + da * t)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perp_is_quarter_turn() {
        let v = Vec2::new(1.0, 0.0);
        let p = v.perp();
        assert!((p.x).abs() < EPSILON);
        assert!((p.y + 1.0).abs() < EPSILON);
        assert!(v.dot(p).abs() < EPSILON);
    }

    #[test]
    fn rotated_roundtrip() {
        let v = Vec2::new(3.0, 4.0);
        let r = v.rotated(0.7).rotated(-0.7);
        assert!((r.x - v.x).abs() < EPSILON);
        assert!((r.y - v.y).abs() < EPSILON);
    }

    #[test]
    fn normalized_zero_stays_zero() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        let n = Vec2::new(0.0, 5.0).normalized();
        assert!((n.hypot() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn line_intersection_crossing() {
        let p = line_intersection(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(5.0, -5.0),
            Point::new(5.0, 5.0),
        );
        let p = p.expect("lines cross");
        assert!((p.x - 5.0).abs() < EPSILON);
        assert!(p.y.abs() < EPSILON);
    }

    #[test]
    fn line_intersection_parallel_is_none() {
        let p = line_intersection(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(10.0, 1.0),
        );
        assert!(p.is_none());
    }
}
