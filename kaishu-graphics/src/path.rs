//! Relative bezier paths.
//!
//! A [`RelPath`] is an anchor point plus a chain of [`CtrlSegment`]s, each
//! picking up where the previous one ended. Outline construction appends
//! segments only; a correction to an already-emitted joint is expressed by
//! replacing the final segment with a corrected one.

use crate::ctrl::CtrlSegment;
use crate::types::{Point, Scalar, Vec2, EPSILON};

/// An anchored chain of relative bezier segments.
#[derive(Debug, Clone, PartialEq)]
pub struct RelPath {
    start: Point,
    segs: Vec<CtrlSegment>,
    closed: bool,
}

impl RelPath {
    /// An empty path anchored at `start`.
    #[must_use]
    pub const fn new(start: Point) -> Self {
        Self {
            start,
            segs: Vec::new(),
            closed: false,
        }
    }

    /// Anchor point.
    #[must_use]
    pub const fn start_pos(&self) -> Point {
        self.start
    }

    /// Move the anchor without touching the segments.
    pub const fn set_start(&mut self, start: Point) {
        self.start = start;
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segs.is_empty()
    }

    /// Whether the path has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Segments in order.
    #[must_use]
    pub fn segments(&self) -> &[CtrlSegment] {
        &self.segs
    }

    /// Append a segment at the current end.
    pub fn push(&mut self, seg: CtrlSegment) {
        self.segs.push(seg);
    }

    /// Append a straight segment.
    pub fn line(&mut self, end: Vec2) {
        self.segs.push(CtrlSegment::line(end));
    }

    /// Append several segments at the current end.
    pub fn extend<I: IntoIterator<Item = CtrlSegment>>(&mut self, segs: I) {
        self.segs.extend(segs);
    }

    /// Append another path's segments at the current end. The other path's
    /// anchor is ignored; its displacements continue from this path's end.
    pub fn concat(&mut self, other: &Self) {
        self.segs.extend_from_slice(&other.segs);
    }

    /// Last segment, if any.
    #[must_use]
    pub fn last(&self) -> Option<&CtrlSegment> {
        self.segs.last()
    }

    /// Replace the final segment with a corrected one. Returns the segment
    /// that was replaced, or `None` on an empty path (which is left as is).
    pub fn replace_last(&mut self, seg: CtrlSegment) -> Option<CtrlSegment> {
        let old = self.segs.pop();
        if old.is_some() {
            self.segs.push(seg);
        }
        old
    }

    /// Shift the final segment's end displacement by `d`.
    pub fn nudge_last(&mut self, d: Vec2) {
        if let Some(last) = self.segs.last_mut() {
            *last = last.shifted_end(d);
        }
    }

    /// Absolute position after the first `index` segments. `pos_at(0)` is
    /// the anchor; `pos_at(len())` is the end position.
    #[must_use]
    pub fn pos_at(&self, index: usize) -> Point {
        let mut pos = self.start;
        for seg in self.segs.iter().take(index) {
            pos += seg.end;
        }
        pos
    }

    /// Absolute end position.
    #[must_use]
    pub fn end_pos(&self) -> Point {
        self.pos_at(self.segs.len())
    }

    /// Mark the path closed. Rendering emits a closing line back to the
    /// anchor.
    pub const fn close(&mut self) {
        self.closed = true;
    }

    /// Reversed path: anchored at the old end, tracing the same curve
    /// backwards. Closure is preserved.
    #[must_use]
    pub fn reverse(&self) -> Self {
        let segs = self.segs.iter().rev().map(CtrlSegment::reverse).collect();
        Self {
            start: self.end_pos(),
            segs,
            closed: self.closed,
        }
    }

    /// Sum of segment arc lengths (polyline approximation).
    #[must_use]
    pub fn approx_len(&self) -> Scalar {
        self.segs.iter().map(CtrlSegment::approx_len).sum()
    }

    /// True when the end position coincides with the anchor.
    #[must_use]
    pub fn is_loop(&self) -> bool {
        (self.end_pos() - self.start).hypot() < EPSILON
    }

    /// Absolute positions of the anchor and every segment end, in order.
    #[must_use]
    pub fn vertices(&self) -> Vec<Point> {
        let mut out = Vec::with_capacity(self.segs.len() + 1);
        let mut pos = self.start;
        out.push(pos);
        for seg in &self.segs {
            pos += seg.end;
            out.push(pos);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_path() -> RelPath {
        let mut p = RelPath::new(Point::new(10.0, 20.0));
        p.line(Vec2::new(30.0, 0.0));
        p.push(CtrlSegment::with_c1(
            Vec2::new(0.0, 40.0),
            Vec2::new(5.0, 10.0),
        ));
        p.line(Vec2::new(-30.0, 0.0));
        p
    }

    #[test]
    fn pos_at_accumulates_displacements() {
        let p = sample_path();
        assert_eq!(p.pos_at(0), Point::new(10.0, 20.0));
        assert_eq!(p.pos_at(1), Point::new(40.0, 20.0));
        assert_eq!(p.pos_at(2), Point::new(40.0, 60.0));
        assert_eq!(p.end_pos(), Point::new(10.0, 60.0));
    }

    #[test]
    fn reverse_is_involution() {
        let p = sample_path();
        let back = p.reverse().reverse();
        assert_eq!(back.start_pos(), p.start_pos());
        assert_eq!(back.len(), p.len());
        for (a, b) in back.segments().iter().zip(p.segments()) {
            assert!((a.end - b.end).hypot() < EPSILON);
        }
    }

    #[test]
    fn reverse_swaps_endpoints() {
        let p = sample_path();
        let r = p.reverse();
        assert_eq!(r.start_pos(), p.end_pos());
        assert!((r.end_pos() - p.start_pos()).hypot() < EPSILON);
    }

    #[test]
    fn replace_last_keeps_length() {
        let mut p = sample_path();
        let n = p.len();
        let old = p.replace_last(CtrlSegment::line(Vec2::new(-25.0, 5.0)));
        assert!(old.is_some());
        assert_eq!(p.len(), n);
        assert_eq!(p.end_pos(), Point::new(15.0, 65.0));
    }

    #[test]
    fn replace_last_on_empty_is_noop() {
        let mut p = RelPath::new(Point::ZERO);
        assert!(p.replace_last(CtrlSegment::line(Vec2::new(1.0, 0.0))).is_none());
        assert!(p.is_empty());
    }

    #[test]
    fn nudge_last_moves_end() {
        let mut p = sample_path();
        let before = p.end_pos();
        p.nudge_last(Vec2::new(3.0, -2.0));
        let after = p.end_pos();
        assert!((after - (before + Vec2::new(3.0, -2.0))).hypot() < EPSILON);
    }

    #[test]
    fn concat_continues_from_end() {
        let mut a = RelPath::new(Point::ZERO);
        a.line(Vec2::new(10.0, 0.0));
        let mut b = RelPath::new(Point::new(99.0, 99.0));
        b.line(Vec2::new(0.0, 10.0));
        a.concat(&b);
        assert_eq!(a.end_pos(), Point::new(10.0, 10.0));
    }

    #[test]
    fn loop_detection() {
        let mut p = RelPath::new(Point::ZERO);
        p.line(Vec2::new(10.0, 0.0));
        p.line(Vec2::new(0.0, 10.0));
        assert!(!p.is_loop());
        p.line(Vec2::new(-10.0, -10.0));
        assert!(p.is_loop());
    }
}
