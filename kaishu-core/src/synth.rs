//! Centerline curvature synthesis.
//!
//! Skeleton segments are straight; the brush bends them. For downward
//! segments the bend depends on the neighboring segments: a preceding
//! vertical drop pulls the curve down past the corner, a following
//! horizontal run pulls it out. Every combination outside the tables
//! below is rejected so unsupported skeletons fail loudly.

use kaishu_graphics::{CtrlSegment, Scalar, Vec2};

use crate::error::SynthError;

/// A synthesized centerline segment.
///
/// `corr` is the vertical overshoot the curve takes past the nominal
/// corner when a preceding vertical drop flows into this segment; the
/// caller shortens the neighbor by the same amount.
#[derive(Debug, Clone, PartialEq)]
pub struct Synth {
    pub ctrl: CtrlSegment,
    pub corr: Scalar,
}

impl Synth {
    fn plain(ctrl: CtrlSegment) -> Self {
        Self { ctrl, corr: 0.0 }
    }
}

/// Bend a downward displacement into a curve, given the displacements of
/// the neighboring segments (when they exist) and the layout unit cell.
pub fn synth_ctrl(
    disp: Vec2,
    prev: Option<Vec2>,
    next: Option<Vec2>,
    unit: Vec2,
) -> Result<Synth, SynthError> {
    let fail = || SynthError { disp, prev, next };
    if disp.y <= 0.0 {
        return Err(fail());
    }
    let down = |v: Vec2| v.x == 0.0 && v.y > 0.0;
    let right = |v: Vec2| v.x > 0.0 && v.y == 0.0;

    if disp.x < 0.0 {
        if let Some(p) = prev {
            if !down(p) {
                return Err(fail());
            }
            let corr = p.y * 0.5;
            let c1 = Vec2::new(0.0, disp.y.mul_add(0.3, corr));
            return Ok(Synth {
                ctrl: CtrlSegment::with_c1(disp + Vec2::new(0.0, corr), c1),
                corr,
            });
        }
        if let Some(n) = next {
            if !down(n) {
                return Err(fail());
            }
            let corr = (n.y * 0.5).min(unit.y);
            let c2 = Vec2::new(disp.x, (disp.y + corr) / 2.0);
            return Ok(Synth::plain(CtrlSegment::with_c2(
                disp + Vec2::new(0.0, corr),
                c2,
            )));
        }

        if disp.x.abs() < unit.x * 1.5 {
            Ok(Synth::plain(CtrlSegment::line(disp)))
        } else if disp.x.abs() < disp.y.abs() {
            let mut c1 = disp / 2.0;
            c1.x *= (c1.x / c1.y).abs();
            Ok(Synth::plain(CtrlSegment::with_c1(disp, c1)))
        } else {
            let mut c2 = disp / 2.4;
            c2.y += (1.0 - (c2.y / c2.x).abs()) * (disp.y - c2.y);
            Ok(Synth::plain(CtrlSegment::with_c2(disp, c2)))
        }
    } else {
        match (prev, next) {
            (Some(p), Some(n)) => {
                if !(down(p) && right(n)) {
                    return Err(fail());
                }
                let corr = p.y * 0.5;
                let c1 = Vec2::new(0.0, disp.y.mul_add(0.3, corr));
                let c2 = Vec2::new(
                    (disp.x * 2.0).min(f64::midpoint(disp.x, n.x)),
                    disp.y + corr,
                );
                Ok(Synth {
                    ctrl: CtrlSegment::cubic(disp + Vec2::new(n.x, corr), c1, c2),
                    corr,
                })
            }
            (Some(p), None) => {
                if !down(p) {
                    return Err(fail());
                }
                let corr = p.y * 0.5;
                let c1 = Vec2::new(0.0, disp.y.mul_add(0.3, corr));
                Ok(Synth {
                    ctrl: CtrlSegment::with_c1(disp + Vec2::new(0.0, corr), c1),
                    corr,
                })
            }
            (None, Some(n)) => {
                if down(n) {
                    let corr = (n.y * 0.5).min(unit.y);
                    let c1 = Vec2::new(disp.x, (disp.y + corr) * 0.4);
                    Ok(Synth::plain(CtrlSegment::with_c1(
                        disp + Vec2::new(0.0, corr),
                        c1,
                    )))
                } else if right(n) {
                    Ok(Synth::plain(CtrlSegment::with_c1(disp + n, disp)))
                } else {
                    Err(fail())
                }
            }
            (None, None) => {
                if disp.x.abs() < unit.x * 1.5 {
                    Ok(Synth::plain(CtrlSegment::line(disp)))
                } else if disp.x.abs() < disp.y.abs() {
                    let mut c2 = disp / 2.0;
                    c2.x *= (c2.x / c2.y).abs();
                    Ok(Synth::plain(CtrlSegment::with_c2(disp, c2)))
                } else {
                    let mut c2 = disp / 2.0;
                    c2.y += disp.y * (1.0 - (c2.y / c2.x).abs()) * 0.5;
                    Ok(Synth::plain(CtrlSegment::with_c2(disp, c2)))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: Vec2 = Vec2::new(80.0, 110.0);

    #[test]
    fn shallow_lone_sweep_stays_straight() {
        let s = synth_ctrl(Vec2::new(-60.0, 200.0), None, None, UNIT).expect("synthesizes");
        assert!(s.ctrl.is_line());
        assert_eq!(s.corr, 0.0);
    }

    #[test]
    fn steep_lone_sweep_bends_forward() {
        let disp = Vec2::new(-150.0, 400.0);
        let s = synth_ctrl(disp, None, None, UNIT).expect("synthesizes");
        assert!(!s.ctrl.is_line());
        assert_eq!(s.ctrl.end, disp);
        // First control point pulled toward the vertical.
        let c1 = s.ctrl.c1.expect("quadratic-style handle");
        assert!(c1.x.abs() < (disp.x / 2.0).abs());
    }

    #[test]
    fn preceding_drop_overshoots_the_corner() {
        let prev = Vec2::new(0.0, 300.0);
        let disp = Vec2::new(-120.0, 200.0);
        let s = synth_ctrl(disp, Some(prev), None, UNIT).expect("synthesizes");
        assert_eq!(s.corr, 150.0);
        assert_eq!(s.ctrl.end, disp + Vec2::new(0.0, 150.0));
        assert_eq!(s.ctrl.c1, Some(Vec2::new(0.0, 210.0)));
    }

    #[test]
    fn following_drop_caps_overshoot_at_one_unit() {
        let next = Vec2::new(0.0, 400.0);
        let disp = Vec2::new(-120.0, 200.0);
        let s = synth_ctrl(disp, None, Some(next), UNIT).expect("synthesizes");
        // min(400 / 2, unit.y) = 110.
        assert_eq!(s.ctrl.end, disp + Vec2::new(0.0, 110.0));
        assert_eq!(s.corr, 0.0);
    }

    #[test]
    fn press_between_drop_and_run_spans_both_corners() {
        let prev = Vec2::new(0.0, 200.0);
        let next = Vec2::new(90.0, 0.0);
        let disp = Vec2::new(100.0, 260.0);
        let s = synth_ctrl(disp, Some(prev), Some(next), UNIT).expect("synthesizes");
        assert_eq!(s.corr, 100.0);
        assert_eq!(s.ctrl.end, Vec2::new(190.0, 360.0));
        assert_eq!(s.ctrl.c2, Some(Vec2::new(95.0, 360.0)));
    }

    #[test]
    fn upward_or_mismatched_neighbors_are_rejected() {
        assert!(synth_ctrl(Vec2::new(-50.0, -100.0), None, None, UNIT).is_err());
        // Down-left after a horizontal run has no rule.
        let e = synth_ctrl(
            Vec2::new(-50.0, 100.0),
            Some(Vec2::new(80.0, 0.0)),
            None,
            UNIT,
        )
        .expect_err("rejected");
        assert!(e.to_string().contains("after (80, 0)"));
    }
}
