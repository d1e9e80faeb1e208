//! Stroke outline generation.
//!
//! Each skeleton stroke is walked segment by segment while two open
//! contours grow in parallel, one per side of the brush. Every segment is
//! dispatched on its direction together with the directions before and
//! after it; the handler extends both sides, consults the occupancy grid
//! for neighbors, and applies the matching serif, joint or terminal shape
//! from [`style`]. When a stroke ends the trailing side is reversed onto
//! the leading one and the closed outline is emitted.
//!
//! The dispatch is a closed world: a neighborhood no handler covers is a
//! [`ContourError::Unsupported`], never a silent straight-line fallback.

use kaishu_graphics::{
    line_intersection, warp_template, CtrlSegment, Point, RelPath, Scalar, Vec2, Vec2Ext, EPSILON,
};

use crate::config::Metrics;
use crate::dir::{classify_path, dir_string, Dir};
use crate::error::{ContourError, DataError};
use crate::grid::{OccupancyGrid, Role, SegKind, TouchRecord};
use crate::skeleton::CharSkeleton;
use crate::synth::{synth_ctrl, Synth};

pub mod style;

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Outline every stroke of a character.
pub fn outline_char(
    skeleton: &CharSkeleton,
    metrics: &Metrics,
) -> Result<Vec<RelPath>, ContourError> {
    let grid = OccupancyGrid::build(&skeleton.paths, &skeleton.lattice)?;
    let mut outlines = Vec::new();
    for npath in 0..skeleton.paths.len() {
        outlines.extend(outline_stroke(skeleton, &grid, metrics, npath)?);
    }
    Ok(outlines)
}

/// Outline one stroke against the shared occupancy grid.
pub fn outline_stroke(
    skeleton: &CharSkeleton,
    grid: &OccupancyGrid,
    metrics: &Metrics,
    npath: usize,
) -> Result<Vec<RelPath>, ContourError> {
    Walker::new(skeleton, grid, metrics, npath)?.run()
}

/// Close a path geometrically: append the gap back to the anchor when the
/// end does not already coincide with it.
fn close_path(path: &mut RelPath) {
    let gap = path.start_pos() - path.end_pos();
    if gap.hypot() > EPSILON {
        path.push(CtrlSegment::line(gap));
    }
    path.close();
}

/// Serif reach granted by the free space ahead of a stroke end.
fn serif_reach(extend: Scalar, w: Scalar) -> Scalar {
    if extend > w * 1.5 {
        w / 2.0
    } else if extend > w / 2.0 {
        w / 4.0
    } else {
        0.0
    }
}

/// Translate a centerline span by `d` while keeping its start anchored,
/// lengthening the span backwards.
fn shift_spine(seg: &CtrlSegment, d: Vec2) -> CtrlSegment {
    let c = seg.to_cubic(Point::ZERO);
    CtrlSegment::cubic(seg.end + d, c.p1.to_vec2() + d, c.p2.to_vec2() + d)
}

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

struct Walker<'a> {
    skeleton: &'a CharSkeleton,
    grid: &'a OccupancyGrid,
    npath: usize,
    w: Scalar,
    hw: Scalar,
    unit: Vec2,
    /// Working copy of the stroke's displacements; handlers shorten or
    /// extend segments locally without touching the shared skeleton.
    disps: Vec<Vec2>,
    dirs: Vec<Dir>,
    /// Leading brush side; the finished outline starts here.
    lead: RelPath,
    /// Trailing brush side, reversed onto the lead when the stroke ends.
    trail: RelPath,
    outlines: Vec<RelPath>,
    pre_pos: Point,
    curr_pos: Point,
    pre_dir: Option<Dir>,
    pre_disp: Option<Vec2>,
    index: usize,
    /// Shape scale carried across segments of one stroke; a head handler
    /// that scales its serif down leaves the tail at the same scale.
    ratio: Scalar,
}

impl<'a> Walker<'a> {
    fn new(
        skeleton: &'a CharSkeleton,
        grid: &'a OccupancyGrid,
        metrics: &Metrics,
        npath: usize,
    ) -> Result<Self, ContourError> {
        let path = &skeleton.paths[npath];
        let dirs = classify_path(path).ok_or_else(|| {
            let bad = path
                .segments()
                .iter()
                .position(|s| s.end.hypot() < EPSILON)
                .unwrap_or(0);
            DataError::DegenerateSegment {
                stroke: npath,
                segment: bad,
            }
        })?;
        Ok(Self {
            skeleton,
            grid,
            npath,
            w: metrics.stroke_width,
            hw: metrics.half_width(),
            unit: skeleton.unit,
            disps: path.segments().iter().map(|s| s.end).collect(),
            dirs,
            lead: RelPath::new(Point::ZERO),
            trail: RelPath::new(Point::ZERO),
            outlines: Vec::new(),
            pre_pos: path.start_pos(),
            curr_pos: path.start_pos(),
            pre_dir: None,
            pre_disp: None,
            index: 0,
            ratio: 1.0,
        })
    }

    fn run(mut self) -> Result<Vec<RelPath>, ContourError> {
        while self.index < self.disps.len() {
            self.curr_pos = self.pre_pos + self.disps[self.index];
            match self.dirs[self.index] {
                Dir::Right => self.handle_right()?,
                Dir::Down => self.handle_down()?,
                Dir::DownLeft => self.handle_sweep()?,
                Dir::DownRight => self.handle_falling()?,
                Dir::Left => self.handle_leftward()?,
                Dir::UpRight => self.handle_rising()?,
                Dir::Up | Dir::UpLeft => return Err(self.unsupported()),
            }
            if self.index >= self.disps.len() {
                break;
            }
            self.pre_disp = Some(self.disps[self.index]);
            self.pre_dir = Some(self.dirs[self.index]);
            self.pre_pos = self.curr_pos;
            self.index += 1;
        }
        Ok(self.outlines)
    }

    // -- shared helpers -----------------------------------------------------

    fn disp(&self) -> Vec2 {
        self.disps[self.index]
    }

    fn nect_dir(&self) -> Option<Dir> {
        self.dirs.get(self.index + 1).copied()
    }

    /// Direction-code string of the rest of the stroke, used to spot
    /// compound patterns such as the vertical-hook and the press.
    fn rest_codes(&self) -> String {
        dir_string(&self.dirs[self.index..])
    }

    fn unsupported(&self) -> ContourError {
        ContourError::Unsupported {
            stroke: self.npath,
            segment: self.index,
            prev: self.pre_dir,
            curr: self.dirs[self.index.min(self.dirs.len() - 1)],
            next: self.nect_dir(),
        }
    }

    fn geo(&self, what: &'static str) -> ContourError {
        ContourError::Geometry {
            stroke: self.npath,
            segment: self.index,
            what,
        }
    }

    fn synth(
        &self,
        disp: Vec2,
        prev: Option<Vec2>,
        next: Option<Vec2>,
    ) -> Result<Synth, ContourError> {
        synth_ctrl(disp, prev, next, self.unit).map_err(|source| ContourError::Synth {
            stroke: self.npath,
            segment: self.index,
            source,
        })
    }

    fn probe_at(&self, pos: Point, tangent: Vec2, seg: usize) -> crate::grid::Probe {
        self.grid.probe(pos, tangent, self.npath, seg, self.hw)
    }

    fn root_y(
        &self,
        seg: &CtrlSegment,
        value: Scalar,
        start: Point,
        what: &'static str,
    ) -> Result<Scalar, ContourError> {
        seg.roots_y(value, start)
            .first()
            .copied()
            .ok_or_else(|| self.geo(what))
    }

    fn root_x(
        &self,
        seg: &CtrlSegment,
        value: Scalar,
        start: Point,
        what: &'static str,
    ) -> Result<Scalar, ContourError> {
        seg.roots_x(value, start)
            .first()
            .copied()
            .ok_or_else(|| self.geo(what))
    }

    fn hit(
        &self,
        a: &CtrlSegment,
        a_start: Point,
        b: &CtrlSegment,
        b_start: Point,
        what: &'static str,
    ) -> Result<(Scalar, Scalar), ContourError> {
        a.intersections(a_start, b, b_start)
            .first()
            .copied()
            .ok_or_else(|| self.geo(what))
    }

    fn cross(
        &self,
        a1: Point,
        a2: Point,
        b1: Point,
        b2: Point,
        what: &'static str,
    ) -> Result<Point, ContourError> {
        line_intersection(a1, a2, b1, b2).ok_or_else(|| self.geo(what))
    }

    fn last_of(&self, path: &RelPath, what: &'static str) -> Result<CtrlSegment, ContourError> {
        path.last().copied().ok_or_else(|| self.geo(what))
    }

    /// Reverse the trail onto the lead, close, and emit the outline.
    fn finish(&mut self) {
        let trail = std::mem::replace(&mut self.trail, RelPath::new(Point::ZERO));
        let mut out = std::mem::replace(&mut self.lead, RelPath::new(Point::ZERO));
        out.concat(&trail.reverse());
        close_path(&mut out);
        self.outlines.push(out);
    }

    /// Rebuild a neighboring stroke segment's curved centerline, the way
    /// its own handler will curve it, so collision trimming happens against
    /// the curve and not the straight skeleton. Returns the curve and its
    /// anchor.
    fn neighbor_curve(
        &self,
        path: usize,
        seg: usize,
    ) -> Result<(CtrlSegment, Point), ContourError> {
        let coll = &self.skeleton.paths[path];
        let disp = coll.segments()[seg].end;
        if coll.len() > 1 && disp.y > 0.0 {
            if seg == 0 {
                return Err(self.unsupported());
            }
            let prev = coll.segments()[seg - 1].end;
            if Dir::classify(prev) == Some(Dir::Down) {
                let s = self.synth(disp, Some(prev), None)?;
                let mut anchor = coll.pos_at(seg);
                anchor.y -= s.corr;
                return Ok((s.ctrl, anchor));
            }
        }
        let s = self.synth(disp, None, None)?;
        Ok((s.ctrl, coll.pos_at(seg)))
    }

    /// Nudge applied to the trailing side where a shallow sweep hooks off
    /// the end of a horizontal bar.
    fn hook_backset(&self, disp: Vec2) -> Scalar {
        let radian = -(-disp).polar_angle();
        self.hw - self.hw / radian.tan() - self.hw / radian.sin()
    }

    // -- horizontal bars ----------------------------------------------------

    fn handle_right(&mut self) -> Result<(), ContourError> {
        let st = &style::HORIZONTAL;
        let (w, hw) = (self.w, self.hw);
        let mut path_len = self.disp().x;

        match self.pre_dir {
            None => {
                let probe = self.probe_at(self.pre_pos, -self.disp(), self.index);
                let mut extend = probe.extend;
                let mut serif = true;
                let mut other = false;

                for i in 0..probe.front.len() {
                    let rec = probe.front[i];
                    if rec.kind != SegKind::Diagonal {
                        if let Some(mark) = rec.mark {
                            // A vertical ending here that continues as a
                            // sweep hugs the bar head; no serif room lost.
                            if mark.dir == Dir::Down && i + 1 < probe.front.len() {
                                let temp = probe.front[i + 1];
                                if temp.mark.is_some_and(|m| m.dir == Dir::DownLeft)
                                    && temp.path == rec.path
                                    && rec.seg + 1 == temp.seg
                                {
                                    extend = Some(0.0);
                                    continue;
                                }
                            }
                        }
                        serif = false;
                    } else if rec.is_padding() {
                        if probe.front.iter().any(|r| r.kind != SegKind::Diagonal) {
                            continue;
                        }
                        let (coll, coll_pos) = self.neighbor_curve(rec.path, rec.seg)?;
                        let own = CtrlSegment::line(self.disp());
                        if let Some(&(_, t)) =
                            coll.intersections(coll_pos, &own, self.pre_pos).first()
                        {
                            let coll_p = own.value_at(t, self.pre_pos);
                            self.disps[self.index].x -= coll_p.x - self.pre_pos.x;
                            self.pre_pos = coll_p;
                            path_len = self.disp().x;
                            serif = false;
                        }
                        extend = Some(0.0);
                    } else {
                        match rec.mark {
                            Some(m) if m.dir == Dir::DownLeft && m.role == Role::Start => {
                                let coll = &self.skeleton.paths[rec.path];
                                if rec.seg > 0 && coll.segments()[rec.seg - 1].end.x == 0.0 {
                                    continue;
                                }
                                serif = false;
                            }
                            Some(m) if m.dir == Dir::DownLeft && m.role == Role::End => {
                                other = true;
                            }
                            _ => return Err(self.unsupported()),
                        }
                    }
                }
                let mut i = 0;
                while i < probe.back.len() {
                    let rec = probe.back[i];
                    if rec.is_padding() {
                        if rec.kind != SegKind::Diagonal {
                            serif = false;
                        }
                    } else {
                        if rec.mark.is_some_and(|m| m.dir == Dir::Down)
                            && i + 1 < probe.back.len()
                        {
                            let temp = probe.back[i + 1];
                            if temp.mark.is_some_and(|m| m.dir == Dir::DownLeft)
                                && temp.path == rec.path
                                && rec.seg + 1 == temp.seg
                            {
                                extend = Some(0.0);
                                i += 2;
                                continue;
                            }
                        }
                        other = true;
                    }
                    i += 1;
                }

                if serif {
                    let mut reach = extend.unwrap_or(9999.0);
                    if other {
                        if reach < st.length {
                            return Err(self.unsupported());
                        }
                        reach = st.length;
                    } else {
                        reach = serif_reach(reach, w);
                    }
                    path_len += reach;
                    let area_len = self.disp().x.abs() / 2.0 + reach;

                    let head = self.pre_pos - Vec2::new(reach, hw);
                    self.lead = RelPath::new(head);
                    self.lead.line(Vec2::new(path_len, 0.0));
                    self.trail = RelPath::new(head);
                    if area_len < st.length {
                        self.trail.line(Vec2::new(area_len, w));
                        self.trail.line(Vec2::new(path_len - area_len, 0.0));
                    } else {
                        self.trail.line(Vec2::new(0.0, st.v[0]));
                        self.trail.line(Vec2::new(st.length, w - st.v[0]));
                        self.trail.line(Vec2::new(path_len - st.length, 0.0));
                    }
                } else {
                    let head = self.pre_pos - Vec2::new(0.0, hw);
                    self.lead = RelPath::new(head);
                    self.lead.line(Vec2::new(path_len, 0.0));
                    self.trail = RelPath::new(head);
                    self.trail.line(Vec2::new(0.0, w));
                    self.trail.line(Vec2::new(path_len, 0.0));
                }
            }
            Some(Dir::Down | Dir::DownLeft) => {
                let to_curr = self.curr_pos - self.lead.end_pos();
                self.lead.line(to_curr + Vec2::new(0.0, -hw));
                let to_curr = self.curr_pos - self.trail.end_pos();
                self.trail.line(to_curr + Vec2::new(0.0, hw));
            }
            _ => return Err(self.unsupported()),
        }

        match self.nect_dir() {
            None => self.right_tail()?,
            Some(Dir::Down | Dir::DownLeft | Dir::DownRight) => self.right_into_down()?,
            _ => return Err(self.unsupported()),
        }
        Ok(())
    }

    /// Free tail of a horizontal bar.
    fn right_tail(&mut self) -> Result<(), ContourError> {
        let st = &style::HORIZONTAL.end;
        let (w, hw) = (self.w, self.hw);
        let probe = self.probe_at(self.curr_pos, self.disp(), self.index);
        let mut extend = probe.extend;
        let mut serif = true;
        let mut other = false;

        for rec in &probe.front {
            if rec.kind != SegKind::Diagonal {
                serif = false;
            } else {
                extend = Some(0.0);
            }
        }
        for rec in &probe.back {
            if rec.is_padding() {
                if rec.kind != SegKind::Diagonal {
                    serif = false;
                } else {
                    if probe.front.iter().any(|r| r.kind != SegKind::Diagonal) {
                        continue;
                    }
                    let coll = &self.skeleton.paths[rec.path];
                    if coll.len() == 1 {
                        // A lone sweep crossing the bar end: pull both
                        // edges onto its curved flank.
                        let temp = coll.segments()[0].end;
                        let coll_ctrl = self.synth(temp, None, None)?.ctrl;
                        let coll_pos = coll.pos_at(rec.seg);
                        let own = CtrlSegment::line(self.disp());
                        if let Some(&(ct, _)) =
                            coll_ctrl.intersections(coll_pos, &own, self.pre_pos).first()
                        {
                            let tan = coll_ctrl.tangent_line(ct, coll_pos);
                            let up = Vec2::new(0.0, hw);
                            let c0 = self
                                .cross(tan.0, tan.1, self.pre_pos - up, self.curr_pos - up, "sweep flank")?
                                .x
                                - self.curr_pos.x;
                            let c1 = self
                                .cross(tan.0, tan.1, self.pre_pos + up, self.curr_pos + up, "sweep flank")?
                                .x
                                - self.curr_pos.x;
                            self.lead.nudge_last(Vec2::new(c0, 0.0));
                            self.trail.nudge_last(Vec2::new(c1, 0.0));
                            serif = false;
                            break;
                        }
                    }
                    extend = Some(0.0);
                }
            } else if rec.mark.is_some_and(|m| m.dir == Dir::Down) {
                if probe.back.len() != 1 {
                    return Err(self.unsupported());
                }
                serif = false;
            } else {
                other = true;
            }
        }

        if serif {
            let mut reach = extend.unwrap_or(9999.0);
            if other {
                if reach < st.length {
                    return Err(self.unsupported());
                }
                reach = st.length;
            } else {
                reach = serif_reach(reach, w);
            }
            let area_len = self.disp().x.abs() / 2.0 + reach;
            let ratio = (area_len / st.length).min(1.0);

            self.lead
                .nudge_last(Vec2::new(reach - st.length * ratio, 0.0));
            self.lead.line(Vec2::new(st.h[0] * ratio, -st.v[0]));
            self.lead.line(Vec2::new(
                (st.length - st.h[0]) * ratio,
                w + st.v[0] - st.v[1],
            ));
            self.lead.line(Vec2::new(0.0, st.v[1]));
            self.trail.nudge_last(Vec2::new(reach, 0.0));
        } else {
            let bridge = self.trail.end_pos() - self.lead.end_pos();
            self.lead.line(bridge);
        }
        self.finish();
        Ok(())
    }

    /// A horizontal bar handing over to a downward stroke.
    fn right_into_down(&mut self) -> Result<(), ContourError> {
        let st = &style::HORIZONTAL.end2;
        let (w, hw) = (self.w, self.hw);
        let probe = self.probe_at(self.curr_pos, self.disp(), self.index);

        let mut serif = true;
        for rec in probe.front.iter().chain(&probe.back) {
            if rec.path == self.npath && (rec.seg == self.index || rec.seg == self.index + 1) {
                continue;
            }
            match rec.mark {
                Some(m) if m.dir == Dir::Down && m.role == Role::End => serif = false,
                None if rec.kind == SegKind::Vertical => serif = false,
                Some(m) if m.dir == Dir::DownRight && m.role == Role::Start => {}
                Some(m) if m.dir == Dir::DownLeft && m.role == Role::Start => {}
                _ => return Err(self.unsupported()),
            }
        }

        let reach = st.h[1];
        let area_len = self.disp().x.abs() / 2.0 + reach;
        let ratio = (area_len / st.length).min(1.0);

        if serif {
            self.lead
                .nudge_last(Vec2::new(hw - (st.length - st.h[1]) * ratio, 0.0));
            self.lead
                .line(Vec2::new(st.h[0] * ratio, -st.v[0] * ratio));
            self.lead
                .line(Vec2::new((st.length - st.h[0]) * ratio, st.v[1]));
            self.lead.line(Vec2::new(-st.h[1] * ratio, st.v[2]));
            self.trail.nudge_last(Vec2::new(-hw, 0.0));
        } else {
            self.lead.nudge_last(Vec2::new(hw, 0.0));
            self.lead.line(Vec2::new(0.0, w));
            self.trail.nudge_last(Vec2::new(-hw, 0.0));
        }
        Ok(())
    }

    // -- vertical bars ------------------------------------------------------

    fn handle_down(&mut self) -> Result<(), ContourError> {
        let st = &style::VERTICAL;
        let (w, hw) = (self.w, self.hw);
        let mut st_length = st.length;
        let mut path_len = self.disp().y;

        match self.pre_dir {
            None => {
                let probe = self.probe_at(self.pre_pos, -self.disp(), self.index);
                let mut extend = probe.extend;
                let mut serif = true;
                let mut other = false;
                let mut corrs = [0.0, 0.0];

                for rec in &probe.front {
                    if rec.kind != SegKind::Diagonal {
                        serif = false;
                    } else if !rec.is_padding() {
                        other = true;
                    } else {
                        if probe
                            .front
                            .iter()
                            .chain(&probe.back)
                            .any(|r| !r.is_padding())
                        {
                            continue;
                        }
                        let (coll, coll_pos) = self.neighbor_curve(rec.path, rec.seg)?;
                        let own = CtrlSegment::line(self.disp());
                        if let Some(&(ct, t)) =
                            coll.intersections(coll_pos, &own, self.pre_pos).first()
                        {
                            let coll_p = own.value_at(t, self.pre_pos);
                            self.disps[self.index].y -= coll_p.y - self.pre_pos.y;
                            self.pre_pos = coll_p;
                            path_len = self.disp().y;
                            serif = false;

                            let tan = coll.tangent_line(ct, coll_pos);
                            let side = Vec2::new(hw, 0.0);
                            corrs[0] = self
                                .cross(
                                    tan.0,
                                    tan.1,
                                    self.pre_pos + side,
                                    self.curr_pos + side,
                                    "head flank",
                                )?
                                .y
                                - self.pre_pos.y;
                            corrs[1] = self
                                .cross(
                                    tan.0,
                                    tan.1,
                                    self.pre_pos - side,
                                    self.curr_pos - side,
                                    "head flank",
                                )?
                                .y
                                - self.pre_pos.y;
                        }
                        extend = Some(0.0);
                    }
                }
                for rec in &probe.back {
                    if rec.is_padding() {
                        if rec.kind != SegKind::Diagonal {
                            serif = false;
                        }
                    } else {
                        other = true;
                    }
                }

                if serif {
                    let mut reach = extend.unwrap_or(9999.0);
                    if other {
                        let reach_test = st.length - hw;
                        if reach < w {
                            return Err(self.unsupported());
                        } else if reach < reach_test {
                            st_length = reach;
                        } else {
                            reach = reach_test;
                        }
                    } else {
                        reach = serif_reach(reach, w);
                    }
                    path_len += reach;
                    let area_len = self.disp().y.abs() * 2.0 / 3.0 + reach;

                    if area_len < st_length {
                        let head = self.pre_pos - Vec2::new(hw + st.h[0], reach);
                        self.lead = RelPath::new(head);
                        self.lead
                            .line(Vec2::new(st.h[0] + w + st.h[2], area_len - st.v[1]));
                        self.lead.line(Vec2::new(-st.h[2], st.v[1]));
                        self.lead.line(Vec2::new(0.0, path_len - area_len));
                        self.trail = RelPath::new(head);
                        self.trail.line(Vec2::new(st.h[0], area_len));
                        self.trail.line(Vec2::new(0.0, path_len - area_len));
                    } else {
                        let head = self.pre_pos - Vec2::new(hw + st.h[0] - st.h[1], reach);
                        self.lead = RelPath::new(head);
                        self.lead.line(Vec2::new(
                            st.h[0] - st.h[1] + w + st.h[2],
                            st_length - st.v[1],
                        ));
                        self.lead.line(Vec2::new(-st.h[2], st.v[1]));
                        self.lead.line(Vec2::new(0.0, path_len - st_length));
                        self.trail = RelPath::new(head);
                        self.trail.line(Vec2::new(-st.h[1], st.v[0]));
                        self.trail.line(Vec2::new(st.h[0], st_length - st.v[0]));
                        self.trail.line(Vec2::new(0.0, path_len - st_length));
                    }
                } else {
                    let head = self.pre_pos - Vec2::new(hw, -corrs[1]);
                    self.lead = RelPath::new(head);
                    self.lead.line(Vec2::new(w, corrs[0] - corrs[1]));
                    self.lead.line(Vec2::new(0.0, path_len + corrs[1]));
                    self.trail = RelPath::new(head);
                    self.trail.line(Vec2::new(0.0, path_len + corrs[0]));
                }
            }
            Some(Dir::Right | Dir::UpRight | Dir::DownRight | Dir::DownLeft) => {
                let dy = self.curr_pos.y - self.lead.end_pos().y;
                self.lead.line(Vec2::new(0.0, dy));
                let dy = self.curr_pos.y - self.trail.end_pos().y;
                self.trail.line(Vec2::new(0.0, dy));
            }
            _ => return Err(self.unsupported()),
        }

        match self.nect_dir() {
            None => self.down_tail()?,
            Some(Dir::Right) => self.down_into_right()?,
            Some(Dir::DownRight | Dir::DownLeft | Dir::Left | Dir::UpRight) => {}
            _ => return Err(self.unsupported()),
        }
        Ok(())
    }

    /// Tangent correction where a horizontal neighbor rides on a press
    /// curve right at this vertical's foot.
    fn down_tail_press_corr(&mut self, rec: TouchRecord) -> Result<bool, ContourError> {
        if rec.kind != SegKind::Horizontal || rec.seg == 0 {
            return Ok(false);
        }
        let coll = &self.skeleton.paths[rec.path];
        let temp = coll.segments()[rec.seg - 1].end;
        if Dir::classify(temp) != Some(Dir::DownRight) {
            return Ok(false);
        }
        let next = coll.segments()[rec.seg].end;
        let coll_ctrl = self.synth(temp, None, Some(next))?.ctrl;
        let coll_pos = coll.pos_at(rec.seg - 1);
        let own = CtrlSegment::line(self.disp());
        let (ct, _) = self.hit(&coll_ctrl, coll_pos, &own, self.pre_pos, "press crossing")?;
        let tan = coll_ctrl.tangent_line(ct, coll_pos);
        let side = Vec2::new(self.hw, 0.0);
        let c0 = self
            .cross(tan.0, tan.1, self.pre_pos + side, self.curr_pos + side, "press flank")?
            .y
            - self.curr_pos.y;
        let c1 = self
            .cross(tan.0, tan.1, self.pre_pos - side, self.curr_pos - side, "press flank")?
            .y
            - self.curr_pos.y;
        self.lead.nudge_last(Vec2::new(0.0, c0));
        self.trail.nudge_last(Vec2::new(0.0, c1));
        Ok(true)
    }

    fn down_tail(&mut self) -> Result<(), ContourError> {
        let st = &style::VERTICAL.end;
        let w = self.w;
        let mut end_length = st.length;
        let probe = self.probe_at(self.curr_pos, self.disp(), self.index);
        let extend = probe.extend;
        let mut serif = true;
        let mut other = false;

        for rec in &probe.front {
            if self.down_tail_press_corr(*rec)? {
                serif = false;
                break;
            }
            if rec.kind != SegKind::Diagonal {
                if rec.mark.is_some_and(|m| m.dir == Dir::Right) {
                    other = true;
                } else {
                    serif = false;
                }
            }
        }
        for rec in &probe.back {
            if self.down_tail_press_corr(*rec)? {
                serif = false;
                break;
            }
            if rec.is_padding() {
                if rec.kind != SegKind::Diagonal {
                    serif = false;
                }
            } else {
                other = true;
            }
        }

        if serif {
            let mut reach = extend.unwrap_or(9999.0);
            if other {
                let reach_test = end_length;
                if reach < w {
                    return Err(self.unsupported());
                } else if reach < reach_test {
                    end_length = reach;
                } else {
                    reach = reach_test;
                }
            } else {
                reach = serif_reach(reach, w);
            }
            let area_len = self.disp().y.abs() / 3.0 + reach;
            let ratio = (area_len / end_length).min(1.0);

            self.lead.nudge_last(Vec2::new(0.0, reach - st.v[0]));
            self.lead.line(Vec2::new(-w + st.h[0], st.v[0]));
            self.trail
                .nudge_last(Vec2::new(0.0, reach - end_length * ratio));
            self.trail.line(Vec2::new(st.h[0], end_length * ratio));
        } else {
            let bridge = self.trail.end_pos() - self.lead.end_pos();
            self.lead.line(bridge);
        }
        self.finish();
        Ok(())
    }

    /// A vertical turning right: either the full vertical-hook compound or
    /// a plain folded corner.
    fn down_into_right(&mut self) -> Result<(), ContourError> {
        let (w, hw) = (self.w, self.hw);
        let probe = self.probe_at(self.curr_pos, self.disp(), self.index);
        for rec in probe.front.iter().chain(&probe.back) {
            if rec.path != self.npath || (rec.seg != self.index && rec.seg != self.index + 1) {
                return Err(self.unsupported());
            }
        }

        if self.rest_codes() == "268" {
            let c = &style::HOOK_CORNER;
            let b = &style::HOOK_BARB;
            let last = self.last_of(&self.lead, "hook needs a span above")?;
            if last.end.y < hw + c.v[0] {
                return Err(self.unsupported());
            }

            self.index += 1;
            let run = self.disps[self.index].x;
            self.lead.nudge_last(Vec2::new(0.0, -(hw + c.v[0])));
            self.lead.push(CtrlSegment::cubic(
                Vec2::new(run / 2.0 - hw, c.v[0]),
                Vec2::new(0.0, c.v[1]),
                Vec2::new(c.h[0], c.v[0]),
            ));
            self.trail.nudge_last(Vec2::new(0.0, -(hw + c.v[0])));
            self.trail.push(CtrlSegment::cubic(
                Vec2::new(run / 2.0 + hw, c.v[0] + w),
                Vec2::new(0.0, c.v[0] + c.v[2]),
                Vec2::new(c.h[1], c.v[0] + w),
            ));

            self.index += 1;
            let rise = self.disps[self.index];
            let room = self
                .probe_at(self.curr_pos, rise, self.index)
                .extend_or_open()
                / 2.0
                - rise.y;
            let up = room.min(self.unit.y);
            let half = run / 2.0;
            self.lead.push(CtrlSegment::cubic(
                Vec2::new(half, -up + hw),
                Vec2::new(half - hw, 0.0),
                Vec2::new(half - b.h[0], -b.v[0]),
            ));
            self.trail.push(CtrlSegment::cubic(
                Vec2::new(half, -hw),
                Vec2::new(b.h[1], 0.0),
                Vec2::new(half - b.h[2], 0.0),
            ));
            self.trail.push(CtrlSegment::with_c1(
                Vec2::new(w / 4.0, -up),
                Vec2::new(hw, -w * w / 4.0 / b.h[2]),
            ));

            let bridge = self.trail.end_pos() - self.lead.end_pos();
            self.lead.line(bridge);
            self.finish();
            self.index = self.disps.len();
        } else {
            self.lead.nudge_last(Vec2::new(0.0, -hw));
            self.trail.nudge_last(Vec2::new(0.0, -w * 0.75));
            self.trail.line(Vec2::new(-w * 2.0 / 3.0, hw));
            self.trail.line(Vec2::new(w * 2.0 / 3.0, w));
            self.trail.line(Vec2::new(hw, -w / 4.0));
        }
        Ok(())
    }

    // -- down-left sweeps ---------------------------------------------------

    fn handle_sweep(&mut self) -> Result<(), ContourError> {
        let (w, hw) = (self.w, self.hw);

        let mut index_corr = 0;
        if self.nect_dir() == Some(Dir::DownLeft) {
            let merged = self.disps[self.index] + self.disps[self.index + 1];
            self.index += 1;
            self.disps[self.index] = merged;
            self.curr_pos = self.pre_pos + merged;
            index_corr = 1;
        }
        let path_len = self.disp().hypot();

        if self.pre_dir.is_none() {
            return self.sweep_from_head(path_len, index_corr);
        }

        match (self.pre_dir, self.nect_dir()) {
            (Some(Dir::Right), None) => {
                if self.disp().y < self.unit.y * 2.5 || -self.disp().x < self.unit.x * 1.5 {
                    let to_curr = self.curr_pos - self.lead.end_pos();
                    self.lead.line(to_curr);
                    let normal = CtrlSegment::line(self.disp()).normal_at(1.0, -hw);
                    self.lead.line(normal);
                    self.trail
                        .nudge_last(Vec2::new(self.hook_backset(self.disp()), 0.0));
                    let to_tip = self.curr_pos + normal - self.trail.end_pos();
                    self.trail.line(to_tip);
                } else {
                    let mut comp = RelPath::new(Point::ZERO);
                    comp.line(Vec2::new(0.0, path_len));
                    comp.line(Vec2::new(-hw, 0.0));
                    comp.line(Vec2::new(-w, -path_len));
                    let s = self.synth(self.disp(), None, None)?;
                    let comp = warp_template(&s.ctrl, &comp, self.pre_pos, 2.0 / 3.0);
                    self.sweep_off_bar(&comp, true)?;
                }
                self.finish();
            }
            (Some(Dir::Down), None) => {
                let s = self.synth(self.disp(), self.pre_disp, None)?;
                self.lead.nudge_last(Vec2::new(0.0, -s.corr));
                self.trail.nudge_last(Vec2::new(0.0, -s.corr));
                let pl = path_len + s.corr;

                let mut comp = RelPath::new(Point::ZERO);
                comp.push(CtrlSegment::with_c2(
                    Vec2::new(-hw, pl),
                    Vec2::new(0.0, pl / 2.0),
                ));
                comp.line(Vec2::new(-hw, 0.0));
                comp.line(Vec2::new(0.0, -pl));
                let comp = warp_template(&s.ctrl, &comp, self.pre_pos, 0.5);
                self.lead.concat(&comp);
                self.finish();
            }
            (Some(Dir::Right), Some(Dir::Down)) => {
                let mut comp = RelPath::new(Point::ZERO);
                comp.line(Vec2::new(0.0, path_len));
                comp.line(Vec2::new(-w, 0.0));
                comp.line(Vec2::new(0.0, -path_len));
                let next = self.disps[self.index + 1];
                let s = self.synth(self.disp(), None, Some(next))?;
                let comp = warp_template(&s.ctrl, &comp, self.pre_pos, 0.5);
                self.sweep_off_bar(&comp, false)?;
            }
            (Some(Dir::Right), Some(Dir::Right)) => {
                if self.disp().y < self.unit.y * 2.5 || -self.disp().x < self.unit.x * 1.5 {
                    let along = self.disp().normalized() * hw;
                    let normal = CtrlSegment::line(self.disp()).normal_at(1.0, -hw);
                    self.lead
                        .line(self.curr_pos + along - self.lead.end_pos());
                    self.trail
                        .nudge_last(Vec2::new(self.hook_backset(self.disp()), 0.0));
                    self.trail
                        .line(self.curr_pos + along + normal - self.trail.end_pos());

                    let cut = self.curr_pos.y - hw;
                    let last = self.last_of(&self.lead, "hook corner")?;
                    let t = self.root_y(&last, cut, self.lead.pos_at(self.lead.len() - 1), "hook corner")?;
                    self.lead.replace_last(last.split(t).0);
                    let last = self.last_of(&self.trail, "hook corner")?;
                    let t = self.root_y(&last, cut, self.trail.pos_at(self.trail.len() - 1), "hook corner")?;
                    self.trail.replace_last(last.split(t).0);
                    self.sweep_end_serif();
                } else {
                    return Err(self.unsupported());
                }
            }
            (Some(Dir::Down), Some(Dir::DownRight)) => {
                let s = self.synth(self.disp(), self.pre_disp, None)?;
                self.lead.nudge_last(Vec2::new(0.0, -s.corr));
                self.trail.nudge_last(Vec2::new(0.0, -s.corr));
                let pl = path_len + s.corr;

                let mut comp = RelPath::new(Point::ZERO);
                comp.push(CtrlSegment::with_c2(
                    Vec2::new(-hw, pl),
                    Vec2::new(0.0, pl / 2.0),
                ));
                comp.line(Vec2::new(-hw, 0.0));
                comp.line(Vec2::new(0.0, -pl));
                let comp = warp_template(&s.ctrl, &comp, self.pre_pos, 0.5);
                self.lead.push(comp.segments()[0]);
                self.trail.push(comp.segments()[2].reverse());
            }
            (Some(Dir::Right), Some(Dir::DownRight)) => {
                if self.disp().y < self.unit.y * 2.5 || -self.disp().x < self.unit.x * 1.5 {
                    let along = self.disp().normalized() * hw;
                    let normal = CtrlSegment::line(self.disp()).normal_at(1.0, -hw);
                    self.lead
                        .line(self.curr_pos + along - self.lead.end_pos());
                    self.trail
                        .nudge_last(Vec2::new(self.hook_backset(self.disp()), 0.0));
                    self.trail
                        .line(self.curr_pos + along + normal - self.trail.end_pos());
                } else {
                    return Err(self.unsupported());
                }
            }
            _ => return Err(self.unsupported()),
        }
        Ok(())
    }

    /// Shared fragment: a stroke leaving the underside of a horizontal bar.
    /// `comp` is the warped side template; both flanks are cut where they
    /// cross the bar's lower edge. With `keep_waist` the template's middle
    /// span stays on the leading flank; the terminal cases need it, the
    /// pass-through cases do not.
    fn sweep_off_bar(&mut self, comp: &RelPath, keep_waist: bool) -> Result<(), ContourError> {
        let w = self.w;
        let edge = self.pre_pos.y + self.hw;
        let seg0 = comp.segments()[0];
        let t = self.root_y(&seg0, edge, comp.start_pos(), "bar underside")?;
        let (head, rest) = seg0.split(t);
        let pos1 = comp.start_pos() + head.end;
        self.lead.push(rest);
        if keep_waist {
            self.lead.push(comp.segments()[1]);
        }

        let seg2 = comp.segments()[2];
        let t = self.root_y(&seg2, edge, comp.pos_at(2), "bar underside")?;
        let (head2, _) = seg2.split(t);
        let pos2 = comp.pos_at(2) + head2.end;
        self.trail
            .nudge_last(Vec2::new(-(pos1.x - pos2.x - w), 0.0));
        self.trail.push(head2.reverse());
        Ok(())
    }

    /// End serif where a sweep hands over to a horizontal run.
    fn sweep_end_serif(&mut self) {
        let e = &style::SWEEP.end;
        self.trail.line(Vec2::new(-e.h[0], e.v[0]));
        self.trail.line(Vec2::new(e.h[1], e.v[1]));
        self.trail
            .line(Vec2::new(e.h[2], self.w - e.v[1] - e.v[0]));
    }

    /// Sweep starting a stroke: classify everything touching the head,
    /// build the full sweep body as a warped template, then split it up if
    /// a horizontal run follows.
    #[expect(clippy::too_many_lines, reason = "one neighborhood case per arm")]
    fn sweep_from_head(
        &mut self,
        path_len: Scalar,
        index_corr: usize,
    ) -> Result<(), ContourError> {
        let st = &style::SWEEP;
        let (w, hw) = (self.w, self.hw);
        let area_len = path_len / 3.0;
        let ratio = (area_len / st.length).min(1.0);
        self.ratio = ratio;

        let probe = self.probe_at(self.pre_pos, -self.disp(), self.index - index_corr);
        let mut serif = true;
        let mut attach_h = false;
        let mut attach_v = false;
        let mut attach_d: Option<RelPath> = None;
        let mut temp_check: Option<(usize, usize)> = None;

        for rec in &probe.front {
            match rec.kind {
                SegKind::Horizontal => {
                    if let Some(mark) = rec.mark {
                        if mark.dir == Dir::Right && mark.role == Role::End {
                            serif = false;
                            attach_h = true;
                            attach_v = true;
                        } else {
                            return Err(self.unsupported());
                        }
                    } else {
                        serif = false;
                        attach_h = true;
                    }
                }
                SegKind::Vertical => {
                    serif = false;
                    match temp_check {
                        Some((p, s)) if p == rec.path && s + 1 == rec.seg => {
                            let coll = &self.skeleton.paths[p];
                            let next = coll.segments()[s + 1].end;
                            let seg = coll.segments()[s].end;
                            let anchor = coll.pos_at(s);
                            let ctrl = self.synth(seg, None, Some(next))?.ctrl;
                            let mut d = RelPath::new(anchor);
                            d.push(ctrl);
                            attach_d = Some(d);
                        }
                        _ => attach_v = true,
                    }
                }
                SegKind::Diagonal => {
                    if let Some(mark) = rec.mark {
                        serif = false;
                        if mark.dir == Dir::DownRight && mark.role == Role::End {
                            temp_check = Some((rec.path, rec.seg));
                        }
                    }
                }
            }
        }
        for rec in &probe.back {
            match rec.kind {
                SegKind::Horizontal => {
                    if rec.is_padding() {
                        serif = false;
                        attach_h = true;
                    } else {
                        // Tuck the head under the crossing bar.
                        self.pre_pos.y -= hw;
                        self.disps[self.index].y += hw;
                    }
                }
                SegKind::Vertical => {
                    serif = false;
                    attach_v = true;
                }
                SegKind::Diagonal => {
                    if let Some(mark) = rec.mark {
                        if mark.dir == Dir::DownRight && mark.role == Role::Start {
                            let coll = &self.skeleton.paths[rec.path];
                            if rec.seg > 0 && coll.segments()[rec.seg - 1].end.x.abs() < 1e-4 {
                                serif = false;
                                let seg = coll.segments()[rec.seg].end;
                                let prev = coll.segments()[rec.seg - 1].end;
                                let anchor = coll.pos_at(rec.seg);
                                let s = self.synth(seg, Some(prev), None)?;
                                let mut d =
                                    RelPath::new(anchor - Vec2::new(0.0, s.corr));
                                d.push(s.ctrl);
                                attach_d = Some(d);
                                attach_v = false;

                                let grow = self.disp().normalized() * (w * 1.5);
                                self.pre_pos -= grow;
                                self.disps[self.index] += grow;
                            }
                        } else {
                            return Err(self.unsupported());
                        }
                    }
                }
            }
        }

        let s_ctrl = self.synth(self.disp(), None, None)?.ctrl;
        if serif {
            let mut comp = RelPath::new(Point::ZERO);
            comp.line(Vec2::new(w * 2.0, st.v[0] * ratio));
            comp.line(Vec2::new(0.0, path_len - st.v[0] * ratio));
            comp.line(Vec2::new(-hw, 0.0));
            comp.line(Vec2::new(w * -1.5 + st.h[0], st.length * ratio - path_len));
            comp.line(Vec2::new(-st.h[0], -st.v[1] * ratio));
            close_path(&mut comp);

            let incr = s_ctrl.tangent_at(0.0).normalized() * st.v[0];
            let spine = shift_spine(&s_ctrl, incr);
            let comp = warp_template(&spine, &comp, self.pre_pos - incr, 0.75);

            match self.nect_dir() {
                None => {
                    let mut out = comp;
                    close_path(&mut out);
                    self.outlines.push(out);
                }
                Some(Dir::Right) => {
                    let cut = self.curr_pos.y - hw;
                    self.lead = RelPath::new(comp.start_pos());
                    self.lead
                        .extend(comp.segments()[..2].iter().copied());
                    let last = self.last_of(&self.lead, "sweep body")?;
                    let t =
                        self.root_y(&last, cut, self.lead.pos_at(1), "sweep body")?;
                    self.lead.replace_last(last.split(t).0);

                    self.trail = RelPath::new(comp.start_pos());
                    let rev = comp.reverse();
                    self.trail.extend(rev.segments()[..3].iter().copied());
                    let last = self.last_of(&self.trail, "sweep body")?;
                    let t =
                        self.root_y(&last, cut, self.trail.pos_at(2), "sweep body")?;
                    self.trail.replace_last(last.split(t).0);
                    self.sweep_end_serif();
                }
                Some(Dir::DownRight) => {
                    self.lead = RelPath::new(comp.start_pos());
                    self.lead
                        .extend(comp.segments()[..2].iter().copied());
                    self.trail = RelPath::new(comp.start_pos());
                    let rev = comp.reverse();
                    self.trail.extend(rev.segments()[..3].iter().copied());
                }
                _ => return Err(self.unsupported()),
            }
            return Ok(());
        }

        // Blunt head: a plain quad warped along the sweep, then re-stitched
        // around whatever the head attaches to.
        let mut comp = RelPath::new(Point::ZERO);
        comp.line(Vec2::new(w * 1.5, 0.0));
        comp.line(Vec2::new(0.0, path_len));
        comp.line(Vec2::new(-hw, 0.0));
        comp.line(Vec2::new(-w, -path_len));
        close_path(&mut comp);

        let corr_vec = self.disp().normalized() * w;
        let s_ctrl = self.synth(self.disp() + corr_vec, None, None)?.ctrl;
        let comp = warp_template(&s_ctrl, &comp, self.pre_pos - corr_vec, 2.0 / 3.0);

        let mut temp_pos0 = comp.pos_at(1);
        let mut temp_ctrl0 = comp.segments()[1];
        let temp_pos1;
        let temp_ctrl1;
        let temp_index;
        if attach_h || attach_v {
            if attach_h {
                let seg = comp.segments()[1];
                if let Some(&t) = seg.roots_y(self.pre_pos.y, comp.pos_at(1)).first() {
                    let (a, b) = seg.split(t);
                    temp_pos0 = comp.pos_at(1) + a.end;
                    temp_ctrl0 = b;
                }
            }
            if attach_v {
                let seg = comp.segments()[1];
                let t = self.root_x(&seg, self.pre_pos.x, comp.pos_at(1), "head attach")?;
                let (a, b) = seg.split(t);
                temp_pos0 = comp.pos_at(1) + a.end;
                temp_ctrl0 = b;
            }

            if attach_h {
                let back = comp.segments()[3].reverse();
                let anchor = comp.start_pos();
                let t = self.root_y(&back, self.pre_pos.y, anchor, "head attach")?;
                let (a, b) = back.split(t);
                temp_pos1 = anchor + a.end;
                temp_ctrl1 = b.reverse();
            } else {
                temp_pos1 = comp.start_pos();
                temp_ctrl1 = comp.segments()[3];
            }
            temp_index = 2;
        } else {
            let d = attach_d.ok_or_else(|| self.geo("no attachment for blunt head"))?;
            let d_seg = d.segments()[0];
            let seg = comp.segments()[1];
            let (t, _) = self.hit(&seg, comp.pos_at(1), &d_seg, d.start_pos(), "head attach")?;
            let (a, b) = seg.split(t);
            temp_pos0 = comp.pos_at(1) + a.end;
            temp_ctrl0 = b;

            let seg = comp.segments()[3];
            let (t, _) = self.hit(&seg, comp.pos_at(3), &d_seg, d.start_pos(), "head attach")?;
            let (a, _) = seg.split(t);
            temp_pos1 = comp.pos_at(3) + a.end;
            temp_ctrl1 = a;
            temp_index = 1;
        }
        let temp_ctrl2 = comp.segments()[2];

        let mut body = RelPath::new(temp_pos1);
        if temp_index == 2 {
            body.line(self.pre_pos - temp_pos1);
            body.line(temp_pos0 - self.pre_pos);
        } else {
            body.line(temp_pos0 - temp_pos1);
        }
        body.push(temp_ctrl0);
        body.push(temp_ctrl2);
        body.push(temp_ctrl1);
        close_path(&mut body);

        match self.nect_dir() {
            None => self.outlines.push(body),
            Some(Dir::Right) => {
                let cut = self.curr_pos.y - hw;
                self.lead = RelPath::new(body.start_pos());
                self.lead
                    .extend(body.segments()[..=temp_index].iter().copied());
                let last = self.last_of(&self.lead, "sweep body")?;
                let t = self.root_y(&last, cut, self.lead.pos_at(temp_index), "sweep body")?;
                self.lead.replace_last(last.split(t).0);

                self.trail = RelPath::new(body.start_pos());
                let rev = body.reverse();
                self.trail.push(rev.segments()[0]);
                let last = self.last_of(&self.trail, "sweep body")?;
                let t = self.root_y(&last, cut, self.trail.pos_at(0), "sweep body")?;
                self.trail.replace_last(last.split(t).0);
                self.sweep_end_serif();
            }
            _ => return Err(self.unsupported()),
        }
        Ok(())
    }

    // -- down-right descents and presses -------------------------------------

    /// Body template of a free-standing descent.
    fn falling_body(&self, path_len: Scalar) -> RelPath {
        let st = &style::FALLING;
        let (w, hw) = (self.w, self.hw);
        let mut comp = RelPath::new(Point::ZERO);
        comp.line(Vec2::new(hw, 0.0));
        comp.line(Vec2::new(w, path_len - st.length * self.ratio));
        comp.line(Vec2::new(-w, st.length * self.ratio));
        comp.line(Vec2::new(-hw, -st.v[0]));
        close_path(&mut comp);
        comp
    }

    /// Tail rework where a descent takes over from a sweep: trim both
    /// flanks into the fresh body and add the small step serif. `into_seg`
    /// names the body span the sweep's leading flank crosses.
    fn falling_after_sweep(
        &mut self,
        comp: &RelPath,
        into_seg: usize,
    ) -> Result<(), ContourError> {
        let st = &style::FALLING;
        let s1 = &st.start1;

        let last = self.last_of(&self.lead, "descent joint")?;
        let flank = comp.segments()[into_seg];
        let (ts, to) = self.hit(
            &last,
            self.lead.pos_at(self.lead.len() - 1),
            &flank,
            comp.pos_at(into_seg),
            "descent joint",
        )?;
        self.lead.replace_last(last.split(ts).0);
        self.lead.push(flank.split(to).1);
        if into_seg == 1 {
            self.lead
                .extend(comp.segments()[2..comp.len() - 1].iter().copied());
        }

        let last = self.last_of(&self.trail, "descent joint")?;
        let t = self.root_y(&last, last.end.y - st.v[0], Point::ZERO, "descent joint")?;
        self.trail.replace_last(last.split(t).0);
        self.trail.line(Vec2::new(-s1.h[0], s1.v[0]));
        self.trail.line(Vec2::new(s1.h[1], s1.v[1]));
        let tc = comp.segments()[comp.len() - 1].reverse();
        let t = self.root_y(
            &tc,
            self.trail.end_pos().y + s1.v[2],
            comp.start_pos(),
            "descent joint",
        )?;
        let (a, b) = tc.split(t);
        let tp = comp.end_pos() + a.end;
        self.trail.line(tp - self.trail.end_pos());
        self.trail.push(b);
        Ok(())
    }

    #[expect(clippy::too_many_lines, reason = "one neighborhood case per arm")]
    fn handle_falling(&mut self) -> Result<(), ContourError> {
        let st = &style::FALLING;
        let (w, hw) = (self.w, self.hw);

        if self.rest_codes() == "36" {
            // Press with a horizontal run-out, shaped as one body.
            let press = &style::PRESS;
            let next = self.disps[self.index + 1];
            let mut path_len = self.disp().hypot() + next.x;

            match self.pre_dir {
                None => {
                    let mut comp = RelPath::new(Point::ZERO);
                    comp.line(Vec2::new(0.0, path_len - hw));
                    comp.line(Vec2::new(-hw, hw));
                    comp.line(Vec2::new(-w, -press.length));
                    comp.line(Vec2::new(w, press.length - path_len));
                    close_path(&mut comp);
                    let s = self.synth(self.disp(), None, Some(next))?;
                    let mut out = warp_template(&s.ctrl, &comp, self.pre_pos, 2.0 / 3.0);
                    close_path(&mut out);
                    self.outlines.push(out);
                }
                Some(Dir::Down) => {
                    let s = self.synth(self.disp(), self.pre_disp, Some(next))?;
                    path_len += s.corr;
                    let mut comp = RelPath::new(Point::ZERO);
                    comp.line(Vec2::new(0.0, path_len - hw));
                    comp.line(Vec2::new(-hw, hw));
                    comp.line(Vec2::new(-w, -press.length));
                    comp.line(Vec2::new(hw, press.length - path_len));

                    self.lead.nudge_last(Vec2::new(0.0, -s.corr));
                    self.trail.nudge_last(Vec2::new(0.0, -s.corr));
                    let comp = warp_template(
                        &s.ctrl,
                        &comp,
                        self.pre_pos - Vec2::new(0.0, s.corr),
                        2.0 / 3.0,
                    );
                    self.lead.extend(comp.segments().iter().copied());
                    self.finish();
                }
                _ => return Err(self.unsupported()),
            }
            self.index = self.disps.len();
            return Ok(());
        }

        let mut index_corr = 0;
        if self.nect_dir() == Some(Dir::DownRight) {
            let merged = self.disps[self.index] + self.disps[self.index + 1];
            self.index += 1;
            self.disps[self.index] = merged;
            self.curr_pos = self.pre_pos + merged;
            index_corr = 1;
        }
        let mut path_len = self.disp().hypot();

        match (self.pre_dir, self.nect_dir()) {
            (None, None) => {
                let probe = self.probe_at(self.pre_pos, self.disp(), self.index - index_corr);
                for rec in &probe.front {
                    if rec.kind == SegKind::Diagonal
                        && rec.mark.is_some_and(|m| {
                            m.dir == Dir::DownLeft && m.role == Role::Start
                        })
                        && rec.seg == 0
                    {
                        // Back off the head along the sweep crossing it,
                        // by a fixed arc bite.
                        let seg = self.skeleton.paths[rec.path].segments()[0].end;
                        let coll = self.synth(seg, None, None)?.ctrl;
                        let t = coll.param_at_len(12.0);
                        let bite = coll.value_at(t, Point::ZERO).to_vec2();
                        self.pre_pos += bite;
                        self.disps[self.index] -= bite;
                    }
                }
                for rec in &probe.back {
                    if rec.kind != SegKind::Diagonal || !rec.is_padding() {
                        return Err(self.unsupported());
                    }
                }

                let area_len = path_len / 3.0;
                self.ratio = (area_len / st.length).min(1.0);
                let s = self.synth(self.disp(), None, None)?;
                let comp = self.falling_body(path_len);
                let mut out = warp_template(&s.ctrl, &comp, self.pre_pos, 1.0 / 3.0);
                close_path(&mut out);
                self.outlines.push(out);
            }
            (None, Some(Dir::Down)) => {
                let next = self.disps[self.index + 1];
                let s = self.synth(self.disp(), None, Some(next))?;
                let mut comp = RelPath::new(Point::ZERO);
                comp.push(CtrlSegment::with_c2(
                    Vec2::new(hw, 300.0),
                    Vec2::new(hw, 180.0),
                ));
                comp.line(Vec2::new(-w, 0.0));
                comp.line(Vec2::new(0.0, -300.0));
                close_path(&mut comp);
                let comp = warp_template(&s.ctrl, &comp, self.pre_pos, 0.5);
                self.lead = RelPath::new(comp.start_pos());
                self.lead.push(comp.segments()[0]);
                self.trail = RelPath::new(comp.start_pos());
                self.trail.push(comp.segments()[3].reverse());
                self.trail.push(comp.segments()[2].reverse());
            }
            (None, _) => return Err(self.unsupported()),
            (Some(Dir::Down), None) => {
                let s = self.synth(self.disp(), self.pre_disp, None)?;
                self.lead.nudge_last(Vec2::new(0.0, -s.corr));
                self.trail.nudge_last(Vec2::new(0.0, -s.corr));
                self.pre_pos.y -= s.corr;
                path_len += s.corr;

                let mut comp = RelPath::new(Point::ZERO);
                comp.push(CtrlSegment::with_c2(
                    Vec2::new(hw, path_len),
                    Vec2::new(0.0, path_len / 2.0),
                ));
                comp.line(Vec2::new(hw, 0.0));
                comp.line(Vec2::new(0.0, -path_len));
                let comp = warp_template(&s.ctrl, &comp, self.pre_pos, 0.5);
                self.lead.concat(&comp.reverse());
                self.finish();
            }
            (Some(Dir::DownLeft), None) => {
                let shift = Vec2::new(-hw, hw);
                let s = self.synth(self.disp() + shift, None, None)?;
                let comp = warp_template(
                    &s.ctrl,
                    &self.falling_body(path_len),
                    self.pre_pos - shift,
                    1.0 / 3.0,
                );
                self.falling_after_sweep(&comp, 1)?;
                self.finish();
            }
            (Some(Dir::Right), None) => {
                let mut comp = RelPath::new(Point::ZERO);
                comp.line(Vec2::new(0.0, path_len));
                comp.line(Vec2::new(-hw, 0.0));
                comp.push(CtrlSegment::with_c2(
                    Vec2::new(-hw, -path_len),
                    Vec2::new(-hw, -path_len / 2.0),
                ));
                let s = self.synth(self.disp(), None, None)?;
                let comp = warp_template(&s.ctrl, &comp, self.pre_pos, 0.5);
                self.sweep_off_bar(&comp, true)?;
                self.finish();
            }
            (Some(Dir::Down), Some(Dir::UpRight)) => {
                let s = self.synth(self.disp(), self.pre_disp, None)?;
                self.lead.nudge_last(Vec2::new(0.0, -s.corr));
                self.trail.nudge_last(Vec2::new(0.0, -s.corr));
                self.pre_pos.y -= s.corr;
                path_len += s.corr;

                let mut comp = RelPath::new(Point::ZERO);
                comp.line(Vec2::new(0.0, path_len));
                comp.line(Vec2::new(-w, 0.0));
                comp.line(Vec2::new(0.0, -path_len));
                let comp = warp_template(&s.ctrl, &comp, self.pre_pos, 0.5);
                self.trail.push(comp.segments()[2].reverse());
                self.lead.push(comp.segments()[0]);
            }
            (Some(Dir::DownLeft), Some(Dir::Left)) => {
                let shift = Vec2::new(0.0, w / 4.0);
                let s = self.synth(self.disp() + shift, None, None)?;
                let mut comp = RelPath::new(Point::ZERO);
                comp.line(Vec2::new(hw, path_len));
                comp.line(Vec2::new(-w, 0.0));
                comp.line(Vec2::new(0.0, -path_len));
                let comp = warp_template(&s.ctrl, &comp, self.pre_pos - shift, 0.5);
                self.falling_after_sweep(&comp, 0)?;
            }
            _ => return Err(self.unsupported()),
        }
        Ok(())
    }

    // -- leftward runs -------------------------------------------------------

    fn handle_leftward(&mut self) -> Result<(), ContourError> {
        let st = &style::LEFTWARD;
        let (w, hw) = (self.w, self.hw);
        let mut path_len = -self.disp().x;
        let probe = self.probe_at(self.curr_pos, self.disp(), self.index);
        if path_len > st.length {
            path_len = st.length;
        } else if path_len < st.length {
            path_len += probe.extend_or_open() / 2.0;
            path_len = path_len.min(st.length);
        }

        match (self.pre_dir, self.nect_dir()) {
            (Some(Dir::Down), None) => {
                self.lead.nudge_last(Vec2::new(0.0, hw));
                self.lead.line(Vec2::new(-hw, st.v[0]));
                self.lead.line(Vec2::new(-path_len, -st.v[0] - w));
                self.lead.line(Vec2::new(st.h[0], -st.v[1]));
                self.lead.line(Vec2::new(
                    path_len - st.h[0] - hw,
                    hw + st.v[1] - st.v[2],
                ));
                self.trail.nudge_last(Vec2::new(0.0, -st.v[2]));
                self.finish();
            }
            (Some(Dir::DownRight), None) => {
                let last = self.last_of(&self.trail, "run-out")?;
                let t = self.root_y(
                    &last,
                    self.pre_pos.y - hw,
                    self.trail.pos_at(self.trail.len() - 1),
                    "run-out",
                )?;
                self.trail.replace_last(last.split(t).0);
                self.trail.line(Vec2::new(
                    self.pre_pos.x - self.trail.end_pos().x - path_len,
                    0.0,
                ));
                self.trail.line(Vec2::new(0.0, w / 4.0));
                self.trail
                    .line(self.pre_pos + Vec2::new(0.0, w) - self.trail.end_pos());
                let bridge = self.trail.end_pos() - self.lead.end_pos();
                self.lead.line(bridge);
                self.finish();
            }
            _ => return Err(self.unsupported()),
        }
        Ok(())
    }

    // -- rising strokes ------------------------------------------------------

    fn handle_rising(&mut self) -> Result<(), ContourError> {
        let st = &style::RISING;
        let (w, hw) = (self.w, self.hw);
        let expand_vec = self.disp().normalized();

        match self.pre_dir {
            None => {
                let probe = self.probe_at(self.pre_pos, -self.disp(), self.index);
                if !probe.is_lone() {
                    return Err(self.unsupported());
                }
                let s = &st.start;
                let rotate = self.disp().polar_angle();
                let head = self.pre_pos
                    + Vec2::new(-s.h[0], hw - s.v[1] - s.v[0]).rotated(rotate);
                self.lead = RelPath::new(head);
                self.lead
                    .line(Vec2::new(s.length, s.v[1] + s.v[0] - w).rotated(rotate));
                self.trail = RelPath::new(head);
                self.trail.line(Vec2::new(0.0, s.v[0]).rotated(rotate));
                self.trail
                    .line(Vec2::new(s.h[0], s.v[1]).rotated(rotate));
            }
            Some(Dir::DownRight) => {
                let flank = self.pre_pos + self.disp().normalized().perp() * (w * 1.5);
                let cut = CtrlSegment::line((flank - self.curr_pos) * 2.0);
                let last = self.last_of(&self.lead, "rise joint")?;
                let (t, _) = self.hit(
                    &last,
                    self.lead.pos_at(self.lead.len() - 1),
                    &cut,
                    self.curr_pos,
                    "rise joint",
                )?;
                self.lead.replace_last(last.split(t).0);
                self.trail.line(self.pre_pos - self.trail.end_pos());
            }
            Some(Dir::Down) => {
                let along = self.disp().normalized();
                let p1 = self.pre_pos - along * w + along.perp() * w;
                let p2 = self.curr_pos - along.perp() * (w / 4.0);
                let side = Vec2::new(hw, 0.0);
                let inter = self.cross(
                    p1,
                    p2,
                    self.pre_pos + side,
                    Point::new(self.pre_pos.x + hw, self.curr_pos.y),
                    "rise joint",
                )?;
                self.lead
                    .nudge_last(Vec2::new(0.0, -(self.pre_pos.y - inter.y)));
                let inter = self.cross(
                    p1,
                    p2,
                    self.pre_pos - side,
                    Point::new(self.pre_pos.x - hw, self.curr_pos.y),
                    "rise joint",
                )?;
                self.trail
                    .nudge_last(Vec2::new(0.0, -(self.pre_pos.y - inter.y)));
                self.trail.line(p1 - inter);
                self.trail.line(along.perp() * (w * -1.5));
            }
            _ => return Err(self.unsupported()),
        }

        match self.nect_dir() {
            None => {
                self.lead.line(self.curr_pos - self.lead.end_pos());
                self.trail
                    .line(self.curr_pos + expand_vec.perp() * -hw - self.trail.end_pos());
                let bridge = self.trail.end_pos() - self.lead.end_pos();
                self.lead.line(bridge);
                self.finish();
            }
            Some(Dir::Down) => {
                let e = &st.end;
                self.lead
                    .line(self.curr_pos + expand_vec.perp() * hw - self.lead.end_pos());
                self.trail
                    .line(self.curr_pos + expand_vec.perp() * -hw - self.trail.end_pos());

                let backup = hw / self.disp().polar_angle().cos();
                self.lead.nudge_last(-expand_vec * backup);
                self.lead.line(Vec2::new(hw, -hw));
                self.lead.line(Vec2::new(hw + e.h[0], e.v[0]));
                self.lead.line(Vec2::new(-e.h[0], e.v[1]));
                self.trail.nudge_last(-expand_vec * backup);
            }
            _ => {}
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{load_char, AxisPair, CharInfo, CharRecord, Comb, KeyPath, KeyPoint};

    fn skeleton(strokes: Vec<Vec<[Scalar; 2]>>) -> CharSkeleton {
        let rec = CharRecord {
            info: CharInfo {
                scale: AxisPair { h: 0.08, v: 0.08 },
            },
            comb: Comb {
                key_paths: strokes
                    .into_iter()
                    .map(|points| KeyPath {
                        points: points
                            .into_iter()
                            .map(|point| KeyPoint {
                                point,
                                p_type: "Line".to_owned(),
                            })
                            .collect(),
                    })
                    .collect(),
            },
        };
        load_char(&rec, 1024.0).expect("test skeleton loads")
    }

    fn bounds(path: &RelPath) -> (Point, Point) {
        let verts = path.vertices();
        let mut min = verts[0];
        let mut max = verts[0];
        for v in verts {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }
        (min, max)
    }

    #[test]
    fn lone_horizontal_bar_closes_with_serifs() {
        let sk = skeleton(vec![vec![[0.2, 0.5], [0.7, 0.5]]]);
        let outlines = outline_char(&sk, &Metrics::default()).expect("outlines");
        assert_eq!(outlines.len(), 1);
        let out = &outlines[0];
        assert!(out.is_closed());
        assert!(out.is_loop());

        let start = sk.paths[0].start_pos();
        let end = sk.paths[0].end_pos();
        let (min, max) = bounds(out);
        // Head serif reaches half a brush back, tail serif half forward.
        assert!((min.x - (start.x - 16.0)).abs() < 1e-6, "min.x = {}", min.x);
        assert!(max.x >= end.x + 16.0 - 1e-6, "max.x = {}", max.x);
        // The bar stays within one brush of its centerline vertically.
        assert!(min.y >= start.y - 40.0 && max.y <= start.y + 40.0);
    }

    #[test]
    fn lone_vertical_bar_closes_with_serifs() {
        let sk = skeleton(vec![vec![[0.5, 0.15], [0.5, 0.8]]]);
        let outlines = outline_char(&sk, &Metrics::default()).expect("outlines");
        assert_eq!(outlines.len(), 1);
        let out = &outlines[0];
        assert!(out.is_closed());
        assert!(out.is_loop());

        let start = sk.paths[0].start_pos();
        let end = sk.paths[0].end_pos();
        let (min, max) = bounds(out);
        assert!((min.y - (start.y - 16.0)).abs() < 1e-6, "min.y = {}", min.y);
        assert!(max.y >= end.y + 16.0 - 1e-6, "max.y = {}", max.y);
    }

    #[test]
    fn folded_corner_stroke_stays_connected() {
        // Down, then right: the corner fold plus a free tail.
        let sk = skeleton(vec![vec![[0.3, 0.2], [0.3, 0.7], [0.75, 0.7]]]);
        let outlines = outline_char(&sk, &Metrics::default()).expect("outlines");
        assert_eq!(outlines.len(), 1);
        assert!(outlines[0].is_loop());
    }

    #[test]
    fn vertical_hook_compound_consumes_the_whole_stroke() {
        // Down, right, up: the hook pattern.
        let sk = skeleton(vec![vec![
            [0.3, 0.2],
            [0.3, 0.7],
            [0.5, 0.7],
            [0.5, 0.6],
        ]]);
        let outlines = outline_char(&sk, &Metrics::default()).expect("outlines");
        assert_eq!(outlines.len(), 1);
        let out = &outlines[0];
        assert!(out.is_closed());
        assert!(out.is_loop());
        // The barb rises above the corner.
        let corner_y = sk.paths[0].pos_at(2).y;
        let (min, _) = bounds(out);
        assert!(min.y < corner_y - 16.0);
    }

    #[test]
    fn lone_sweep_emits_one_closed_outline() {
        let sk = skeleton(vec![vec![[0.7, 0.2], [0.45, 0.75]]]);
        let outlines = outline_char(&sk, &Metrics::default()).expect("outlines");
        assert_eq!(outlines.len(), 1);
        assert!(outlines[0].is_closed());
        assert!(outlines[0].is_loop());
    }

    #[test]
    fn lone_press_with_run_out() {
        let sk = skeleton(vec![vec![[0.3, 0.2], [0.6, 0.7], [0.72, 0.7]]]);
        let outlines = outline_char(&sk, &Metrics::default()).expect("outlines");
        assert_eq!(outlines.len(), 1);
        assert!(outlines[0].is_loop());
    }

    #[test]
    fn crossing_bars_outline_independently() {
        let sk = skeleton(vec![
            vec![[0.2, 0.5], [0.8, 0.5]],
            vec![[0.5, 0.2], [0.5, 0.8]],
        ]);
        let outlines = outline_char(&sk, &Metrics::default()).expect("outlines");
        assert_eq!(outlines.len(), 2);
        assert!(outlines.iter().all(RelPath::is_loop));
    }

    #[test]
    fn upward_stroke_reports_its_neighborhood() {
        let sk = skeleton(vec![vec![[0.5, 0.7], [0.5, 0.3]]]);
        let err = outline_char(&sk, &Metrics::default()).expect_err("no rule");
        let msg = err.to_string();
        assert!(msg.contains("*8*"), "{msg}");
    }

    #[test]
    fn rising_stroke_closes() {
        let sk = skeleton(vec![vec![[0.3, 0.7], [0.7, 0.45]]]);
        let outlines = outline_char(&sk, &Metrics::default()).expect("outlines");
        assert_eq!(outlines.len(), 1);
        assert!(outlines[0].is_loop());
    }

    #[test]
    fn vertical_into_flick_closes_and_reaches_the_tip() {
        // Down, down-right, then an upward flick off the corner.
        let sk = skeleton(vec![vec![
            [0.4, 0.2],
            [0.4, 0.6],
            [0.45, 0.75],
            [0.6, 0.68],
        ]]);
        let outlines = outline_char(&sk, &Metrics::default()).expect("outlines");
        assert_eq!(outlines.len(), 1);
        let out = &outlines[0];
        assert!(out.is_loop());
        let tip = sk.paths[0].end_pos();
        let (min, max) = bounds(out);
        assert!(max.x >= tip.x - 1e-6, "max.x = {}", max.x);
        // The serif head still tops the skeleton head.
        assert!(min.y < sk.paths[0].start_pos().y, "min.y = {}", min.y);
    }

    #[test]
    fn vertical_head_on_sweep_body_trims_to_the_crossing() {
        let sk = skeleton(vec![
            vec![[0.7, 0.2], [0.45, 0.75]],
            vec![[0.55, 0.4], [0.55, 0.9]],
        ]);
        let outlines = outline_char(&sk, &Metrics::default()).expect("outlines");
        assert_eq!(outlines.len(), 2);
        assert!(outlines.iter().all(RelPath::is_loop));

        // Where the bar's straight centerline meets the sweep's curved one.
        let sweep = &sk.paths[0];
        let ctrl = synth_ctrl(sweep.segments()[0].end, None, None, sk.unit)
            .expect("sweep curve")
            .ctrl;
        let bar = &sk.paths[1];
        let own = CtrlSegment::line(bar.segments()[0].end);
        let &(ct, t) = ctrl
            .intersections(sweep.start_pos(), &own, bar.start_pos())
            .first()
            .expect("centerlines cross");
        let on_sweep = ctrl.value_at(ct, sweep.start_pos());
        let on_bar = own.value_at(t, bar.start_pos());
        assert!(
            (on_sweep - on_bar).hypot() < 1.0,
            "{on_sweep:?} vs {on_bar:?}"
        );

        // The bar's head is cut back onto the sweep instead of growing a
        // serif above the skeleton head.
        let w = Metrics::default().stroke_width;
        let (min, _) = bounds(&outlines[1]);
        assert!(min.y > bar.start_pos().y, "min.y = {}", min.y);
        assert!(
            (min.y - on_bar.y).abs() < w * 1.5,
            "min.y = {}, crossing at y = {}",
            min.y,
            on_bar.y
        );
    }
}
