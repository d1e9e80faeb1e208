//! Stroke occupancy grid.
//!
//! Outline rules need to know what other strokes touch a skeleton point
//! and how far a stroke end can extend before it would hit a neighbor.
//! Both questions are answered against a sparse grid indexed by the
//! lattice of distinct skeleton coordinates: every segment registers a
//! start and an end record at its endpoint cells plus padding records on
//! the cells it passes over.

use kaishu_graphics::{Point, RelPath, Scalar, Vec2};

use crate::dir::Dir;
use crate::error::DataError;
use crate::skeleton::Lattice;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Orientation class of a skeleton segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegKind {
    Horizontal,
    Vertical,
    Diagonal,
}

impl SegKind {
    /// Kind of a nonzero displacement.
    #[must_use]
    pub fn of(v: Vec2) -> Self {
        if v.y == 0.0 {
            Self::Horizontal
        } else if v.x == 0.0 {
            Self::Vertical
        } else {
            Self::Diagonal
        }
    }
}

/// Which end of its segment an endpoint record marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Start,
    End,
}

/// Endpoint annotation; padding records carry none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndMark {
    pub role: Role,
    pub dir: Dir,
}

/// One segment's registration on one grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchRecord {
    pub kind: SegKind,
    pub path: usize,
    pub seg: usize,
    /// `None` marks a pass-over (padding) record.
    pub mark: Option<EndMark>,
}

impl TouchRecord {
    #[must_use]
    pub fn is_padding(&self) -> bool {
        self.mark.is_none()
    }

    /// True for the endpoint record of the given role and direction.
    #[must_use]
    pub fn is_end(&self, role: Role, dir: Dir) -> bool {
        self.mark == Some(EndMark { role, dir })
    }

    fn is_seg(&self, path: usize, seg: usize) -> bool {
        self.path == path && self.seg == seg
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Per-cell occupancy records for one character, in insertion order.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    lattice: Lattice,
    /// `cells[row][col]`, row indexing the y lattice.
    cells: Vec<Vec<Vec<TouchRecord>>>,
}

impl OccupancyGrid {
    /// Register every stroke segment on the grid.
    pub fn build(paths: &[RelPath], lattice: &Lattice) -> Result<Self, DataError> {
        let mut cells = vec![vec![Vec::new(); lattice.cols()]; lattice.rows()];

        for (i, path) in paths.iter().enumerate() {
            let mut start = path.start_pos();
            for (j, ctrl) in path.segments().iter().enumerate() {
                let kind = SegKind::of(ctrl.end);
                let dir = Dir::classify(ctrl.end)
                    .ok_or(DataError::DegenerateSegment { stroke: i, segment: j })?;
                let off = || DataError::PointOffLattice { stroke: i, segment: j };

                let pre = (
                    lattice.index_of_x(start.x).ok_or_else(off)?,
                    lattice.index_of_y(start.y).ok_or_else(off)?,
                );
                start += ctrl.end;
                let curr = (
                    lattice.index_of_x(start.x).ok_or_else(off)?,
                    lattice.index_of_y(start.y).ok_or_else(off)?,
                );

                let rec = |mark| TouchRecord {
                    kind,
                    path: i,
                    seg: j,
                    mark,
                };
                cells[pre.1][pre.0].push(rec(Some(EndMark {
                    role: Role::Start,
                    dir,
                })));
                cells[curr.1][curr.0].push(rec(Some(EndMark {
                    role: Role::End,
                    dir,
                })));

                let padding = rec(None);
                match kind {
                    SegKind::Diagonal => {
                        for y in pre.1.min(curr.1) + 1..pre.1.max(curr.1) {
                            for x in pre.0.min(curr.0) + 1..pre.0.max(curr.0) {
                                cells[y][x].push(padding);
                            }
                        }
                    }
                    SegKind::Horizontal => {
                        for x in pre.0.min(curr.0) + 1..pre.0.max(curr.0) {
                            cells[curr.1][x].push(padding);
                        }
                    }
                    SegKind::Vertical => {
                        for y in pre.1.min(curr.1) + 1..pre.1.max(curr.1) {
                            cells[y][curr.0].push(padding);
                        }
                    }
                }
            }
        }

        Ok(Self {
            lattice: lattice.clone(),
            cells,
        })
    }

    fn cell_index(&self, pos: Point) -> Option<(usize, usize)> {
        Some((
            self.lattice.index_of_x(pos.x)?,
            self.lattice.index_of_y(pos.y)?,
        ))
    }

    /// All records on the cell at a skeleton point, in insertion order.
    #[must_use]
    pub fn records_at(&self, pos: Point) -> &[TouchRecord] {
        match self.cell_index(pos) {
            Some((x, y)) => &self.cells[y][x],
            None => &[],
        }
    }

    /// Records on the cell at `pos`, split into those registered before
    /// and after segment (`path`, `seg`). The segment's own records are
    /// excluded from both halves.
    #[must_use]
    pub fn split_at(&self, pos: Point, path: usize, seg: usize) -> (Vec<TouchRecord>, Vec<TouchRecord>) {
        let mut front = Vec::new();
        let mut back = Vec::new();
        let mut found_self = false;
        for rec in self.records_at(pos) {
            if rec.is_seg(path, seg) {
                found_self = true;
            } else if found_self {
                back.push(*rec);
            } else {
                front.push(*rec);
            }
        }
        (front, back)
    }

    /// Surroundings of segment (`path`, `seg`) at endpoint `pos`, looking
    /// along `tangent`. See [`Probe`].
    #[must_use]
    pub fn probe(
        &self,
        pos: Point,
        tangent: Vec2,
        path: usize,
        seg: usize,
        half_width: Scalar,
    ) -> Probe {
        let (front, back) = self.split_at(pos, path, seg);
        let mut probe = Probe {
            front,
            back,
            extend: None,
            diag_extend: [None, None],
        };
        let Some((view_x, view_y)) = self.cell_index(pos) else {
            return probe;
        };

        if tangent.x * tangent.y == 0.0 {
            self.probe_axis(&mut probe, (view_x, view_y), tangent, half_width);
        } else {
            self.probe_diagonal(&mut probe, (view_x, view_y), tangent);
        }
        probe
    }

    /// Axis-aligned scan. Walks cells ahead of the endpoint along the
    /// tangent, over every lattice line within `half_width` of the
    /// endpoint's own, until a non-diagonal record stops it; the stopped
    /// distance becomes `extend`.
    fn probe_axis(
        &self,
        probe: &mut Probe,
        cell: (usize, usize),
        tangent: Vec2,
        half_width: Scalar,
    ) {
        let vertical = tangent.x == 0.0;
        let forward = if vertical { tangent.y > 0.0 } else { tangent.x > 0.0 };
        // Along-tangent lattice values and the perpendicular ones.
        let (axis_vals, cross_vals): (&[Scalar], &[Scalar]) = if vertical {
            (&self.lattice.ys, &self.lattice.xs)
        } else {
            (&self.lattice.xs, &self.lattice.ys)
        };
        let (start_cross, start_along) = if vertical {
            (cell.0, cell.1)
        } else {
            (cell.1, cell.0)
        };
        let at = |cross: usize, along: usize| -> &[TouchRecord] {
            if vertical {
                &self.cells[along][cross]
            } else {
                &self.cells[cross][along]
            }
        };

        let mut parallel: Vec<usize> = Vec::new();
        for (i, &v) in cross_vals.iter().enumerate() {
            if (cross_vals[start_cross] - v).abs() <= half_width {
                parallel.push(i);
            } else if v > cross_vals[start_cross] {
                break;
            }
        }

        let mut j = start_along as isize;
        'extend: loop {
            for &par in &parallel {
                if par == start_cross && j as usize == start_along {
                    continue;
                }
                for rec in at(par, j as usize) {
                    if rec.kind == SegKind::Diagonal {
                        continue;
                    }
                    if j as usize == start_along && rec.is_padding() {
                        continue;
                    }
                    // A downward probe never stops on its own starting
                    // line; crossings there belong to the stroke head.
                    if j as usize == start_along && vertical && tangent.y > 0.0 {
                        continue;
                    }
                    probe.extend =
                        Some((axis_vals[start_along] - axis_vals[j as usize]).abs());
                    break 'extend;
                }
            }
            j += if forward { 1 } else { -1 };
            if j < 0 || j as usize == axis_vals.len() {
                break;
            }
        }
    }

    /// Diagonal scan. Grows a square away from the endpoint, one row and
    /// one column per step, until either the new column or the new row
    /// holds a record; only the first hit is recorded and the scan stops.
    fn probe_diagonal(&self, probe: &mut Probe, cell: (usize, usize), tangent: Vec2) {
        let dy: isize = if tangent.y > 0.0 { 1 } else { -1 };
        let dx: isize = if tangent.x > 0.0 { 1 } else { -1 };
        let (rows, cols) = (self.lattice.rows() as isize, self.lattice.cols() as isize);
        let (view_x, view_y) = (cell.0 as isize, cell.1 as isize);

        let blocks = |rec: &TouchRecord| rec.kind != SegKind::Diagonal || !rec.is_padding();

        let mut find = [true, true];
        let mut y = view_y;
        let mut x = view_x;
        while find[0] && find[1] {
            y += dy;
            x += dx;
            if y < 0 || y == rows {
                find[0] = false;
                y -= dy;
            }
            if x < 0 || x == cols {
                find[1] = false;
                x -= dx;
            }

            if find[0] {
                let mut i = view_y;
                'col: while i != y + dy {
                    for rec in &self.cells[i as usize][x as usize] {
                        if blocks(rec) {
                            probe.diag_extend[0] = Some(
                                (self.lattice.ys[view_y as usize]
                                    - self.lattice.ys[i as usize])
                                    .abs(),
                            );
                            find[0] = false;
                            break 'col;
                        }
                    }
                    i += dy;
                }
            }
            if find[1] {
                let mut i = view_x;
                'row: while i != x + dx {
                    for rec in &self.cells[y as usize][i as usize] {
                        if blocks(rec) {
                            probe.diag_extend[1] = Some(
                                (self.lattice.xs[view_x as usize]
                                    - self.lattice.xs[i as usize])
                                    .abs(),
                            );
                            find[1] = false;
                            break 'row;
                        }
                    }
                    i += dx;
                }
            }
        }
    }
}

/// What surrounds one segment endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    /// Records on the endpoint's cell registered before the probed
    /// segment's own.
    pub front: Vec<TouchRecord>,
    /// Records registered after it.
    pub back: Vec<TouchRecord>,
    /// Distance to the nearest blocking stroke along an axis-aligned
    /// tangent; `None` when the scan ran off the lattice.
    pub extend: Option<Scalar>,
    /// Diagonal tangent: vertical and horizontal distance to the first
    /// blocking record found by the growing-square scan.
    pub diag_extend: [Option<Scalar>; 2],
}

impl Probe {
    /// True when nothing but the probed segment touches the endpoint.
    #[must_use]
    pub fn is_lone(&self) -> bool {
        self.front.is_empty() && self.back.is_empty()
    }

    /// `extend` with open space treated as practically infinite.
    #[must_use]
    pub fn extend_or_open(&self) -> Scalar {
        self.extend.unwrap_or(9999.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
