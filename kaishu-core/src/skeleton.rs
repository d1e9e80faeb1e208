//! Skeleton loading.
//!
//! A character skeleton arrives as JSON: a set of key paths, each a
//! sequence of named points in normalized em coordinates. Loading scales
//! to font units, rounds to the integer grid, collapses duplicate points,
//! drops hidden and single-point strokes, and records the lattice of
//! distinct x and y coordinates the occupancy grid is indexed by.

use std::collections::HashMap;

use serde::Deserialize;

use kaishu_graphics::{Point, RelPath, Scalar, Vec2};

use crate::error::DataError;

// ---------------------------------------------------------------------------
// Input model
// ---------------------------------------------------------------------------

/// Top-level data file: one record per character.
pub type DataFile = HashMap<String, CharRecord>;

/// One character's skeleton record.
#[derive(Debug, Clone, Deserialize)]
pub struct CharRecord {
    pub info: CharInfo,
    pub comb: Comb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharInfo {
    pub scale: AxisPair,
}

/// A per-axis pair of values.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AxisPair {
    pub h: Scalar,
    pub v: Scalar,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comb {
    pub key_paths: Vec<KeyPath>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyPath {
    pub points: Vec<KeyPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyPoint {
    pub point: [Scalar; 2],
    pub p_type: String,
}

impl KeyPoint {
    fn role(&self) -> Result<Role, DataError> {
        match self.p_type.as_str() {
            "Line" => Ok(Role::Line),
            "Curve" => Ok(Role::Curve),
            "Hide" => Ok(Role::Hide),
            other => Err(DataError::UnknownRole(other.to_owned())),
        }
    }
}

/// Known key point roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Line,
    Curve,
    Hide,
}

// ---------------------------------------------------------------------------
// Lattice
// ---------------------------------------------------------------------------

/// Sorted distinct x and y coordinates of all loaded skeleton points.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    pub xs: Vec<Scalar>,
    pub ys: Vec<Scalar>,
}

impl Lattice {
    /// Column index of an x coordinate. Coordinates come rounded from the
    /// loader, so lookups are exact.
    #[must_use]
    pub fn index_of_x(&self, v: Scalar) -> Option<usize> {
        self.xs.iter().position(|&x| x == v)
    }

    /// Row index of a y coordinate.
    #[must_use]
    pub fn index_of_y(&self, v: Scalar) -> Option<usize> {
        self.ys.iter().position(|&y| y == v)
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.xs.len()
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.ys.len()
    }
}

// ---------------------------------------------------------------------------
// Loaded skeleton
// ---------------------------------------------------------------------------

/// A character skeleton ready for outlining.
#[derive(Debug, Clone, PartialEq)]
pub struct CharSkeleton {
    /// One displacement path per surviving stroke.
    pub paths: Vec<RelPath>,
    pub lattice: Lattice,
    /// Unit cell size of this character's layout grid, in font units.
    pub unit: Vec2,
}

/// Load one character record.
///
/// Coordinates are scaled by `font_size` and rounded; consecutive
/// duplicate points collapse; strokes containing a `Hide` point and
/// strokes with fewer than two distinct points are dropped. A stroke
/// whose first and last points coincide is closed.
pub fn load_char(record: &CharRecord, font_size: Scalar) -> Result<CharSkeleton, DataError> {
    let mut xs: Vec<Scalar> = Vec::new();
    let mut ys: Vec<Scalar> = Vec::new();
    let mut paths = Vec::new();

    for key_path in &record.comb.key_paths {
        let mut hidden = false;
        for kp in &key_path.points {
            if kp.role()? == Role::Hide {
                hidden = true;
                break;
            }
        }
        if hidden {
            continue;
        }

        let mut points: Vec<Point> = Vec::with_capacity(key_path.points.len());
        for kp in &key_path.points {
            let pos = Point::new(
                (kp.point[0] * font_size).round(),
                (kp.point[1] * font_size).round(),
            );
            if points.last() != Some(&pos) {
                points.push(pos);
            }
        }

        // Only surviving strokes contribute to the lattice.
        if points.len() > 1 {
            for pos in &points {
                if !xs.contains(&pos.x) {
                    xs.push(pos.x);
                }
                if !ys.contains(&pos.y) {
                    ys.push(pos.y);
                }
            }
            let mut path = RelPath::new(points[0]);
            for pair in points.windows(2) {
                path.line(pair[1] - pair[0]);
            }
            if points[0] == points[points.len() - 1] {
                path.close();
            }
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(DataError::EmptyCharacter);
    }

    xs.sort_by(Scalar::total_cmp);
    ys.sort_by(Scalar::total_cmp);

    let scale = record.info.scale;
    Ok(CharSkeleton {
        paths,
        lattice: Lattice { xs, ys },
        unit: Vec2::new(scale.h * font_size, scale.v * font_size),
    })
}

// ---------------------------------------------------------------------------
// Endpoint merging (dormant capability)
// ---------------------------------------------------------------------------

/// Whether the loader chains strokes that share endpoints.
///
/// Kept `Disabled` in the production pipeline: the outline rules key
/// every occupancy record by a stable (stroke, segment) pair, and merging
/// would renumber both. The planner stays exercised by tests so the
/// capability does not rot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeEndpoints {
    Disabled,
    Enabled,
}

/// One planned merge: `absorbed` is appended onto `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeStep {
    pub target: usize,
    pub absorbed: usize,
    /// Shared endpoint, in font units.
    pub at: Point,
    /// The target must be reversed first so the shared point is its tail.
    pub reverse_target: bool,
    /// The absorbed stroke must be reversed so the shared point is its head.
    pub reverse_absorbed: bool,
}

/// Planned endpoint merges for a character.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergePlan {
    pub steps: Vec<MergeStep>,
}

impl MergePlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Strokes that end up absorbed into another stroke.
    #[must_use]
    pub fn absorbed(&self) -> Vec<usize> {
        self.steps.iter().map(|s| s.absorbed).collect()
    }
}

/// Segment orientation at an endpoint, used to order merge candidates.
fn end_symbol(a: Point, b: Point) -> char {
    if a.x == b.x {
        'v'
    } else if a.y == b.y {
        'h'
    } else {
        'd'
    }
}

/// Compute which open strokes share endpoints and how they would chain.
///
/// Endpoints are collected for open strokes only; at each point touched by
/// more than one stroke end, candidates are paired off (ordered by the
/// adjoining segment's orientation) and chained through earlier merges so
/// a stroke already absorbed redirects to its final target.
#[must_use]
pub fn merge_plan(paths: &[RelPath], mode: MergeEndpoints) -> MergePlan {
    let mut plan = MergePlan::default();
    if mode == MergeEndpoints::Disabled {
        return plan;
    }

    struct EndInfo {
        symbol: char,
        stroke: usize,
        is_head: bool,
    }

    // Endpoint key on the integer grid.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "loader coordinates are rounded before they get here"
    )]
    fn key(p: Point) -> (i64, i64) {
        (p.x as i64, p.y as i64)
    }

    let mut by_point: HashMap<(i64, i64), Vec<EndInfo>> = HashMap::new();
    for (i, path) in paths.iter().enumerate() {
        let start = path.start_pos();
        let end = path.end_pos();
        if path.is_closed() || path.is_empty() || key(start) == key(end) {
            continue;
        }
        let verts = path.vertices();
        by_point.entry(key(start)).or_default().push(EndInfo {
            symbol: end_symbol(verts[0], verts[1]),
            stroke: i,
            is_head: true,
        });
        by_point.entry(key(end)).or_default().push(EndInfo {
            symbol: end_symbol(verts[verts.len() - 1], verts[verts.len() - 2]),
            stroke: i,
            is_head: false,
        });
    }

    // Redirection map: absorbed stroke -> its surviving target.
    let mut map_to: HashMap<usize, usize> = HashMap::new();
    let resolve = |map: &HashMap<usize, usize>, mut i: usize| {
        while let Some(&j) = map.get(&i) {
            i = j;
        }
        i
    };

    let mut points: Vec<_> = by_point.into_iter().collect();
    points.sort_by_key(|(k, _)| *k);
    for (k, mut infos) in points {
        infos.sort_by_key(|info| info.symbol);
        while infos.len() > 1 {
            let (Some(one), Some(two)) = (infos.pop(), infos.pop()) else {
                break;
            };
            let target = resolve(&map_to, one.stroke);
            let absorbed = resolve(&map_to, two.stroke);
            if target == absorbed {
                continue;
            }
            map_to.insert(absorbed, target);
            #[expect(
                clippy::cast_precision_loss,
                reason = "keys round-trip exactly in the coordinate range"
            )]
            let at = Point::new(k.0 as Scalar, k.1 as Scalar);
            plan.steps.push(MergeStep {
                target,
                absorbed,
                at,
                // The shared point must sit at the target's tail and the
                // absorbed stroke's head.
                reverse_target: one.is_head,
                reverse_absorbed: !two.is_head,
            });
        }
    }

    plan
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(paths: Vec<Vec<([Scalar; 2], &str)>>) -> CharRecord {
        CharRecord {
            info: CharInfo {
                scale: AxisPair { h: 0.1, v: 0.1 },
            },
            comb: Comb {
                key_paths: paths
                    .into_iter()
                    .map(|points| KeyPath {
                        points: points
                            .into_iter()
                            .map(|(point, t)| KeyPoint {
                                point,
                                p_type: t.to_owned(),
                            })
                            .collect(),
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn load_scales_rounds_and_dedups() {
        let rec = record(vec![vec![
            ([0.1, 0.2], "Line"),
            ([0.1, 0.2], "Line"),
            ([0.5, 0.2], "Line"),
        ]]);
        let sk = load_char(&rec, 1000.0).expect("loads");
        assert_eq!(sk.paths.len(), 1);
        assert_eq!(sk.paths[0].len(), 1);
        assert_eq!(sk.paths[0].start_pos(), Point::new(100.0, 200.0));
        assert_eq!(sk.paths[0].end_pos(), Point::new(500.0, 200.0));
        assert_eq!(sk.lattice.xs, vec![100.0, 500.0]);
        assert_eq!(sk.lattice.ys, vec![200.0]);
        assert!((sk.unit.x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn hidden_and_single_point_strokes_are_dropped() {
        let rec = record(vec![
            vec![([0.1, 0.1], "Line"), ([0.5, 0.1], "Hide")],
            vec![([0.3, 0.3], "Line"), ([0.3, 0.3], "Line")],
            vec![([0.2, 0.2], "Line"), ([0.2, 0.8], "Line")],
        ]);
        let sk = load_char(&rec, 1000.0).expect("loads");
        assert_eq!(sk.paths.len(), 1);
        // Neither the hidden stroke's coordinates nor the collapsed
        // stroke's reach the lattice.
        assert_eq!(sk.lattice.xs, vec![200.0]);
        assert_eq!(sk.lattice.ys, vec![200.0, 800.0]);
    }

    #[test]
    fn coincident_endpoints_close_the_path() {
        let rec = record(vec![vec![
            ([0.2, 0.2], "Line"),
            ([0.6, 0.2], "Line"),
            ([0.6, 0.6], "Line"),
            ([0.2, 0.2], "Line"),
        ]]);
        let sk = load_char(&rec, 1000.0).expect("loads");
        assert!(sk.paths[0].is_closed());
    }

    #[test]
    fn unknown_role_is_an_error() {
        let rec = record(vec![vec![([0.1, 0.1], "Wobble"), ([0.5, 0.1], "Line")]]);
        assert_eq!(
            load_char(&rec, 1000.0),
            Err(DataError::UnknownRole("Wobble".to_owned()))
        );
    }

    #[test]
    fn all_strokes_filtered_is_an_error() {
        let rec = record(vec![vec![([0.1, 0.1], "Hide"), ([0.5, 0.1], "Line")]]);
        assert_eq!(load_char(&rec, 1000.0), Err(DataError::EmptyCharacter));
    }

    #[test]
    fn record_deserializes_from_json() {
        let json = r#"{
            "info": { "scale": { "h": 0.08, "v": 0.11 } },
            "comb": { "key_paths": [
                { "points": [
                    { "point": [0.2, 0.5], "p_type": "Line" },
                    { "point": [0.8, 0.5], "p_type": "Line" }
                ] }
            ] }
        }"#;
        let rec: CharRecord = serde_json::from_str(json).expect("parses");
        let sk = load_char(&rec, 1024.0).expect("loads");
        assert_eq!(sk.paths.len(), 1);
        assert!((sk.unit.y - 0.11 * 1024.0).abs() < 1e-9);
    }

    // -- merge planning --

    fn line(a: Point, b: Point) -> RelPath {
        let mut p = RelPath::new(a);
        p.line(b - a);
        p
    }

    #[test]
    fn disabled_mode_plans_nothing() {
        let paths = vec![
            line(Point::new(0.0, 0.0), Point::new(100.0, 0.0)),
            line(Point::new(100.0, 0.0), Point::new(100.0, 100.0)),
        ];
        assert!(merge_plan(&paths, MergeEndpoints::Disabled).is_empty());
    }

    #[test]
    fn shared_endpoint_chains_two_strokes() {
        let paths = vec![
            line(Point::new(0.0, 0.0), Point::new(100.0, 0.0)),
            line(Point::new(100.0, 0.0), Point::new(100.0, 100.0)),
        ];
        let plan = merge_plan(&paths, MergeEndpoints::Enabled);
        assert_eq!(plan.steps.len(), 1);
        let step = &plan.steps[0];
        assert_eq!(step.at, Point::new(100.0, 0.0));
        assert_ne!(step.target, step.absorbed);
    }

    #[test]
    fn chained_merges_redirect_to_final_target() {
        // Three strokes in a row sharing endpoints pairwise.
        let paths = vec![
            line(Point::new(0.0, 0.0), Point::new(100.0, 0.0)),
            line(Point::new(100.0, 0.0), Point::new(200.0, 0.0)),
            line(Point::new(200.0, 0.0), Point::new(300.0, 0.0)),
        ];
        let plan = merge_plan(&paths, MergeEndpoints::Enabled);
        assert_eq!(plan.steps.len(), 2);
        // Every absorbed stroke is distinct and no step merges a stroke
        // into itself.
        let absorbed = plan.absorbed();
        assert_eq!(absorbed.len(), 2);
        assert_ne!(absorbed[0], absorbed[1]);
        for step in &plan.steps {
            assert_ne!(step.target, step.absorbed);
            assert!(!absorbed.contains(&step.target) || step.target != step.absorbed);
        }
    }

    #[test]
    fn closed_strokes_do_not_participate() {
        let mut sq = RelPath::new(Point::ZERO);
        sq.line(Vec2::new(100.0, 0.0));
        sq.line(Vec2::new(0.0, 100.0));
        sq.line(Vec2::new(-100.0, -100.0));
        sq.close();
        let paths = vec![sq, line(Point::ZERO, Point::new(50.0, 50.0))];
        assert!(merge_plan(&paths, MergeEndpoints::Enabled).is_empty());
    }
}
