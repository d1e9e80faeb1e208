//! Error types for the stroke engine.
//!
//! The engine has a closed-world contract: skeleton configurations it has
//! no shaping rule for are reported with full context (stroke, segment,
//! surrounding directions), never silently approximated.

use std::error::Error;
use std::fmt;

use kaishu_graphics::Vec2;

use crate::dir::{Dir, code_or_star};

// ---------------------------------------------------------------------------
// Skeleton data errors
// ---------------------------------------------------------------------------

/// Malformed skeleton input.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// A key point carried a role tag the engine does not know.
    UnknownRole(String),
    /// No drawable stroke survived filtering.
    EmptyCharacter,
    /// A segment with zero displacement reached a stage that needs a
    /// direction.
    DegenerateSegment { stroke: usize, segment: usize },
    /// A segment endpoint does not lie on the coordinate lattice.
    PointOffLattice { stroke: usize, segment: usize },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRole(role) => write!(f, "unknown key point role \"{role}\""),
            Self::EmptyCharacter => write!(f, "character has no drawable strokes"),
            Self::DegenerateSegment { stroke, segment } => {
                write!(f, "zero-length segment {segment} in stroke {stroke}")
            }
            Self::PointOffLattice { stroke, segment } => {
                write!(f, "segment {segment} in stroke {stroke} is off the lattice")
            }
        }
    }
}

impl Error for DataError {}

// ---------------------------------------------------------------------------
// Control-point synthesis errors
// ---------------------------------------------------------------------------

/// No shaping rule exists for a segment with these neighbors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthError {
    pub disp: Vec2,
    pub prev: Option<Vec2>,
    pub next: Option<Vec2>,
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no curvature rule for displacement ({}, {})",
            self.disp.x, self.disp.y
        )?;
        if let Some(p) = self.prev {
            write!(f, " after ({}, {})", p.x, p.y)?;
        }
        if let Some(n) = self.next {
            write!(f, " before ({}, {})", n.x, n.y)?;
        }
        Ok(())
    }
}

impl Error for SynthError {}

// ---------------------------------------------------------------------------
// Contour generation errors
// ---------------------------------------------------------------------------

/// Failure while outlining one stroke.
#[derive(Debug, Clone, PartialEq)]
pub enum ContourError {
    /// The (prev, curr, next) direction triple has no outline rule, or the
    /// surrounding occupancy does not match any handled case.
    Unsupported {
        stroke: usize,
        segment: usize,
        prev: Option<Dir>,
        curr: Dir,
        next: Option<Dir>,
    },
    /// Control-point synthesis failed inside an outline rule.
    Synth {
        stroke: usize,
        segment: usize,
        source: SynthError,
    },
    /// A geometric query an outline rule depends on came up empty.
    Geometry {
        stroke: usize,
        segment: usize,
        what: &'static str,
    },
    /// The skeleton itself was malformed.
    Data(DataError),
}

impl fmt::Display for ContourError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported {
                stroke,
                segment,
                prev,
                curr,
                next,
            } => write!(
                f,
                "unsupported configuration {}{}{} at stroke {stroke}, segment {segment}",
                code_or_star(*prev),
                curr.code(),
                code_or_star(*next),
            ),
            Self::Synth {
                stroke,
                segment,
                source,
            } => write!(f, "stroke {stroke}, segment {segment}: {source}"),
            Self::Geometry {
                stroke,
                segment,
                what,
            } => write!(f, "stroke {stroke}, segment {segment}: {what}"),
            Self::Data(e) => e.fmt(f),
        }
    }
}

impl Error for ContourError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Synth { source, .. } => Some(source),
            Self::Data(source) => Some(source),
            _ => None,
        }
    }
}

impl From<DataError> for ContourError {
    fn from(e: DataError) -> Self {
        Self::Data(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_display_shows_direction_triple() {
        let e = ContourError::Unsupported {
            stroke: 2,
            segment: 1,
            prev: Some(Dir::Down),
            curr: Dir::UpLeft,
            next: None,
        };
        let msg = e.to_string();
        assert!(msg.contains("27*"), "{msg}");
        assert!(msg.contains("stroke 2"), "{msg}");
        assert!(msg.contains("segment 1"), "{msg}");
    }

    #[test]
    fn synth_display_shows_neighbors() {
        let e = SynthError {
            disp: Vec2::new(-40.0, 60.0),
            prev: Some(Vec2::new(0.0, 100.0)),
            next: None,
        };
        let msg = e.to_string();
        assert!(msg.contains("(-40, 60)"), "{msg}");
        assert!(msg.contains("after (0, 100)"), "{msg}");
    }

    #[test]
    fn data_error_wraps_into_contour_error() {
        let e: ContourError = DataError::EmptyCharacter.into();
        assert!(e.to_string().contains("no drawable strokes"));
    }
}
