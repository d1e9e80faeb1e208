//! Skeleton-to-outline stroke engine.
//!
//! The pipeline turns a character's stroke skeleton (straight polyline
//! segments on an integer grid) into closed brush outlines:
//!
//! 1. [`skeleton`] loads and filters the JSON skeleton data,
//! 2. [`grid`] registers every segment on an occupancy grid so outline
//!    rules can see their neighborhood,
//! 3. [`synth`] bends straight segments into centerline curves,
//! 4. [`contour`] walks each stroke and emits closed outlines, applying
//!    the serif and joint shapes from [`contour::style`].
//!
//! The engine is deliberately closed-world: stroke configurations without
//! a shaping rule are reported as errors instead of being approximated.

pub mod config;
pub mod contour;
pub mod dir;
pub mod error;
pub mod grid;
pub mod skeleton;
pub mod synth;

pub use config::Metrics;
pub use contour::{outline_char, outline_stroke};
pub use error::{ContourError, DataError, SynthError};
pub use skeleton::{load_char, CharRecord, CharSkeleton, DataFile};
