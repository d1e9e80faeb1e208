//! Geometry primitives for the kaishu stroke-outline engine.
//!
//! Everything here is expressed in *relative* terms: a control segment is a
//! displacement from its (implicit) start point plus optional control
//! offsets, and a path is a start point plus a sequence of such segments.
//! This matches how stroke skeletons and outline templates are authored:
//! shapes are small tables of displacements that get anchored at a point
//! late, when the stroke is placed on the canvas.

pub mod bezier;
pub mod ctrl;
pub mod path;
pub mod template;
pub mod types;

pub use ctrl::CtrlSegment;
pub use path::RelPath;
pub use template::warp_template;
pub use types::{line_intersection, Point, Scalar, Vec2, Vec2Ext, EPSILON};
