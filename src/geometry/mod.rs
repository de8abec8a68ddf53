//! Geometry primitives for the projector.
//!
//! Provides the composable rotation used to aim the virtual camera, point
//! helpers and the six cube face identifiers.

mod face;
mod point;
mod rotation;

pub use face::CubeFace;
pub use point::{project, Point2, Point3};
pub use rotation::Rotation;
