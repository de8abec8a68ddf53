//! Point helpers on top of glam's double-precision vectors.
//!
//! Translation, scaling and norms come straight from `DVec2`/`DVec3`
//! operators; this module adds the pinhole projection.

use glam::{DVec2, DVec3};

/// A point on the image plane or in map space.
pub type Point2 = DVec2;

/// A point or ray in camera space.
pub type Point3 = DVec3;

/// Perspective-divides `point` onto the plane at distance `focal`.
///
/// Returns `(x / (z / f), y / (z / f))`. A point with `z == 0` yields
/// non-finite coordinates.
#[inline]
pub fn project(point: Point3, focal: f64) -> Point2 {
    let d = point.z / focal;
    DVec2::new(point.x / d, point.y / d)
}
