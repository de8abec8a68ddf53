//! Composable 3D rotation built from elementary axis rotations.

use glam::{DMat3, DVec3};

/// A 3x3 rotation accumulated by prepending elementary rotations.
///
/// Each `rotate_*` call left-multiplies the accumulated matrix, so for calls
/// A, B, C in that order the matrix is `C * B * A` and a transformed vector
/// sees A first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    matrix: DMat3,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Rotation {
    /// Creates the identity rotation.
    pub fn identity() -> Self {
        Self {
            matrix: DMat3::IDENTITY,
        }
    }

    /// Returns the accumulated matrix.
    pub fn matrix(&self) -> DMat3 {
        self.matrix
    }

    /// Prepends an arbitrary matrix: `M <- xform * M`.
    pub fn prepend(&mut self, xform: DMat3) -> &mut Self {
        self.matrix = xform * self.matrix;
        self
    }

    /// Prepends a rotation of `angle` radians about the X axis.
    pub fn rotate_x(&mut self, angle: f64) -> &mut Self {
        self.prepend(DMat3::from_rotation_x(angle))
    }

    /// Prepends a rotation of `angle` radians about the Y axis.
    pub fn rotate_y(&mut self, angle: f64) -> &mut Self {
        self.prepend(DMat3::from_rotation_y(angle))
    }

    /// Prepends a rotation of `angle` radians about the Z axis.
    pub fn rotate_z(&mut self, angle: f64) -> &mut Self {
        self.prepend(DMat3::from_rotation_z(angle))
    }

    /// Applies the rotation to `point` in place.
    #[inline]
    pub fn transform(&self, point: &mut DVec3) {
        *point = self.matrix * *point;
    }

    /// Returns the rotated copy of `point`.
    #[inline]
    pub fn apply(&self, point: DVec3) -> DVec3 {
        self.matrix * point
    }
}
