//! Cube face identification and enumeration.

use serde::{Deserialize, Serialize};

/// One of the six rectilinear views that cover a full sphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CubeFace {
    /// Looking along yaw 0.
    Front = 0,
    /// Yaw 90.
    Right = 1,
    /// Yaw 180.
    Back = 2,
    /// Yaw -90.
    Left = 3,
    /// Pitch 90 (zenith).
    Up = 4,
    /// Pitch -90 (nadir).
    Down = 5,
}

impl CubeFace {
    /// Returns all six faces in output order.
    pub const fn all() -> [CubeFace; 6] {
        [
            CubeFace::Front,
            CubeFace::Right,
            CubeFace::Back,
            CubeFace::Left,
            CubeFace::Up,
            CubeFace::Down,
        ]
    }

    /// Returns the face index (0-5).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Creates a face from an index (0-5).
    pub const fn from_index(index: usize) -> Option<CubeFace> {
        match index {
            0 => Some(CubeFace::Front),
            1 => Some(CubeFace::Right),
            2 => Some(CubeFace::Back),
            3 => Some(CubeFace::Left),
            4 => Some(CubeFace::Up),
            5 => Some(CubeFace::Down),
            _ => None,
        }
    }

    /// Returns the file/directory name for the face (e.g. "face_f", "face_d").
    pub const fn short_name(self) -> &'static str {
        match self {
            CubeFace::Front => "face_f",
            CubeFace::Right => "face_r",
            CubeFace::Back => "face_b",
            CubeFace::Left => "face_l",
            CubeFace::Up => "face_u",
            CubeFace::Down => "face_d",
        }
    }

    /// Returns the `(yaw, pitch)` view direction in degrees.
    pub const fn view_angles(self) -> (f64, f64) {
        match self {
            CubeFace::Front => (0.0, 0.0),
            CubeFace::Right => (90.0, 0.0),
            CubeFace::Back => (180.0, 0.0),
            CubeFace::Left => (-90.0, 0.0),
            CubeFace::Up => (0.0, 90.0),
            CubeFace::Down => (0.0, -90.0),
        }
    }
}
