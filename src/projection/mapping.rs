//! Map projections: how sight-ray angles land on the input map.

use std::fmt::Debug;

use glam::DVec2;

/// Resolved geometry of the input map, angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapGeometry {
    pub width: f64,
    pub height: f64,
    pub hfov: f64,
    pub vfov: f64,
    /// Pixel row of the horizon.
    pub horizon: f64,
}

/// The two functions a map projection supplies to the projector.
///
/// `theta` is the ray's yaw (increasing clockwise, 0 at the map centre) and
/// `phi` its pitch (increasing downwards, 0 at the horizon).
pub trait MapProjection: Debug + Clone + Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Input vertical field of view assumed when none is configured, in degrees.
    fn default_input_vfov(&self) -> f64;

    /// Maps ray angles to map pixel coordinates.
    fn forward(&self, map: &MapGeometry, theta: f64, phi: f64) -> DVec2;

    /// Returns the pitch of the ray that lands on map pixel `(x, y)`.
    fn inverse_phi(&self, map: &MapGeometry, x: f64, y: f64) -> f64;

    /// Vertical field of view, in radians, of an `input_height` pixel tall
    /// map cut from a stitched panorama `stitched_width` pixels wide spanning
    /// `hfov` radians.
    fn vfov_from_stitcher(&self, hfov: f64, stitched_width: f64, input_height: f64) -> f64;
}

#[inline]
fn forward_x(map: &MapGeometry, theta: f64) -> f64 {
    (theta / (map.hfov / 2.0)) * (map.width / 2.0) + map.width / 2.0
}

/// Equirectangular maps: both axes linear in angle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Equirectangular;

impl MapProjection for Equirectangular {
    fn name(&self) -> &'static str {
        "equirectangular"
    }

    fn default_input_vfov(&self) -> f64 {
        180.0
    }

    #[inline]
    fn forward(&self, map: &MapGeometry, theta: f64, phi: f64) -> DVec2 {
        DVec2::new(
            forward_x(map, theta),
            (phi / (map.vfov / 2.0)) * (map.height / 2.0) + map.horizon,
        )
    }

    fn inverse_phi(&self, map: &MapGeometry, _x: f64, y: f64) -> f64 {
        (map.vfov / 2.0) * (y - map.horizon) / (map.height / 2.0)
    }

    fn vfov_from_stitcher(&self, hfov: f64, stitched_width: f64, input_height: f64) -> f64 {
        input_height * (hfov / stitched_width)
    }
}

/// Cylindrical maps: linear in yaw, tangent-spaced rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cylindrical;

impl MapProjection for Cylindrical {
    fn name(&self) -> &'static str {
        "cylindrical"
    }

    fn default_input_vfov(&self) -> f64 {
        90.0
    }

    #[inline]
    fn forward(&self, map: &MapGeometry, theta: f64, phi: f64) -> DVec2 {
        DVec2::new(
            forward_x(map, theta),
            phi.tan() / (map.vfov / 2.0).tan() * (map.height / 2.0) + map.horizon,
        )
    }

    fn inverse_phi(&self, map: &MapGeometry, _x: f64, y: f64) -> f64 {
        ((map.vfov / 2.0).tan() * (y - map.horizon) / (map.height / 2.0)).atan()
    }

    fn vfov_from_stitcher(&self, hfov: f64, stitched_width: f64, input_height: f64) -> f64 {
        let per_pixel = (hfov / stitched_width).tan();
        (per_pixel * input_height / 2.0).atan() * 2.0
    }
}
