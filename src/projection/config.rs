//! Projection configuration.

use serde::{Deserialize, Serialize};

use super::ProjectionError;

/// Yaw, pitch and roll in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Orientation {
    pub fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self { yaw, pitch, roll }
    }
}

/// Parameters of a map-to-rectilinear projection.
///
/// Input map parameters left as `None` are resolved against the input
/// image when a transform runs: horizon at half the map height, the
/// projection's default vertical FOV, and a full 360 degree horizontal FOV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Vertical field of view of the output image, in degrees.
    pub vfov: f64,
    /// Vertical field of view of the input map, in degrees.
    pub input_vfov: Option<f64>,
    /// Horizontal field of view of the input map, in degrees.
    pub input_hfov: Option<f64>,
    /// True iff the input map wraps horizontally.
    pub horizontal_wrap: bool,
    /// Pixel row of the horizon in the input map.
    pub input_horizon: Option<i64>,
    /// Leveling rotation applied to the map before viewing.
    pub offset: Orientation,
    /// View direction of the output image centre.
    pub view: Orientation,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Samples per output pixel along each axis (1 = none).
    pub oversampling: u32,
    /// Random sample displacement in units of one sub-sample; `<= 0` disables.
    pub jitter: f64,
    /// Seed for the jitter generator.
    pub jitter_seed: u64,
    /// Extrapolate the region above the map's top row.
    pub top_cap: bool,
    /// Extrapolate the region below the map's bottom row.
    pub bottom_cap: bool,
    /// Worker threads for one transform; `None` uses available parallelism.
    pub threads: Option<usize>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            vfov: 90.0,
            input_vfov: None,
            input_hfov: None,
            horizontal_wrap: true,
            input_horizon: None,
            offset: Orientation::default(),
            view: Orientation::default(),
            width: 512,
            height: 512,
            oversampling: 1,
            jitter: 0.0,
            jitter_seed: 0x5eed,
            top_cap: false,
            bottom_cap: false,
            threads: None,
        }
    }
}

impl ProjectionConfig {
    /// Checks the configuration before any work starts.
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.oversampling < 1 {
            return Err(ProjectionError::InvalidOversampling(self.oversampling));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ProjectionError::InvalidOutputSize(self.width, self.height));
        }
        if !(self.vfov > 0.0 && self.vfov < 180.0) {
            return Err(ProjectionError::InvalidFov("vfov", self.vfov));
        }
        if let Some(v) = self.input_vfov {
            if !(v > 0.0 && v.is_finite()) {
                return Err(ProjectionError::InvalidFov("input_vfov", v));
            }
        }
        if let Some(h) = self.input_hfov {
            if !(h > 0.0 && h.is_finite()) {
                return Err(ProjectionError::InvalidFov("input_hfov", h));
            }
            if h >= 360.0 && !self.horizontal_wrap {
                return Err(ProjectionError::WrapRequired(h));
            }
        }
        if self.threads == Some(0) {
            return Err(ProjectionError::InvalidThreadCount);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ProjectionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_oversampling() {
        let config = ProjectionConfig {
            oversampling: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ProjectionError::InvalidOversampling(0))));
    }

    #[test]
    fn test_rejects_empty_output() {
        let config = ProjectionConfig {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ProjectionError::InvalidOutputSize(0, 512))));
    }

    #[test]
    fn test_full_circle_requires_wrap() {
        let config = ProjectionConfig {
            input_hfov: Some(360.0),
            horizontal_wrap: false,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ProjectionError::WrapRequired(_))));
    }

    #[test]
    fn test_rejects_degenerate_fov() {
        for vfov in [0.0, 180.0, -5.0, f64::NAN] {
            let config = ProjectionConfig {
                vfov,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "vfov {}", vfov);
        }
    }
}
