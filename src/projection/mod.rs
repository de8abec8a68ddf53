//! Cube-face projection of equirectangular and cylindrical maps.

mod config;
mod mapping;
mod projector;
mod stitcher;

pub use config::{Orientation, ProjectionConfig};
pub use mapping::{Cylindrical, Equirectangular, MapGeometry, MapProjection};
pub use projector::{
    write_faces, CubicProjector, CylindricalToCubic, EquirectangularToCubic, FaceJob,
};
pub use stitcher::{CropRect, StitcherMetadata};

use thiserror::Error;

use crate::raster::CodecError;

/// Errors from configuring or running a projection.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("oversampling must be at least 1, got {0}")]
    InvalidOversampling(u32),

    #[error("output size must be non-zero, got {0}x{1}")]
    InvalidOutputSize(u32, u32),

    #[error("invalid field of view for {0}: {1}")]
    InvalidFov(&'static str, f64),

    #[error("input hfov {0} covers the full circle but horizontal wrap is off")]
    WrapRequired(f64),

    #[error("thread count must be at least 1")]
    InvalidThreadCount,

    #[error("input map has no pixels")]
    EmptyInput,

    #[error("no panorama line in stitcher project")]
    NoProjectionLine,

    #[error("stitcher project is missing field '{0}'")]
    MissingPtoField(&'static str),

    #[error("invalid value for stitcher field '{field}': {value}")]
    InvalidPtoField { field: &'static str, value: String },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
