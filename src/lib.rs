//! Panorama projection and tiled image pyramids.
//!
//! This crate converts equirectangular or cylindrical panorama maps into
//! rectilinear cube-face views and cuts images into multi-resolution tile
//! pyramids, optionally packed into a single archive file, for progressive
//! zoomable display.

pub mod archive;
pub mod geometry;
pub mod math;
pub mod pipeline;
pub mod projection;
pub mod pyramid;
pub mod raster;

pub use archive::{pack, scan, ArchiveEntry, ArchiveError, ArchiveReader};
pub use geometry::{CubeFace, Rotation};
pub use math::{FastAcos, FastAtan};
pub use pipeline::{process, Preset, ProcessError, ProcessOptions, ProcessOutcome, Transform};
pub use projection::{
    CubicProjector, CylindricalToCubic, EquirectangularToCubic, FaceJob, Orientation,
    ProjectionConfig, ProjectionError, StitcherMetadata,
};
pub use pyramid::{PyramidBuilder, PyramidError, PyramidParameters, PyramidSummary};
pub use raster::{CodecError, ImageCodec, ImageFormat, RasterImage};
