//! Multi-resolution tile pyramids with a poster image and descriptor.
//!
//! Each level is the previous one halved by area averaging, cut into
//! square tiles named `<column>_<row>` that share `overlap` border pixels
//! with their neighbours. Levels are generated one after another since
//! every level is derived from the one before it.

mod builder;
mod descriptor;
mod params;

pub use builder::{PyramidBuilder, PyramidLevel, PyramidSummary};
pub(crate) use builder::staging_dir;
pub use descriptor::PyramidDescriptor;
pub use params::{
    DescriptorFormat, FolderLayout, LevelNumbering, LevelPolicy, OutputFormat, PyramidParameters,
};

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::raster::CodecError;

#[derive(Error, Debug)]
pub enum PyramidError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("tile size {tile_size} must exceed overlap {overlap}")]
    InvalidTileSize { tile_size: u32, overlap: u32 },
    #[error("poster size must be positive")]
    InvalidPosterSize,
    #[error("invalid JPEG quality {0}: must be in (0, 1]")]
    InvalidQuality(f32),
    #[error("level count must be at least 1")]
    InvalidLevelCount,
    #[error("wrap-x levels need a width divisible by the tile size ({width} % {tile} != 0)")]
    WrapXNotAligned { width: u32, tile: u32 },
    #[error("cannot build a pyramid from an empty image")]
    EmptyImage,
}
