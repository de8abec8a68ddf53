//! Options for the end-to-end `process` flow.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::projection::Orientation;
use crate::pyramid::{
    DescriptorFormat, FolderLayout, LevelNumbering, LevelPolicy, OutputFormat, PyramidParameters,
};
use crate::raster::ImageFormat;

/// What to do with the input image before tiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Transform {
    /// Tile the input as-is.
    #[default]
    None,
    /// Project an equirectangular map to six cube faces and tile each.
    Facemap,
    /// Project a cylindrical map to six cube faces and tile each.
    CylinderFacemap,
    /// Render one rectilinear view and write it as a single image.
    Face,
}

/// Named bundles of defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
    /// Six Deep Zoom pyramids sized for the input map.
    DziCubemap,
}

/// Options for [`process`](super::process).
///
/// Fields a preset may fill are optional; explicit values always win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOptions {
    pub transform: Option<Transform>,
    pub preset: Option<Preset>,

    // Pyramid
    /// Tile step, default 256.
    pub tile_size: Option<u32>,
    /// Tile overlap, default 0.
    pub overlap: Option<u32>,
    pub levels: Option<LevelPolicy>,
    pub level_numbering: Option<LevelNumbering>,
    pub descriptor_format: Option<DescriptorFormat>,
    pub folder_layout: Option<FolderLayout>,
    pub output_format: OutputFormat,
    pub poster_size: u32,
    pub image_format: ImageFormat,
    pub jpeg_quality: f32,

    // Cube faces
    /// Face side before overlap, default 2048.
    pub face_size: Option<u32>,
    pub oversampling: u32,
    pub jitter: f64,
    pub jitter_seed: u64,
    pub top_cap: bool,
    pub bottom_cap: bool,
    pub offset: Orientation,
    /// Hugin project describing how the input map was cropped.
    pub pto: Option<PathBuf>,
    pub input_vfov: Option<f64>,
    pub input_hfov: Option<f64>,
    pub input_horizon: Option<i64>,
    pub threads: Option<usize>,
    /// Where archive output is staged; the system temp directory if unset.
    pub staging_root: Option<PathBuf>,

    // Single view
    /// Vertical field of view in degrees.
    pub fov: f64,
    pub view: Orientation,
    pub output_width: u32,
    pub output_height: u32,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            transform: None,
            preset: None,
            tile_size: None,
            overlap: None,
            levels: None,
            level_numbering: None,
            descriptor_format: None,
            folder_layout: None,
            output_format: OutputFormat::Folders,
            poster_size: 512,
            image_format: ImageFormat::Jpeg,
            jpeg_quality: 0.7,
            face_size: None,
            oversampling: 1,
            jitter: 0.0,
            jitter_seed: 0x5eed,
            top_cap: false,
            bottom_cap: false,
            offset: Orientation::default(),
            pto: None,
            input_vfov: None,
            input_hfov: None,
            input_horizon: None,
            threads: None,
            staging_root: None,
            fov: 60.0,
            view: Orientation::default(),
            output_width: 640,
            output_height: 480,
        }
    }
}

fn is_power_of_two(n: u32) -> bool {
    n & n.wrapping_sub(1) == 0
}

impl ProcessOptions {
    pub fn transform(&self) -> Transform {
        self.transform.unwrap_or_default()
    }

    pub fn overlap(&self) -> u32 {
        self.overlap.unwrap_or(0)
    }

    pub fn face_size(&self) -> u32 {
        self.face_size.unwrap_or(2048)
    }

    /// Fills unset options from the configured preset for an input map
    /// `input_width` pixels wide. Does nothing without a preset.
    pub fn apply_preset(&mut self, input_width: u32) {
        match self.preset {
            Some(Preset::DziCubemap) => self.apply_dzi_cubemap(input_width),
            None => {}
        }
    }

    fn apply_dzi_cubemap(&mut self, input_width: u32) {
        let overlap = *self.overlap.get_or_insert(2);
        let tile_size = *self.tile_size.get_or_insert(256u32.saturating_sub(overlap));

        // A face covers a quarter of the map's width; aim for 60% of that.
        let optimal = input_width / 4;
        let mut face = tile_size;
        while face > 0 && (face as f64) < optimal as f64 * 1.2 / 2.0 {
            face <<= 1;
        }
        let face_size = *self.face_size.get_or_insert(face);
        info!(face_size, optimal, "dzi cubemap face size");

        if !is_power_of_two(tile_size + overlap) {
            warn!(
                tile = tile_size + overlap,
                "tile size plus overlap is not a power of two"
            );
        }
        if tile_size == 0 || face_size % tile_size != 0 {
            warn!(face_size, tile_size, "face size is not a multiple of the tile size");
        }

        self.transform.get_or_insert(Transform::Facemap);
        let levels = ((face_size + overlap) as f64).log2().ceil() as u32 + 1;
        self.levels.get_or_insert(LevelPolicy::Count(levels));
        self.descriptor_format.get_or_insert(DescriptorFormat::Dzi);
        self.folder_layout.get_or_insert(FolderLayout::Dzi);
        self.level_numbering.get_or_insert(LevelNumbering::Inverted);
    }

    /// Pyramid parameters with defaults for anything unset.
    pub fn pyramid_parameters(&self) -> PyramidParameters {
        let defaults = PyramidParameters::default();
        PyramidParameters {
            tile_size: self.tile_size.unwrap_or(defaults.tile_size),
            overlap: self.overlap(),
            poster_size: self.poster_size,
            levels: self.levels.unwrap_or(defaults.levels),
            level_numbering: self.level_numbering.unwrap_or_default(),
            image_format: self.image_format,
            jpeg_quality: self.jpeg_quality,
            descriptor_format: self.descriptor_format.unwrap_or_default(),
            folder_layout: self.folder_layout.unwrap_or_default(),
            output_format: self.output_format,
        }
    }
}
