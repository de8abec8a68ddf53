//! Pyramid parameters.

use serde::{Deserialize, Serialize};

use super::PyramidError;
use crate::raster::ImageFormat;

/// How many levels to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPolicy {
    /// Enough levels to shrink the image to about one tile.
    Auto,
    /// Exactly this many levels.
    Count(u32),
    /// One level per halving that keeps the width a multiple of the tile
    /// size, for maps that wrap horizontally.
    WrapX,
}

impl Default for LevelPolicy {
    fn default() -> Self {
        Self::Auto
    }
}

/// Sidecar metadata format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DescriptorFormat {
    /// Colon-delimited `key:value` file named `descriptor`.
    #[default]
    Bigshot,
    /// Deep Zoom XML, `<name>.xml` next to the tile folder.
    Dzi,
}

/// Directory layout of the tile tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FolderLayout {
    /// Levels directly under the output directory.
    #[default]
    Bigshot,
    /// Levels under `<output>/<name>_files`.
    Dzi,
}

/// Level directory numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LevelNumbering {
    /// 0 is full resolution.
    #[default]
    Ascending,
    /// 0 is the smallest level.
    Inverted,
}

/// Whether output is a directory tree or a packed archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Folders,
    Archive,
}

/// Parameters for building one image pyramid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidParameters {
    /// Tile step in pixels; tiles are `tile_size + overlap` square.
    pub tile_size: u32,
    /// Pixels shared between neighbouring tiles.
    pub overlap: u32,
    /// Longest side of the poster image.
    pub poster_size: u32,
    pub levels: LevelPolicy,
    pub level_numbering: LevelNumbering,
    pub image_format: ImageFormat,
    /// JPEG quality in (0, 1].
    pub jpeg_quality: f32,
    pub descriptor_format: DescriptorFormat,
    pub folder_layout: FolderLayout,
    pub output_format: OutputFormat,
}

impl Default for PyramidParameters {
    fn default() -> Self {
        Self {
            tile_size: 256,
            overlap: 0,
            poster_size: 512,
            levels: LevelPolicy::Auto,
            level_numbering: LevelNumbering::Ascending,
            image_format: ImageFormat::Jpeg,
            jpeg_quality: 0.7,
            descriptor_format: DescriptorFormat::Bigshot,
            folder_layout: FolderLayout::Bigshot,
            output_format: OutputFormat::Folders,
        }
    }
}

impl PyramidParameters {
    /// Side of each written tile.
    pub fn effective_tile_size(&self) -> u32 {
        self.tile_size + self.overlap
    }

    pub fn validate(&self) -> Result<(), PyramidError> {
        if self.tile_size <= self.overlap {
            return Err(PyramidError::InvalidTileSize {
                tile_size: self.tile_size,
                overlap: self.overlap,
            });
        }
        if self.poster_size == 0 {
            return Err(PyramidError::InvalidPosterSize);
        }
        if !(self.jpeg_quality > 0.0 && self.jpeg_quality <= 1.0) {
            return Err(PyramidError::InvalidQuality(self.jpeg_quality));
        }
        if self.levels == LevelPolicy::Count(0) {
            return Err(PyramidError::InvalidLevelCount);
        }
        Ok(())
    }

    /// Number of levels for a `width x height` image.
    pub fn level_count(&self, width: u32, height: u32) -> Result<u32, PyramidError> {
        let tile = self.effective_tile_size();
        match self.levels {
            LevelPolicy::Count(n) => Ok(n),
            LevelPolicy::Auto => {
                let max_dim = width.max(height).max(1) as f64;
                let n = max_dim.log2().ceil() - (tile as f64).log2().floor() + 2.0;
                Ok(n.max(1.0) as u32)
            }
            LevelPolicy::WrapX => {
                let mut w = width;
                let mut n = 0;
                while w > 0 && w % tile == 0 {
                    w /= 2;
                    n += 1;
                }
                if n == 0 {
                    return Err(PyramidError::WrapXNotAligned { width, tile });
                }
                Ok(n)
            }
        }
    }

    /// Directory name for the level `zoom` steps below full resolution.
    pub fn level_dir(&self, zoom: u32, levels: u32) -> String {
        match self.level_numbering {
            LevelNumbering::Ascending => zoom.to_string(),
            LevelNumbering::Inverted => (levels - zoom - 1).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_level_count() {
        let params = PyramidParameters::default();
        // ceil(log2 1000) = 10, floor(log2 256) = 8
        assert_eq!(params.level_count(1000, 600).unwrap(), 4);
        assert_eq!(params.level_count(256, 256).unwrap(), 2);
        assert_eq!(params.level_count(1, 1).unwrap(), 1);
    }

    #[test]
    fn test_auto_uses_effective_tile_size() {
        let params = PyramidParameters {
            tile_size: 254,
            overlap: 2,
            ..Default::default()
        };
        assert_eq!(params.level_count(4096, 2048).unwrap(), 12 - 8 + 2);
    }

    #[test]
    fn test_wrap_x_level_count() {
        let params = PyramidParameters {
            levels: LevelPolicy::WrapX,
            ..Default::default()
        };
        assert_eq!(params.level_count(1024, 300).unwrap(), 3);
        assert!(matches!(
            params.level_count(1000, 300),
            Err(PyramidError::WrapXNotAligned { width: 1000, tile: 256 })
        ));
    }

    #[test]
    fn test_level_dir_numbering() {
        let mut params = PyramidParameters::default();
        assert_eq!(params.level_dir(0, 4), "0");
        params.level_numbering = LevelNumbering::Inverted;
        assert_eq!(params.level_dir(0, 4), "3");
        assert_eq!(params.level_dir(3, 4), "0");
    }

    #[test]
    fn test_validate() {
        assert!(PyramidParameters::default().validate().is_ok());
        let bad = PyramidParameters {
            levels: LevelPolicy::Count(0),
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(PyramidError::InvalidLevelCount)));
        let bad = PyramidParameters {
            jpeg_quality: 1.5,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(PyramidError::InvalidQuality(_))));
    }

    #[test]
    fn test_tile_size_must_exceed_overlap() {
        let params = |tile_size, overlap| PyramidParameters {
            tile_size,
            overlap,
            ..Default::default()
        };
        assert!(params(3, 2).validate().is_ok());
        assert!(matches!(
            params(2, 2).validate(),
            Err(PyramidError::InvalidTileSize { tile_size: 2, overlap: 2 })
        ));
        assert!(matches!(
            params(0, 0).validate(),
            Err(PyramidError::InvalidTileSize { tile_size: 0, overlap: 0 })
        ));
    }
}
