//! Pyramid sidecar metadata.

use std::path::Path;

use super::params::DescriptorFormat;
use super::PyramidError;

/// Everything a viewer needs to address the tiles of one pyramid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidDescriptor {
    /// Tile file suffix including the dot.
    pub suffix: &'static str,
    pub width: u32,
    pub height: u32,
    /// Side of each tile file, overlap included.
    pub tile_size: u32,
    pub overlap: u32,
    /// `1 - level_count`.
    pub min_zoom: i64,
    pub poster_size: u32,
    pub poster_width: u32,
    pub poster_height: u32,
}

impl PyramidDescriptor {
    /// The colon-delimited form.
    pub fn to_bigshot(&self) -> String {
        format!(
            "suffix:{}:width:{}:height:{}:tileSize:{}:overlap:{}:minZoom:{}:posterSize:{}:posterWidth:{}:posterHeight:{}",
            self.suffix,
            self.width,
            self.height,
            self.tile_size,
            self.overlap,
            self.min_zoom,
            self.poster_size,
            self.poster_width,
            self.poster_height
        )
    }

    /// The Deep Zoom XML form.
    pub fn to_dzi(&self) -> String {
        let format = self.suffix.trim_start_matches('.');
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <Image TileSize=\"{}\" Overlap=\"{}\" Format=\"{}\" ServerFormat=\"Default\" xmnls=\"http://schemas.microsoft.com/deepzoom/2009\">\n\
             <Size Width=\"{}\" Height=\"{}\" />\n\
             </Image>\n",
            self.tile_size, self.overlap, format, self.width, self.height
        )
    }

    pub fn render(&self, format: DescriptorFormat) -> String {
        match format {
            DescriptorFormat::Bigshot => self.to_bigshot(),
            DescriptorFormat::Dzi => self.to_dzi(),
        }
    }

    pub fn write(&self, format: DescriptorFormat, path: &Path) -> Result<(), PyramidError> {
        std::fs::write(path, self.render(format))?;
        Ok(())
    }
}
