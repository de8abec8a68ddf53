//! Encoding and decoding of raster images.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::buffer::RasterImage;

/// Errors that can occur while encoding or decoding images.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid quality {0}: must be in (0, 1]")]
    InvalidQuality(f32),
}

/// Turns encoded bytes into rasters and back.
pub trait ImageCodec: Send + Sync {
    /// File suffix including the leading dot, e.g. ".png".
    fn suffix(&self) -> &'static str;

    /// Decodes an encoded image.
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, CodecError> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(RasterImage::from_rgb8(&decoded.to_rgb8()))
    }

    /// Encodes `image` at `quality` in `(0, 1]`. Lossless codecs ignore it.
    fn encode(&self, image: &RasterImage, quality: f32) -> Result<Vec<u8>, CodecError>;
}

/// Lossless PNG output.
#[derive(Debug, Clone, Copy)]
pub struct PngCodec {
    pub compression: CompressionType,
    pub filter: FilterType,
}

impl Default for PngCodec {
    fn default() -> Self {
        Self {
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

impl ImageCodec for PngCodec {
    fn suffix(&self) -> &'static str {
        ".png"
    }

    fn encode(&self, image: &RasterImage, _quality: f32) -> Result<Vec<u8>, CodecError> {
        let rgb = image.to_rgb8();
        let mut buf = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut buf, self.compression, self.filter);
        encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?;
        Ok(buf)
    }
}

/// Lossy JPEG output.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCodec;

impl ImageCodec for JpegCodec {
    fn suffix(&self) -> &'static str {
        ".jpg"
    }

    fn encode(&self, image: &RasterImage, quality: f32) -> Result<Vec<u8>, CodecError> {
        if !(quality > 0.0 && quality <= 1.0) {
            return Err(CodecError::InvalidQuality(quality));
        }
        let q = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
        let rgb = image.to_rgb8();
        let mut buf = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buf, q);
        encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?;
        Ok(buf.into_inner())
    }
}

/// Output image format for tiles, posters and single faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Returns the codec for this format.
    pub fn codec(self) -> Box<dyn ImageCodec> {
        match self {
            ImageFormat::Jpeg => Box::new(JpegCodec),
            ImageFormat::Png => Box::new(PngCodec::default()),
        }
    }
}

/// Reads and decodes an image file of any format the image crate knows.
pub fn read_image(path: &Path) -> Result<RasterImage, CodecError> {
    let bytes = std::fs::read(path)?;
    let decoded = image::load_from_memory(&bytes)?;
    Ok(RasterImage::from_rgb8(&decoded.to_rgb8()))
}

/// Encodes `image` with `codec` and writes it to `path`.
pub fn write_image(
    image: &RasterImage,
    path: &Path,
    codec: &dyn ImageCodec,
    quality: f32,
) -> Result<(), CodecError> {
    let bytes = codec.encode(image, quality)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
