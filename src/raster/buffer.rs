//! A 30-bit (10 bits per channel) RGB pixel buffer.
//!
//! Channels are packed red-green-blue from the high bits down. Decoded 8-bit
//! sources are widened by bit replication, so the extra precision is headroom
//! for interpolation and accumulation, and quantizing back to 24 bits only
//! drops the two low bits of each channel.

use image::{Rgb as ImageRgb, RgbImage};
use thiserror::Error;

/// Bits allocated to each channel.
pub const COMPONENT_BITS: u32 = 10;

/// Largest channel value.
pub const COMPONENT_MAX: u32 = (1 << COMPONENT_BITS) - 1;

const RED: u32 = COMPONENT_BITS * 2;
const GREEN: u32 = COMPONENT_BITS;
const BLUE: u32 = 0;

/// Unpacked `[red, green, blue]` channel values in `0..=COMPONENT_MAX`.
pub type Rgb = [u32; 3];

/// Errors raised when constructing a raster from external data.
#[derive(Error, Debug)]
pub enum RasterError {
    #[error("Invalid image dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),
    #[error("Pixel data length {actual} does not match {expected}")]
    DataLength { expected: usize, actual: usize },
}

/// Packs channel values into a 30-bit pixel, clamping each to `COMPONENT_MAX`.
#[inline]
pub fn pack_rgb(rgb: Rgb) -> u32 {
    (rgb[0].min(COMPONENT_MAX) << RED)
        | (rgb[1].min(COMPONENT_MAX) << GREEN)
        | (rgb[2].min(COMPONENT_MAX) << BLUE)
}

/// Splits a 30-bit pixel into its channels.
#[inline]
pub fn unpack_rgb(v: u32) -> Rgb {
    [
        (v >> RED) & COMPONENT_MAX,
        (v >> GREEN) & COMPONENT_MAX,
        (v >> BLUE) & COMPONENT_MAX,
    ]
}

/// Quantizes a 30-bit pixel to 24-bit `0xRRGGBB`.
#[inline]
pub fn pack_24(v: u32) -> u32 {
    let [r, g, b] = unpack_rgb(v);
    ((r >> 2) << 16) | ((g >> 2) << 8) | (b >> 2)
}

/// Widens a 24-bit `0xRRGGBB` pixel to 30 bits.
#[inline]
pub fn unpack_24(p: u32) -> u32 {
    let widen = |c: u32| (c << 2) | (c >> 6);
    pack_rgb([
        widen((p >> 16) & 0xff),
        widen((p >> 8) & 0xff),
        widen(p & 0xff),
    ])
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// A packed 30-bit RGB image.
///
/// Horizontal addressing wraps modulo the width and vertical addressing
/// clamps to the first/last row, so seamless 360 degree maps can be sampled
/// across the seam.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    data: Vec<u32>,
}

impl RasterImage {
    /// Creates an all-black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Creates an image filled with one color.
    pub fn filled(width: u32, height: u32, rgb: Rgb) -> Self {
        let mut img = Self::new(width, height);
        img.fill(rgb);
        img
    }

    /// Wraps existing packed pixel data in row-major order.
    pub fn from_packed(width: u32, height: u32, data: Vec<u32>) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions(width, height));
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(RasterError::DataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Converts an 8-bit RGB buffer.
    pub fn from_rgb8(img: &RgbImage) -> Self {
        let data = img
            .pixels()
            .map(|p| unpack_24(((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32))
            .collect();
        Self {
            width: img.width(),
            height: img.height(),
            data,
        }
    }

    /// Quantizes to an 8-bit RGB buffer.
    pub fn to_rgb8(&self) -> RgbImage {
        let mut out = RgbImage::new(self.width, self.height);
        for (dst, &src) in out.pixels_mut().zip(&self.data) {
            let p = pack_24(src);
            *dst = ImageRgb([(p >> 16) as u8, (p >> 8) as u8, p as u8]);
        }
        out
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packed pixels in row-major order.
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Mutable packed pixels in row-major order.
    pub fn data_mut(&mut self) -> &mut [u32] {
        &mut self.data
    }

    /// Returns the packed value at `(x, y)`, wrapping x and clamping y.
    ///
    /// An empty image reads as black.
    #[inline]
    pub fn value(&self, x: i64, y: i64) -> u32 {
        if self.data.is_empty() {
            return 0;
        }
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.data[y * self.width as usize + x]
    }

    /// Sets the packed value of an in-range pixel.
    #[inline]
    pub fn set_value(&mut self, x: u32, y: u32, v: u32) {
        let idx = y as usize * self.width as usize + x as usize;
        self.data[idx] = v;
    }

    /// Channel values at `(x, y)` with the same addressing as [`Self::value`].
    #[inline]
    pub fn components(&self, x: i64, y: i64) -> Rgb {
        unpack_rgb(self.value(x, y))
    }

    /// Sets the channels of an in-range pixel.
    #[inline]
    pub fn set_components(&mut self, x: u32, y: u32, rgb: Rgb) {
        self.set_value(x, y, pack_rgb(rgb));
    }

    /// Fills every pixel with one color.
    pub fn fill(&mut self, rgb: Rgb) {
        let v = pack_rgb(rgb);
        self.data.iter_mut().for_each(|p| *p = v);
    }

    /// Bilinearly interpolated channels at a fractional position.
    ///
    /// Neighbours are read with wrap/clamp addressing; results truncate
    /// toward zero.
    pub fn sample(&self, x: f64, y: f64) -> Rgb {
        let x0 = x.floor();
        let y0 = y.floor();
        let xf = x - x0;
        let yf = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let c00 = self.components(x0, y0);
        let c10 = self.components(x0 + 1, y0);
        let c01 = self.components(x0, y0 + 1);
        let c11 = self.components(x0 + 1, y0 + 1);

        let mut out = [0u32; 3];
        for i in 0..3 {
            let top = lerp(c00[i] as f64, c10[i] as f64, xf);
            let bottom = lerp(c01[i] as f64, c11[i] as f64, xf);
            out[i] = lerp(top, bottom, yf) as u32;
        }
        out
    }

    /// Scales all channels of rows `y0..y1` by `num / denom`.
    pub fn multiply(&mut self, y0: u32, y1: u32, num: u32, denom: u32) {
        if denom == 0 {
            return;
        }
        let w = self.width as usize;
        let y1 = y1.min(self.height) as usize;
        let y0 = (y0 as usize).min(y1);
        for p in &mut self.data[y0 * w..y1 * w] {
            let [r, g, b] = unpack_rgb(*p);
            *p = pack_rgb([r * num / denom, g * num / denom, b * num / denom]);
        }
    }

    /// Copies the `size x size` region with top-left `(x, y)` into a new
    /// image; parts outside this image are black.
    pub fn extract_tile(&self, x: u32, y: u32, size: u32) -> RasterImage {
        let mut tile = RasterImage::new(size, size);
        if x >= self.width || y >= self.height {
            return tile;
        }
        let w = (self.width - x).min(size) as usize;
        let h = (self.height - y).min(size);
        for row in 0..h {
            let src_start = (y + row) as usize * self.width as usize + x as usize;
            let dst_start = row as usize * size as usize;
            tile.data[dst_start..dst_start + w].copy_from_slice(&self.data[src_start..src_start + w]);
        }
        tile
    }
}
