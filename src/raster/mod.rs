//! Raster image storage, resampling and codecs.

mod codec;
mod buffer;
mod resample;

pub use codec::{read_image, write_image, CodecError, ImageCodec, ImageFormat, JpegCodec, PngCodec};
pub use buffer::{
    pack_24, pack_rgb, unpack_24, unpack_rgb, RasterError, RasterImage, Rgb, COMPONENT_BITS,
    COMPONENT_MAX,
};
