//! Floyd–Steinberg dithering onto a 7-color e-paper palette, packed two pixels per byte.
//!
//! [`dither::dither`] quantizes a [`PixelBuffer`] in place and [`pack::pack`] turns the result
//! into the panel's nibble-pair byte stream. [`pipeline`] wraps both with image decoding,
//! downscaling and optional centering for the command-line driver.

pub mod config;
pub mod dither;
pub mod error;
pub mod pack;
pub mod palette;
pub mod pipeline;

pub use dither::{PixelBuffer, apply_error, clamp, dither, dither_pixels};
pub use error::DitherError;
pub use pack::{pack, to_c_array};
pub use palette::{EPAPER_7_COLOR, Palette, Rgb, closest_color};
