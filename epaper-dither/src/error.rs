use thiserror::Error;

use crate::palette::Rgb;

/// Failures raised by the palette, dither and packing stages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DitherError {
    #[error("palette must contain at least one color")]
    EmptyPalette,

    #[error("palette has {len} colors, at most 16 fit in a nibble")]
    PaletteTooLarge { len: usize },

    #[error("pixel buffer holds {len} pixels, expected {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        len: usize,
    },

    /// A dithered pixel that is not a palette member. Only reachable if quantization is broken
    /// or the buffer was modified after dithering.
    #[error("pixel ({x}, {y}) has color {color:?} which is not in the palette")]
    NotInPalette { x: usize, y: usize, color: Rgb },
}
