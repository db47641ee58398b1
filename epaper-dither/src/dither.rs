//! Floyd–Steinberg error diffusion onto a fixed palette.
//!
//! The buffer is walked row-major, left to right, top to bottom. Each pixel is replaced by its
//! nearest palette color and the residual (old - new) is pushed onto neighbours that have not
//! been visited yet. Neighbour writes go straight into the buffer, so a later pixel sees every
//! correction accumulated from earlier ones. Reordering the walk changes the output.

use crate::error::DitherError;
use crate::palette::{Palette, Rgb, widen};

/// Owned `width x height` RGB grid, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl PixelBuffer {
    /// Wrap `pixels` as a grid.
    ///
    /// # Errors
    ///
    /// Returns [`DitherError::DimensionMismatch`] if `pixels.len() != width * height`.
    pub fn new(width: usize, height: usize, pixels: Vec<Rgb>) -> Result<Self, DitherError> {
        check_dimensions(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_pixel(width: usize, height: usize, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline(always)]
    pub fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.pixels[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, color: Rgb) {
        let i = self.index(x, y);
        self.pixels[i] = color;
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }
}

fn check_dimensions(width: usize, height: usize, len: usize) -> Result<(), DitherError> {
    if width.checked_mul(height) != Some(len) {
        return Err(DitherError::DimensionMismatch { width, height, len });
    }
    Ok(())
}

/// Clamp to the displayable channel range.
#[inline(always)]
pub fn clamp(x: i64) -> u8 {
    x.clamp(0, 255) as u8
}

/// Add `residual * factor` to each channel of `pixel`, truncating toward zero before clamping.
pub fn apply_error(pixel: Rgb, residual: [i32; 3], factor: f64) -> Rgb {
    let channel = |c: usize| {
        let v = pixel[c] as f64 + residual[c] as f64 * factor;
        clamp(v.trunc() as i64)
    };
    [channel(0), channel(1), channel(2)]
}

#[derive(Clone, Copy)]
struct PropEntry {
    dx: isize,
    dy: usize,
    fraction: f64,
}

// Neighbours only ever lie to the right on the current row or on the next row, so every target
// is still unvisited when it receives error.
const FLOYD_STEINBERG: [PropEntry; 4] = [
    PropEntry {
        dx: 1,
        dy: 0,
        fraction: 7.0 / 16.0,
    },
    PropEntry {
        dx: 0,
        dy: 1,
        fraction: 5.0 / 16.0,
    },
    PropEntry {
        dx: -1,
        dy: 1,
        fraction: 3.0 / 16.0,
    },
    PropEntry {
        dx: 1,
        dy: 1,
        fraction: 1.0 / 16.0,
    },
];

/// Dither `buffer` in place so every pixel becomes a member of `palette`.
pub fn dither(buffer: &mut PixelBuffer, palette: &Palette) {
    let (width, height) = (buffer.width, buffer.height);
    diffuse(&mut buffer.pixels, width, height, palette);
}

/// Slice form of [`dither`] for callers holding a raw row-major buffer.
///
/// # Errors
///
/// Returns [`DitherError::DimensionMismatch`] if `pixels.len() != width * height`. Nothing is
/// written in that case.
pub fn dither_pixels(
    pixels: &mut [Rgb],
    width: usize,
    height: usize,
    palette: &Palette,
) -> Result<(), DitherError> {
    check_dimensions(width, height, pixels.len())?;
    diffuse(pixels, width, height, palette);
    Ok(())
}

fn diffuse(pixels: &mut [Rgb], width: usize, height: usize, palette: &Palette) {
    let mut diffused = 0usize;
    for y in 0..height {
        for x in 0..width {
            let i = x + y * width;
            let old = pixels[i];
            let (_, new) = palette.closest(old);
            pixels[i] = new;

            let (o, n) = (widen(old), widen(new));
            let err = [o[0] - n[0], o[1] - n[1], o[2] - n[2]];
            if err == [0, 0, 0] {
                continue;
            }
            diffused += 1;
            for entry in FLOYD_STEINBERG.iter() {
                let nx = x as isize + entry.dx;
                let ny = y + entry.dy;
                if nx < 0 || nx as usize >= width || ny >= height {
                    continue;
                }
                let j = nx as usize + ny * width;
                pixels[j] = apply_error(pixels[j], err, entry.fraction);
            }
        }
    }
    tracing::trace!(width, height, diffused, "error diffusion pass complete");
}
