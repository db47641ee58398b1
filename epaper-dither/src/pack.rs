//! Packing of dithered pixels into the panel's 4 bits-per-pixel wire format.
//!
//! Two horizontally adjacent pixels share a byte: left pixel in the high nibble, right pixel
//! in the low nibble, rows top to bottom. When the width is odd the last column of each row is
//! dropped, so the output is always `height * (width / 2)` bytes.

use crate::dither::PixelBuffer;
use crate::error::DitherError;
use crate::palette::Palette;

/// Pack a dithered buffer into palette-index nibble pairs.
///
/// # Errors
///
/// Returns [`DitherError::NotInPalette`] for the first pixel that is not an exact palette member.
pub fn pack(buffer: &PixelBuffer, palette: &Palette) -> Result<Vec<u8>, DitherError> {
    let pairs = buffer.width() / 2;
    let mut out = Vec::with_capacity(pairs * buffer.height());
    let lookup = |x: usize, y: usize| {
        let color = buffer.get(x, y);
        palette
            .index_of(&color)
            .ok_or(DitherError::NotInPalette { x, y, color })
    };
    for y in 0..buffer.height() {
        for x in (0..pairs).map(|p| p * 2) {
            let hi = lookup(x, y)?;
            let lo = lookup(x + 1, y)?;
            out.push((hi << 4) | lo);
        }
    }
    tracing::trace!(
        width = buffer.width(),
        height = buffer.height(),
        bytes = out.len(),
        "packed nibble pairs"
    );
    Ok(out)
}

/// Render packed bytes as an array initializer, e.g. `[0x25,0x10]`.
///
/// With `line_width = Some(n)` a newline follows the separator after every `n` elements.
pub fn to_c_array(bytes: &[u8], line_width: Option<usize>) -> String {
    let mut s = String::with_capacity(2 + bytes.len() * 6);
    s.push('[');
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            s.push(',');
            if let Some(n) = line_width.filter(|n| *n > 0)
                && i % n == 0
            {
                s.push('\n');
            }
        }
        s.push_str(&format!("0x{b:02x}"));
    }
    s.push(']');
    s
}
