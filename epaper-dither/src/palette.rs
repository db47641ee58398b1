//! Fixed display palette and nearest-color matching.
//!
//! Matching uses plain Euclidean distance in RGB. Distances are compared squared, which orders
//! candidates exactly like the rooted distance without any floating point.

use std::collections::HashMap;

use crate::error::DitherError;

/// An RGB8 color.
pub type Rgb = [u8; 3];

/// Largest palette whose indices still fit in one nibble.
pub const MAX_PALETTE_LEN: usize = 16;

/// The 7-color e-paper panel palette. The position of each color is the code the display
/// controller expects, so this order must not change.
pub const EPAPER_7_COLOR: [Rgb; 7] = [
    [0, 0, 0],       // 0 black
    [255, 255, 255], // 1 white
    [0, 250, 0],     // 2 green
    [0, 0, 255],     // 3 blue
    [255, 0, 0],     // 4 red
    [255, 255, 0],   // 5 yellow
    [255, 170, 0],   // 6 orange
];

/// Ordered palette plus a lookup from color back to its index.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<Rgb>,
    index: HashMap<Rgb, u8>,
}

impl Palette {
    /// Build a palette from colors in index order.
    ///
    /// # Errors
    ///
    /// Returns [`DitherError::EmptyPalette`] for an empty list and
    /// [`DitherError::PaletteTooLarge`] when indices would not fit in a nibble.
    pub fn new(colors: &[Rgb]) -> Result<Self, DitherError> {
        if colors.is_empty() {
            return Err(DitherError::EmptyPalette);
        }
        if colors.len() > MAX_PALETTE_LEN {
            return Err(DitherError::PaletteTooLarge { len: colors.len() });
        }
        let mut index = HashMap::with_capacity(colors.len());
        for (i, c) in colors.iter().enumerate() {
            // duplicates resolve to their first position
            index.entry(*c).or_insert(i as u8);
        }
        Ok(Self {
            colors: colors.to_vec(),
            index,
        })
    }

    /// The panel palette, see [`EPAPER_7_COLOR`].
    pub fn epaper() -> Self {
        let colors = EPAPER_7_COLOR.to_vec();
        let index = colors
            .iter()
            .enumerate()
            .map(|(i, c)| (*c, i as u8))
            .collect();
        Self { colors, index }
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Index of an exact palette member.
    pub fn index_of(&self, color: &Rgb) -> Option<u8> {
        self.index.get(color).copied()
    }

    /// Nearest palette entry to `target` with its index. Ties go to the earlier entry.
    pub fn closest(&self, target: Rgb) -> (u8, Rgb) {
        // non-empty by construction
        let idx = nearest_index(widen(target), &self.colors).unwrap_or(0);
        (idx as u8, self.colors[idx])
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::epaper()
    }
}

/// Return the entry of `colors` closest to `target`.
///
/// # Errors
///
/// Returns [`DitherError::EmptyPalette`] when `colors` is empty.
pub fn closest_color(target: Rgb, colors: &[Rgb]) -> Result<Rgb, DitherError> {
    nearest_index(widen(target), colors)
        .map(|i| colors[i])
        .ok_or(DitherError::EmptyPalette)
}

/// Linear scan for the first entry at minimum distance. Channels of `target` may lie outside
/// `0..=255`.
pub fn nearest_index(target: [i32; 3], colors: &[Rgb]) -> Option<usize> {
    let mut best = None;
    let mut best_dist = i64::MAX;
    for (i, c) in colors.iter().enumerate() {
        let dist = sq_dist(target, widen(*c));
        if dist < best_dist {
            best_dist = dist;
            best = Some(i);
        }
    }
    best
}

#[inline(always)]
pub(crate) fn widen(c: Rgb) -> [i32; 3] {
    [c[0] as i32, c[1] as i32, c[2] as i32]
}

#[inline(always)]
fn sq_dist(a: [i32; 3], b: [i32; 3]) -> i64 {
    let dr = (a[0] - b[0]) as i64;
    let dg = (a[1] - b[1]) as i64;
    let db = (a[2] - b[2]) as i64;
    dr * dr + dg * dg + db * db
}
