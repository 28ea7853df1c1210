// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Label fonts — a preferred scalable TrueType font when one can be found,
// otherwise a built-in 8x8 bitmap font so rendering never fails for lack of
// a font file.

use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use markshot_core::error::{MarkshotError, Result};
use tracing::{debug, info, warn};

/// Well-known locations of a sans-serif TrueType font.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Cell size of the built-in bitmap font.
const BUILTIN_CELL: u32 = 8;

/// The font used to measure and draw annotation labels.
pub enum LabelFont {
    /// A TrueType/OpenType font rasterised at `size` pixels.
    Scalable { font: FontVec, size: f32 },
    /// Fixed 8x8 bitmap glyphs.
    Builtin,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalable { size, .. } => f.debug_struct("Scalable").field("size", size).finish(),
            Self::Builtin => f.write_str("Builtin"),
        }
    }
}

impl LabelFont {
    /// Find the best available font.
    ///
    /// Tries `preferred` first, then [`SYSTEM_FONT_CANDIDATES`], and settles on
    /// the built-in bitmap font if none of them loads.
    pub fn resolve(preferred: Option<&Path>, size: f32) -> Self {
        let candidates = preferred
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            match Self::from_file(&path, size) {
                Ok(font) => {
                    info!(path = %path.display(), size, "Using scalable label font");
                    return font;
                }
                Err(err) => debug!(path = %path.display(), error = %err, "Font candidate rejected"),
            }
        }

        warn!("No scalable label font found, using built-in bitmap font");
        Self::Builtin
    }

    /// Load a scalable font from a file.
    pub fn from_file(path: &Path, size: f32) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data, size)
    }

    /// Load a scalable font from TrueType/OpenType bytes.
    pub fn from_bytes(data: Vec<u8>, size: f32) -> Result<Self> {
        if !(size.is_finite() && size > 0.0) {
            return Err(MarkshotError::InvalidInput(format!(
                "label font size must be positive, got {size}"
            )));
        }
        let font = FontVec::try_from_vec(data)
            .map_err(|err| MarkshotError::InvalidInput(format!("unusable font data: {err}")))?;
        Ok(Self::Scalable { font, size })
    }

    /// Rendered width and height of `text` in pixels.
    pub fn measure(&self, text: &str) -> (u32, u32) {
        match self {
            Self::Scalable { font, size } => text_size(PxScale::from(*size), font, text),
            Self::Builtin => {
                let chars = text.chars().count() as u32;
                let height = if chars == 0 { 0 } else { BUILTIN_CELL };
                (chars * BUILTIN_CELL, height)
            }
        }
    }

    /// Draw `text` with its top-left corner at `(x, y)`, clipped to the canvas.
    pub fn draw(&self, canvas: &mut RgbaImage, color: Rgba<u8>, x: i32, y: i32, text: &str) {
        match self {
            Self::Scalable { font, size } => {
                draw_text_mut(canvas, color, x, y, PxScale::from(*size), font, text)
            }
            Self::Builtin => draw_bitmap_text(canvas, color, x, y, text),
        }
    }
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn draw_bitmap_text(canvas: &mut RgbaImage, color: Rgba<u8>, x: i32, y: i32, text: &str) {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    for (index, c) in text.chars().enumerate() {
        let origin_x = x + index as i32 * BUILTIN_CELL as i32;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..8 {
                // Bit 0 is the leftmost pixel of the row.
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = origin_x + col;
                let py = y + row as i32;
                if px >= 0 && py >= 0 && px < width && py < height {
                    canvas.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_measures_fixed_cells() {
        let font = LabelFont::Builtin;
        assert_eq!(font.measure("Test"), (32, 8));
        assert_eq!(font.measure(""), (0, 0));
        assert_eq!(font.measure("é→"), (16, 8));
    }

    #[test]
    fn builtin_draws_inside_its_cells() {
        let mut canvas = RgbaImage::from_pixel(40, 20, Rgba([255, 255, 255, 255]));
        LabelFont::Builtin.draw(&mut canvas, Rgba([0, 0, 0, 255]), 4, 6, "H");
        let black: Vec<(u32, u32)> = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 == [0, 0, 0, 255])
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!black.is_empty());
        assert!(black.iter().all(|&(x, y)| (4..12).contains(&x) && (6..14).contains(&y)));
    }

    #[test]
    fn builtin_clips_at_the_edges() {
        let mut canvas = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        LabelFont::Builtin.draw(&mut canvas, Rgba([0, 0, 0, 255]), -3, -3, "WW");
    }

    #[test]
    fn resolve_without_fonts_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ttf");
        // The preferred font is missing; whatever is picked must still work.
        let font = LabelFont::resolve(Some(&missing), 14.0);
        let (w, h) = font.measure("Test");
        assert!(w > 0 && h > 0);
    }

    #[test]
    fn bad_font_bytes_are_rejected() {
        assert!(matches!(
            LabelFont::from_bytes(b"not a font".to_vec(), 14.0),
            Err(MarkshotError::InvalidInput(_))
        ));
        assert!(LabelFont::from_bytes(Vec::new(), 0.0).is_err());
    }
}
