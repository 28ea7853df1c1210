// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, resize to display resolution, and re-encode
// screenshots. Operates on in-memory images using the `image` crate.

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use markshot_core::error::{MarkshotError, Result};
use tracing::{debug, info, instrument};

/// Decoding and encoding around a single in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, so the
/// decoded buffer is owned by exactly one value at a time and is released as
/// soon as that value goes out of scope.
///
/// ```ignore
/// let display_png = ImageProcessor::from_bytes(&upload)?
///     .resize_exact(1080, 810)
///     .to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes (PNG, JPEG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            MarkshotError::RenderFailure(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an RGBA buffer, e.g. one annotations were drawn onto.
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return an RGBA copy suitable for drawing.
    pub fn into_rgba8(self) -> RgbaImage {
        self.image.into_rgba8()
    }

    /// Consume the processor and return an RGB copy for PDF embedding.
    pub fn into_rgb8(self) -> RgbImage {
        self.image.into_rgb8()
    }

    // -- Transformations ------------------------------------------------------

    /// Resize the image to exactly `width` x `height`, ignoring aspect ratio.
    ///
    /// Uses Lanczos3 filtering. Ingest calls this once per record to produce
    /// the display raster; the result must never be fed back through it.
    #[instrument(skip(self), fields(width, height))]
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        info!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            width,
            height,
            "Resizing image"
        );
        let resized =
            self.image
                .resize_exact(width, height, image::imageops::FilterType::Lanczos3);
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }
}

/// Guess a file extension for encoded image bytes, defaulting to `png`.
pub fn extension_for(data: &[u8]) -> &'static str {
    image::guess_format(data)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("png")
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        MarkshotError::RenderFailure(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        ImageProcessor::from_rgba(img).to_png_bytes().unwrap()
    }

    #[test]
    fn decode_reports_dimensions() {
        let processor = ImageProcessor::from_bytes(&png(40, 30)).unwrap();
        assert_eq!((processor.width(), processor.height()), (40, 30));
    }

    #[test]
    fn garbage_is_a_render_failure() {
        assert!(matches!(
            ImageProcessor::from_bytes(b"definitely not an image"),
            Err(MarkshotError::RenderFailure(_))
        ));
    }

    #[test]
    fn resize_exact_hits_target() {
        let resized = ImageProcessor::from_bytes(&png(100, 50))
            .unwrap()
            .resize_exact(90, 45);
        assert_eq!((resized.width(), resized.height()), (90, 45));
    }

    #[test]
    fn extension_is_sniffed_from_content() {
        assert_eq!(extension_for(&png(2, 2)), "png");
        assert_eq!(extension_for(b"????"), "png");
    }
}
