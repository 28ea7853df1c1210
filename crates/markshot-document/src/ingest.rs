// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ingest — turn an uploaded screenshot into a stored original, a pinned
// display raster, and a fresh record.

use markshot_core::error::{MarkshotError, Result};
use markshot_core::scale;
use markshot_core::types::{ArtifactKind, ScreenshotId, ScreenshotRecord};
use markshot_store::ArtifactStore;
use tracing::{info, instrument, warn};

use crate::image::ImageProcessor;
use crate::image::processor::extension_for;

/// Store an uploaded screenshot and return its record.
///
/// The original bytes are kept verbatim under `<id>.<ext>`; the display
/// raster is resized once and stored as `<id>_display.png`. The record's
/// display dimensions are the ones that raster was created with.
#[instrument(skip_all, fields(upload_len = upload.len()))]
pub fn ingest_screenshot(store: &dyn ArtifactStore, upload: &[u8]) -> Result<ScreenshotRecord> {
    let processor = ImageProcessor::from_bytes(upload)
        .map_err(|err| MarkshotError::InvalidInput(format!("upload is not an image: {err}")))?;
    let (width, height) = (processor.width(), processor.height());
    let (display_w, display_h) = scale(width, height)?;
    if display_w == 0 || display_h == 0 {
        return Err(MarkshotError::InvalidInput(format!(
            "{width}x{height} is too small to produce a display raster"
        )));
    }

    let id = ScreenshotId::new();
    let filename = format!("{id}.{}", extension_for(upload));
    let record = ScreenshotRecord::with_id(id, filename, width, height)?;

    let display = processor.resize_exact(display_w, display_h).to_png_bytes()?;
    let original_key = record.artifact_key(ArtifactKind::Original);
    store.write(&original_key, upload)?;
    if let Err(err) = store.write(&record.artifact_key(ArtifactKind::Display), &display) {
        // No record will reference the original, so it must not outlive this call.
        if let Err(cleanup) = store.remove(&original_key) {
            warn!(key = %original_key, error = %cleanup, "Could not remove original after failed ingest");
        }
        return Err(err);
    }

    info!(
        id = %record.id,
        original = ?(width, height),
        display = ?(display_w, display_h),
        "Screenshot ingested"
    );
    Ok(record)
}
