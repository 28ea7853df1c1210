// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Annotation renderer — draws each annotation's connecting line, arrowhead,
// pointer dot, and label box onto a screenshot's display raster.
//
// Loading follows a fixed degradation ladder: the display raster is preferred,
// the original raster is used if the display raster is missing or corrupt, and
// if drawing or encoding fails after a raster was loaded the unmodified source
// is returned. Every step down the ladder is recorded in `RenderStatus`.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;
use markshot_core::AppConfig;
use markshot_core::error::{MarkshotError, Result};
use markshot_core::types::{AnnotationRecord, ArtifactKind, ScreenshotId, ScreenshotRecord};
use markshot_store::ArtifactStore;
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use super::font::LabelFont;
use super::geometry::{Arrow, ClipBounds, LabelBox, MARKER_RADIUS, PointF, STROKE_WIDTH};
use crate::image::ImageProcessor;

const ARROW_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const LABEL_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const LABEL_TEXT: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Strokes are cut this many pixels outside the canvas.
const CLIP_MARGIN: f64 = 16.0;

/// How a render was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderStatus {
    /// Annotations drawn on the display raster.
    Rendered,
    /// The display raster was unusable; annotations were drawn on the
    /// original raster with display-space coordinates.
    FellBackToOriginal { reason: String },
    /// A raster loaded but annotating it failed; the image is the unmodified
    /// source.
    Unannotated { reason: String },
}

impl RenderStatus {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Rendered)
    }
}

/// A rendered raster and how it came about.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// Encoded image bytes (PNG unless the render was `Unannotated`).
    pub image: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub status: RenderStatus,
}

/// The result of rendering one record in a batch.
#[derive(Debug)]
pub struct ItemRender {
    pub id: ScreenshotId,
    pub result: Result<RenderOutcome>,
}

/// Draws annotations onto rasters. Holds no mutable state, so one renderer
/// can serve many threads at once.
#[derive(Debug)]
pub struct AnnotationRenderer {
    font: LabelFont,
}

impl AnnotationRenderer {
    pub fn new(font: LabelFont) -> Self {
        Self { font }
    }

    /// A renderer that uses the built-in bitmap font. Output does not depend
    /// on which fonts the host has installed.
    pub fn with_builtin_font() -> Self {
        Self::new(LabelFont::Builtin)
    }

    /// A renderer using the configured label font, falling back as needed.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(LabelFont::resolve(
            config.label_font_path.as_deref(),
            config.label_font_size,
        ))
    }

    // -- Drawing --------------------------------------------------------------

    /// Draw every annotation onto `canvas` in list order.
    pub fn annotate(&self, canvas: &mut RgbaImage, annotations: &[AnnotationRecord]) {
        for annotation in annotations {
            self.draw_annotation(canvas, annotation);
        }
    }

    fn draw_annotation(&self, canvas: &mut RgbaImage, annotation: &AnnotationRecord) {
        let arrow = Arrow::new(annotation.anchor(), annotation.pointer());
        debug!(
            id = %annotation.id,
            tail = ?arrow.tail,
            tip = ?arrow.tip,
            barbs = ?arrow.barbs,
            "Drawing annotation"
        );

        let (width, height) = canvas.dimensions();
        let strokes = ClipBounds::around(width, height, CLIP_MARGIN);
        draw_thick_line(canvas, &strokes, arrow.tail, arrow.tip, ARROW_COLOR);
        for barb in arrow.barbs {
            draw_thick_line(canvas, &strokes, arrow.tip, barb, ARROW_COLOR);
        }

        let (tip_x, tip_y) = arrow.tip;
        if ClipBounds::around(width, height, f64::from(MARKER_RADIUS + 1)).contains(arrow.tip) {
            draw_filled_circle_mut(
                canvas,
                (tip_x.round() as i32, tip_y.round() as i32),
                MARKER_RADIUS,
                ARROW_COLOR,
            );
        }

        let (text_w, text_h) = self.font.measure(&annotation.text);
        let label = LabelBox::at(annotation.anchor(), text_w, text_h);
        if !label.overlaps(width, height) {
            debug!(id = %annotation.id, "Label lies off the canvas");
            return;
        }
        let rect = Rect::at(label.left, label.top).of_size(label.width(), label.height());
        draw_filled_rect_mut(canvas, rect, LABEL_FILL);
        draw_hollow_rect_mut(canvas, rect, ARROW_COLOR);
        self.font
            .draw(canvas, LABEL_TEXT, label.text_x, label.text_y, &annotation.text);
    }

    // -- Bytes in, bytes out --------------------------------------------------

    /// Decode `image_bytes`, draw `annotations`, and return PNG bytes of the
    /// same pixel dimensions.
    #[instrument(skip_all, fields(bytes_len = image_bytes.len(), annotations = annotations.len()))]
    pub fn render_bytes(&self, image_bytes: &[u8], annotations: &[AnnotationRecord]) -> Result<Vec<u8>> {
        let mut canvas = ImageProcessor::from_bytes(image_bytes)?.into_rgba8();
        self.annotate(&mut canvas, annotations);
        ImageProcessor::from_rgba(canvas).to_png_bytes()
    }

    // -- Records --------------------------------------------------------------

    /// Render a stored record for preview or export.
    ///
    /// Fails with `NotFound` only when neither raster exists, and with
    /// `RenderFailure` when rasters exist but none of them decodes.
    #[instrument(skip_all, fields(id = %record.id, annotations = record.annotations.len()))]
    pub fn render_record(&self, store: &dyn ArtifactStore, record: &ScreenshotRecord) -> Result<RenderOutcome> {
        let (source, fallback_reason) = load_source(store, record)?;
        let (width, height) = (source.processor.width(), source.processor.height());
        if (width, height) != (record.display_width, record.display_height) {
            debug!(
                width,
                height,
                display_width = record.display_width,
                display_height = record.display_height,
                "Source raster does not match the display size"
            );
        }

        let mut canvas = source.processor.into_rgba8();
        self.annotate(&mut canvas, &record.annotations);

        match ImageProcessor::from_rgba(canvas).to_png_bytes() {
            Ok(image) => {
                let status = match fallback_reason {
                    None => RenderStatus::Rendered,
                    Some(reason) => RenderStatus::FellBackToOriginal { reason },
                };
                info!(?status, "Record rendered");
                Ok(RenderOutcome {
                    image,
                    width,
                    height,
                    status,
                })
            }
            Err(err) => {
                warn!(error = %err, "Annotating failed, returning the unmodified raster");
                Ok(RenderOutcome {
                    image: source.bytes,
                    width,
                    height,
                    status: RenderStatus::Unannotated {
                        reason: err.to_string(),
                    },
                })
            }
        }
    }

    /// Render many records in parallel. Results come back in input order and
    /// one record's failure never affects another's.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn render_batch(&self, store: &dyn ArtifactStore, records: &[ScreenshotRecord]) -> Vec<ItemRender> {
        records
            .par_iter()
            .map(|record| ItemRender {
                id: record.id,
                result: self.render_record(store, record),
            })
            .collect()
    }
}

/// A decoded raster together with the bytes it came from.
struct SourceRaster {
    processor: ImageProcessor,
    bytes: Vec<u8>,
}

/// Load the display raster, or the original one with the reason the display
/// raster was passed over.
fn load_source(
    store: &dyn ArtifactStore,
    record: &ScreenshotRecord,
) -> Result<(SourceRaster, Option<String>)> {
    let display_key = record.artifact_key(ArtifactKind::Display);
    let display = try_load(store, &display_key)?;
    let display_missing = matches!(display, Loaded::Missing);
    let reason = match display {
        Loaded::Ok(source) => return Ok((source, None)),
        Loaded::Missing => format!("display raster {display_key} is missing"),
        Loaded::Corrupt(err) => format!("display raster {display_key} is unreadable: {err}"),
    };
    warn!(reason = %reason, "Falling back to the original raster");

    let original_key = record.artifact_key(ArtifactKind::Original);
    match try_load(store, &original_key)? {
        Loaded::Ok(source) => Ok((source, Some(reason))),
        Loaded::Missing if display_missing => Err(MarkshotError::NotFound(format!(
            "no raster stored for screenshot {}",
            record.id
        ))),
        Loaded::Missing => Err(MarkshotError::RenderFailure(format!(
            "{reason}; original raster {original_key} is missing"
        ))),
        Loaded::Corrupt(err) => Err(MarkshotError::RenderFailure(format!(
            "{reason}; original raster {original_key} is unreadable: {err}"
        ))),
    }
}

enum Loaded {
    Ok(SourceRaster),
    Missing,
    Corrupt(MarkshotError),
}

fn try_load(store: &dyn ArtifactStore, key: &str) -> Result<Loaded> {
    let Some(bytes) = store.read(key)? else {
        return Ok(Loaded::Missing);
    };
    Ok(match ImageProcessor::from_bytes(&bytes) {
        Ok(processor) => Loaded::Ok(SourceRaster { processor, bytes }),
        Err(err) => Loaded::Corrupt(err),
    })
}

/// Draw a `STROKE_WIDTH`-pixel line as a bundle of parallel one-pixel lines,
/// offset in half-pixel steps along the normal so diagonals leave no gaps.
/// The line is first cut to `bounds` so its length never exceeds the canvas.
fn draw_thick_line(
    canvas: &mut RgbaImage,
    bounds: &ClipBounds,
    start: PointF,
    end: PointF,
    color: Rgba<u8>,
) {
    let Some((start, end)) = bounds.clip_segment(start, end) else {
        return;
    };
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let length = (dx * dx + dy * dy).sqrt();
    if length < f32::EPSILON {
        // Zero-length: nothing to stroke; the marker dot covers the point.
        return;
    }
    let (nx, ny) = (-dy / length, dx / length);
    let half = (STROKE_WIDTH as f32 - 1.0) / 2.0;
    let steps = (STROKE_WIDTH - 1) * 2;
    for step in 0..=steps {
        let offset = -half + step as f32 * 0.5;
        draw_line_segment_mut(
            canvas,
            (start.0 + nx * offset, start.1 + ny * offset),
            (end.0 + nx * offset, end.1 + ny * offset),
            color,
        );
    }
}
