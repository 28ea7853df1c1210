// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the markshot-document crate: annotation drawing
// on a display-sized raster and assembly of a small collection.

use chrono::NaiveDate;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use markshot_core::{AnnotationInput, AnnotationRecord, ScreenshotId, ScreenshotRecord};
use markshot_document::{AnnotationRenderer, DocumentAssembler, ExportItem, ImageProcessor};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Draw ten annotations onto a 1080x810 display raster.
///
/// Uses the built-in bitmap font so the numbers do not depend on which
/// TrueType fonts the machine happens to have.
fn bench_annotate(c: &mut Criterion) {
    let canvas = RgbaImage::from_pixel(1080, 810, Rgba([240, 240, 240, 255]));
    let owner = ScreenshotId::new();
    let annotations: Vec<AnnotationRecord> = (0..10)
        .map(|i| {
            let offset = i as f64 * 70.0;
            let input = AnnotationInput::new(
                format!("Step {i}"),
                (40.0 + offset, 60.0),
                (80.0 + offset, 400.0),
            );
            AnnotationRecord::new(owner, input).expect("valid annotation")
        })
        .collect();
    let renderer = AnnotationRenderer::with_builtin_font();

    c.bench_function("annotate (1080x810, 10 annotations)", |b| {
        b.iter(|| {
            let mut working = black_box(canvas.clone());
            renderer.annotate(&mut working, black_box(&annotations));
            black_box(working);
        });
    });
}

/// Assemble a three-item document from small rasters.
fn bench_assemble(c: &mut Criterion) {
    let png = ImageProcessor::from_rgba(RgbaImage::from_pixel(270, 180, Rgba([90, 120, 200, 255])))
        .to_png_bytes()
        .expect("encode synthetic raster");
    let items: Vec<ExportItem> = (0..3)
        .map(|_| {
            let record = ScreenshotRecord::new("bench.png", 300, 200).expect("valid record");
            ExportItem::new(record, Some(png.clone()))
        })
        .collect();
    let generated_at = NaiveDate::from_ymd_opt(2026, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid timestamp");
    let assembler = DocumentAssembler::new().with_generated_at(generated_at);

    c.bench_function("assemble (3 items)", |b| {
        b.iter(|| {
            let doc = assembler.assemble(black_box(&items), None).expect("assembly");
            black_box(doc.bytes);
        });
    });
}

criterion_group!(benches, bench_annotate, bench_assemble);
criterion_main!(benches);
