// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// markshot-document — Raster and document processing for Markshot.
//
// Provides screenshot ingest (decode, display-size resize), annotation
// rendering (connector line, arrowhead, marker dot, label box), and PDF
// assembly of annotated screenshot collections.

pub mod export;
pub mod image;
pub mod ingest;
pub mod pdf;
pub mod render;

// Re-export the primary structs so callers can use `markshot_document::DocumentAssembler` etc.
pub use export::{ExportReport, ItemReport, export_records};
pub use image::processor::ImageProcessor;
pub use ingest::ingest_screenshot;
pub use pdf::layout::ExportItem;
pub use pdf::reader::PdfReader;
pub use pdf::writer::{AssembledDocument, DocumentAssembler};
pub use render::{AnnotationRenderer, ItemRender, LabelFont, RenderOutcome, RenderStatus};
