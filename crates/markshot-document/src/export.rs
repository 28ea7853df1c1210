// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch export — render every record, then assemble a single document.

use markshot_core::error::{MarkshotError, Result};
use markshot_core::types::{ScreenshotId, ScreenshotRecord};
use markshot_store::ArtifactStore;
use tracing::{info, instrument, warn};

use crate::pdf::{AssembledDocument, DocumentAssembler, ExportItem};
use crate::render::{AnnotationRenderer, RenderStatus};

/// What happened to one record during export.
#[derive(Debug)]
pub struct ItemReport {
    pub id: ScreenshotId,
    /// `Err` means the record appears in the document with a placeholder.
    pub status: std::result::Result<RenderStatus, MarkshotError>,
}

impl ItemReport {
    /// True when the item did not get a normally rendered image.
    pub fn is_degraded(&self) -> bool {
        match &self.status {
            Ok(status) => status.is_degraded(),
            Err(_) => true,
        }
    }
}

/// The assembled document and per-record outcomes, in input order.
#[derive(Debug)]
pub struct ExportReport {
    pub document: AssembledDocument,
    pub items: Vec<ItemReport>,
}

impl ExportReport {
    pub fn degraded(&self) -> usize {
        self.items.iter().filter(|item| item.is_degraded()).count()
    }
}

/// Render `records` in parallel and assemble them, in order, into one PDF.
///
/// A record that cannot be rendered still gets its section, with a
/// placeholder instead of the image. Only assembly failure is an error.
#[instrument(skip_all, fields(records = records.len()))]
pub fn export_records(
    renderer: &AnnotationRenderer,
    assembler: &DocumentAssembler,
    store: &dyn ArtifactStore,
    records: &[ScreenshotRecord],
    title: Option<&str>,
) -> Result<ExportReport> {
    info!("Exporting screenshot records");
    let renders = renderer.render_batch(store, records);

    let mut items = Vec::with_capacity(records.len());
    let mut reports = Vec::with_capacity(records.len());
    for (record, render) in records.iter().zip(renders) {
        let (image, status) = match render.result {
            Ok(outcome) => {
                match &outcome.status {
                    RenderStatus::Rendered => {}
                    RenderStatus::FellBackToOriginal { reason } => {
                        warn!(id = %record.id, reason = %reason, "Exported from original raster");
                    }
                    RenderStatus::Unannotated { reason } => {
                        warn!(id = %record.id, reason = %reason, "Exported without annotations");
                    }
                }
                (Some(outcome.image), Ok(outcome.status))
            }
            Err(err) => {
                warn!(id = %record.id, error = %err, "Record could not be rendered");
                (None, Err(err))
            }
        };
        items.push(ExportItem::new(record.clone(), image));
        reports.push(ItemReport {
            id: render.id,
            status,
        });
    }

    let document = assembler.assemble(&items, title)?;
    let report = ExportReport {
        document,
        items: reports,
    };
    info!(
        pages = report.document.page_count,
        degraded = report.degraded(),
        "Export complete"
    );
    Ok(report)
}
