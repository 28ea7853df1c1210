// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — wires the storage directory, record catalog,
// renderer, and assembler together for the command-line front end.
//
// Every mutating operation saves the catalog before returning, so a crash
// between commands never leaves records without their annotations.

use std::path::{Path, PathBuf};

use markshot_core::error::{MarkshotError, Result};
use markshot_core::types::{
    AnnotationId, AnnotationInput, AnnotationRecord, ArtifactKind, ScreenshotId,
    ScreenshotRecord,
};
use markshot_core::AppConfig;
use markshot_document::{
    AnnotationRenderer, DocumentAssembler, ExportReport, RenderStatus, export_records,
    ingest_screenshot,
};
use markshot_store::{
    ArtifactStore, FsArtifactStore, MemoryRecordSource, PurgeReport, RecordSource, StorageAccountant,
    UsageReport, purge_record,
};
use tracing::{info, warn};

/// File name of the record catalog inside the storage directory.
pub const CATALOG_FILE: &str = "catalog.json";

/// Shared application services.
pub struct AppServices {
    config: AppConfig,
    store: FsArtifactStore,
    catalog: MemoryRecordSource,
    catalog_path: PathBuf,
    renderer: AnnotationRenderer,
}

impl AppServices {
    /// Initialise all services. Call once at startup.
    ///
    /// Creates the storage directory and loads the catalog; the label font is
    /// resolved here so every render in the process uses the same one.
    pub fn init(config: AppConfig) -> Result<Self> {
        let store = FsArtifactStore::open(&config.storage_dir)?;
        let catalog_path = store.root().join(CATALOG_FILE);
        let catalog = MemoryRecordSource::load_catalog(&catalog_path)?;
        let renderer = AnnotationRenderer::from_config(&config);

        info!(
            path = %store.root().display(),
            records = catalog.len(),
            "app services initialised"
        );

        Ok(Self {
            config,
            store,
            catalog,
            catalog_path,
            renderer,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn persist(&self) -> Result<()> {
        self.catalog.save_catalog(&self.catalog_path)
    }

    // -- Records -------------------------------------------------------------

    /// All records, oldest first.
    pub fn records(&self) -> Result<Vec<ScreenshotRecord>> {
        self.catalog.list()
    }

    pub fn record(&self, id: ScreenshotId) -> Result<ScreenshotRecord> {
        self.catalog.require(id)
    }

    /// Ingest an image file from disk.
    pub fn ingest_file(&self, path: &Path) -> Result<ScreenshotRecord> {
        let upload = std::fs::read(path)?;
        self.ingest_bytes(&upload)
    }

    pub fn ingest_bytes(&self, upload: &[u8]) -> Result<ScreenshotRecord> {
        let record = ingest_screenshot(&self.store, upload)?;
        self.catalog.insert(record.clone())?;
        self.persist()?;
        Ok(record)
    }

    /// Remove a record and both of its rasters.
    pub fn delete(&self, id: ScreenshotId) -> Result<PurgeReport> {
        let record = self.catalog.require(id)?;
        let report = purge_record(&self.store, &record)?;
        self.catalog.remove(id)?;
        self.persist()?;
        info!(%id, freed = report.freed_bytes(), "record deleted");
        Ok(report)
    }

    // -- Annotations ---------------------------------------------------------

    pub fn add_annotation(
        &self,
        id: ScreenshotId,
        input: AnnotationInput,
    ) -> Result<AnnotationRecord> {
        let annotation = self
            .catalog
            .update(id, |record| record.add_annotation(input).cloned())?;
        self.persist()?;
        Ok(annotation)
    }

    pub fn update_annotation(
        &self,
        id: ScreenshotId,
        annotation: AnnotationId,
        input: AnnotationInput,
    ) -> Result<()> {
        self.catalog
            .update(id, |record| record.update_annotation(annotation, input))?;
        self.persist()
    }

    pub fn remove_annotation(
        &self,
        id: ScreenshotId,
        annotation: AnnotationId,
    ) -> Result<AnnotationRecord> {
        let removed = self
            .catalog
            .update(id, |record| record.remove_annotation(annotation))?;
        self.persist()?;
        Ok(removed)
    }

    // -- Output --------------------------------------------------------------

    /// Render one record with its annotations and write the image to `out`.
    pub fn preview(&self, id: ScreenshotId, out: &Path) -> Result<RenderStatus> {
        let record = self.catalog.require(id)?;
        let outcome = self.renderer.render_record(&self.store, &record)?;
        if outcome.status.is_degraded() {
            warn!(%id, status = ?outcome.status, "preview is degraded");
        }
        std::fs::write(out, &outcome.image)?;
        info!(%id, path = %out.display(), "preview written");
        Ok(outcome.status)
    }

    /// Copy one stored raster, without annotations, to `out`.
    pub fn export_raster(&self, id: ScreenshotId, kind: ArtifactKind, out: &Path) -> Result<u64> {
        let record = self.catalog.require(id)?;
        let key = record.artifact_key(kind);
        let bytes = self
            .store
            .read(&key)?
            .ok_or_else(|| MarkshotError::NotFound(format!("artifact {key}")))?;
        std::fs::write(out, &bytes)?;
        info!(%id, ?kind, path = %out.display(), "raster written");
        Ok(bytes.len() as u64)
    }

    /// Export every record, oldest first, into a PDF at `out`.
    ///
    /// Nothing is written when assembly fails.
    pub fn export(&self, out: &Path, title: Option<&str>) -> Result<ExportReport> {
        let records = self.catalog.list()?;
        let assembler = DocumentAssembler::new();
        let title = title.or(self.config.default_title.as_deref());
        let report = export_records(&self.renderer, &assembler, &self.store, &records, title)?;
        std::fs::write(out, &report.document.bytes)?;
        info!(path = %out.display(), pages = report.document.page_count, "export written");
        Ok(report)
    }

    /// Bytes occupied by every catalogued record.
    pub fn usage(&self) -> Result<UsageReport> {
        let records = self.catalog.list()?;
        StorageAccountant::new(&self.store).usage(&records)
    }
}

/// Parse an id given on the command line.
pub fn parse_screenshot_id(raw: &str) -> Result<ScreenshotId> {
    ScreenshotId::parse(raw.trim())
}

/// Parse a `x,y` coordinate pair given on the command line.
pub fn parse_point(raw: &str) -> Result<(f64, f64)> {
    let invalid = || MarkshotError::InvalidInput(format!("expected `x,y`, got `{raw}`"));
    let (x, y) = raw.split_once(',').ok_or_else(invalid)?;
    let x: f64 = x.trim().parse().map_err(|_| invalid())?;
    let y: f64 = y.trim().parse().map_err(|_| invalid())?;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use markshot_document::{ImageProcessor, PdfReader};

    fn services(dir: &Path) -> AppServices {
        let config = AppConfig {
            storage_dir: dir.join("store"),
            ..AppConfig::default()
        };
        AppServices::init(config).unwrap()
    }

    fn upload() -> Vec<u8> {
        ImageProcessor::from_rgba(RgbaImage::from_pixel(100, 60, Rgba([50, 60, 70, 255])))
            .to_png_bytes()
            .unwrap()
    }

    #[test]
    fn catalog_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let svc = services(dir.path());
            let record = svc.ingest_bytes(&upload()).unwrap();
            svc.add_annotation(record.id, AnnotationInput::new("Save", (1.0, 2.0), (30.0, 30.0)))
                .unwrap();
            record.id
        };

        let svc = services(dir.path());
        let record = svc.record(id).unwrap();
        assert_eq!(record.annotation_count(), 1);
        assert_eq!((record.display_width, record.display_height), (90, 54));
    }

    #[test]
    fn preview_export_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let svc = services(dir.path());
        let record = svc.ingest_bytes(&upload()).unwrap();

        let png = dir.path().join("preview.png");
        assert_eq!(svc.preview(record.id, &png).unwrap(), RenderStatus::Rendered);
        assert!(png.exists());

        let pdf = dir.path().join("out.pdf");
        let report = svc.export(&pdf, Some("Everything")).unwrap();
        assert_eq!(report.items.len(), 1);
        assert_eq!(PdfReader::from_bytes(&std::fs::read(&pdf).unwrap()).unwrap().page_count(), 1);

        let usage = svc.usage().unwrap();
        assert_eq!(usage.file_count, 2);

        let purge = svc.delete(record.id).unwrap();
        assert_eq!(purge.freed_bytes(), usage.total_bytes);
        assert!(svc.records().unwrap().is_empty());
        assert!(matches!(svc.record(record.id), Err(MarkshotError::NotFound(_))));
    }

    #[test]
    fn stored_rasters_copy_out_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let svc = services(dir.path());
        let record = svc.ingest_bytes(&upload()).unwrap();

        let out = dir.path().join("display.png");
        svc.export_raster(record.id, ArtifactKind::from_keyword("display").unwrap(), &out)
            .unwrap();
        let display = ImageProcessor::from_bytes(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!((display.width(), display.height()), (90, 54));

        let out = dir.path().join("original.png");
        let written = svc
            .export_raster(record.id, ArtifactKind::from_keyword("Original").unwrap(), &out)
            .unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), upload());
        assert_eq!(written, upload().len() as u64);

        std::fs::remove_file(dir.path().join("store").join(&record.filename)).unwrap();
        assert!(matches!(
            svc.export_raster(record.id, ArtifactKind::Original, &out),
            Err(MarkshotError::NotFound(_))
        ));
    }

    #[test]
    fn annotation_edits_round_through_the_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let svc = services(dir.path());
        let record = svc.ingest_bytes(&upload()).unwrap();
        let added = svc
            .add_annotation(record.id, AnnotationInput::new("a", (0.0, 0.0), (5.0, 5.0)))
            .unwrap();

        svc.update_annotation(record.id, added.id, AnnotationInput::new("b", (1.0, 1.0), (6.0, 6.0)))
            .unwrap();
        assert_eq!(svc.record(record.id).unwrap().annotations[0].text, "b");

        let removed = svc.remove_annotation(record.id, added.id).unwrap();
        assert_eq!(removed.id, added.id);
        assert!(matches!(
            svc.remove_annotation(record.id, added.id),
            Err(MarkshotError::NotFound(_))
        ));
    }

    #[test]
    fn points_parse_from_the_command_line() {
        assert_eq!(parse_point("10, 20.5").unwrap(), (10.0, 20.5));
        assert!(parse_point("10").is_err());
        assert!(parse_point("a,b").is_err());
        assert!(parse_screenshot_id("").is_err());
    }
}
