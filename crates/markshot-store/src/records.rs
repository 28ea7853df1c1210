// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Record source — read access to screenshot records and their annotations,
// plus an in-memory implementation with a JSON catalog snapshot.

use std::path::Path;
use std::sync::Mutex;

use markshot_core::error::{MarkshotError, Result};
use markshot_core::types::{ScreenshotId, ScreenshotRecord};
use tracing::{debug, info, instrument};

/// Read-only view of stored screenshot records.
pub trait RecordSource: Send + Sync {
    /// Look a record up by id. `Ok(None)` means no such record.
    fn get(&self, id: ScreenshotId) -> Result<Option<ScreenshotRecord>>;

    /// All records, oldest first.
    fn list(&self) -> Result<Vec<ScreenshotRecord>>;

    /// Like [`RecordSource::get`], turning absence into `NotFound`.
    fn require(&self, id: ScreenshotId) -> Result<ScreenshotRecord> {
        self.get(id)?
            .ok_or_else(|| MarkshotError::NotFound(format!("screenshot {id}")))
    }
}

/// Records held in memory in insertion order.
#[derive(Debug, Default)]
pub struct MemoryRecordSource {
    records: Mutex<Vec<ScreenshotRecord>>,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a source from existing records, preserving their order.
    pub fn from_records(records: Vec<ScreenshotRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Add a record. Ids must be unique.
    pub fn insert(&self, record: ScreenshotRecord) -> Result<()> {
        let mut records = self.records.lock().expect("record lock poisoned");
        if records.iter().any(|r| r.id == record.id) {
            return Err(MarkshotError::InvalidInput(format!(
                "screenshot {} already exists",
                record.id
            )));
        }
        debug!(id = %record.id, "Record inserted");
        records.push(record);
        Ok(())
    }

    /// Run `edit` against a stored record, e.g. to add or change annotations.
    pub fn update<T>(
        &self,
        id: ScreenshotId,
        edit: impl FnOnce(&mut ScreenshotRecord) -> Result<T>,
    ) -> Result<T> {
        let mut records = self.records.lock().expect("record lock poisoned");
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| MarkshotError::NotFound(format!("screenshot {id}")))?;
        edit(record)
    }

    /// Remove a record and return it.
    pub fn remove(&self, id: ScreenshotId) -> Result<ScreenshotRecord> {
        let mut records = self.records.lock().expect("record lock poisoned");
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| MarkshotError::NotFound(format!("screenshot {id}")))?;
        Ok(records.remove(index))
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("record lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -- Catalog snapshot -----------------------------------------------------

    /// Load a catalog written by [`MemoryRecordSource::save_catalog`]. A
    /// missing file yields an empty source.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_catalog(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No catalog yet, starting empty");
            return Ok(Self::new());
        }
        let raw = std::fs::read_to_string(path)?;
        let records: Vec<ScreenshotRecord> = serde_json::from_str(&raw)?;
        for record in &records {
            record.validate()?;
        }
        info!(records = records.len(), "Catalog loaded");
        Ok(Self::from_records(records))
    }

    /// Write every record to `path` as pretty-printed JSON.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save_catalog(&self, path: impl AsRef<Path>) -> Result<()> {
        let records = self.records.lock().expect("record lock poisoned");
        let json = serde_json::to_string_pretty(&*records)?;
        std::fs::write(path.as_ref(), json)?;
        debug!(records = records.len(), "Catalog saved");
        Ok(())
    }
}

impl RecordSource for MemoryRecordSource {
    fn get(&self, id: ScreenshotId) -> Result<Option<ScreenshotRecord>> {
        let records = self.records.lock().expect("record lock poisoned");
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<ScreenshotRecord>> {
        Ok(self.records.lock().expect("record lock poisoned").clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markshot_core::types::AnnotationInput;

    fn record(name: &str) -> ScreenshotRecord {
        ScreenshotRecord::new(name, 100, 100).unwrap()
    }

    #[test]
    fn get_and_require() {
        let source = MemoryRecordSource::new();
        let r = record("a.png");
        let id = r.id;
        source.insert(r).unwrap();

        assert_eq!(source.get(id).unwrap().unwrap().filename, "a.png");
        let missing = ScreenshotId::new();
        assert!(source.get(missing).unwrap().is_none());
        assert!(matches!(source.require(missing), Err(MarkshotError::NotFound(_))));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let source = MemoryRecordSource::new();
        let r = record("a.png");
        source.insert(r.clone()).unwrap();
        assert!(matches!(source.insert(r), Err(MarkshotError::InvalidInput(_))));
    }

    #[test]
    fn list_preserves_insertion_order() {
        let source = MemoryRecordSource::new();
        for name in ["c.png", "a.png", "b.png"] {
            source.insert(record(name)).unwrap();
        }
        let names: Vec<_> = source.list().unwrap().into_iter().map(|r| r.filename).collect();
        assert_eq!(names, ["c.png", "a.png", "b.png"]);
    }

    #[test]
    fn update_edits_annotations_in_place() {
        let source = MemoryRecordSource::new();
        let r = record("a.png");
        let id = r.id;
        source.insert(r).unwrap();

        let annotation_id = source
            .update(id, |r| {
                r.add_annotation(AnnotationInput::new("hi", (1.0, 2.0), (3.0, 4.0)))
                    .map(|a| a.id)
            })
            .unwrap();
        let stored = source.require(id).unwrap();
        assert_eq!(stored.annotations.len(), 1);
        assert_eq!(stored.annotations[0].id, annotation_id);

        source.update(id, |r| r.remove_annotation(annotation_id)).unwrap();
        assert!(source.require(id).unwrap().annotations.is_empty());
    }

    #[test]
    fn catalog_survives_a_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let source = MemoryRecordSource::new();
        let mut r = record("a.png");
        r.add_annotation(AnnotationInput::new("label", (5.0, 5.0), (9.0, 9.0)))
            .unwrap();
        source.insert(r.clone()).unwrap();
        source.save_catalog(&path).unwrap();

        let loaded = MemoryRecordSource::load_catalog(&path).unwrap();
        assert_eq!(loaded.list().unwrap(), vec![r]);
    }

    #[test]
    fn edited_catalog_with_bad_records_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let mut r = record("a.png");
        r.add_annotation(AnnotationInput::new("label", (5.0, 5.0), (9.0, 9.0)))
            .unwrap();
        let mut negative = r.clone();
        negative.annotations[0].x = -4.0;
        std::fs::write(&path, serde_json::to_string(&vec![negative]).unwrap()).unwrap();
        assert!(matches!(
            MemoryRecordSource::load_catalog(&path),
            Err(MarkshotError::InvalidInput(_))
        ));

        let mut resized = r;
        resized.display_height = 100;
        std::fs::write(&path, serde_json::to_string(&vec![resized]).unwrap()).unwrap();
        assert!(matches!(
            MemoryRecordSource::load_catalog(&path),
            Err(MarkshotError::InvalidInput(_))
        ));
    }

    #[test]
    fn missing_catalog_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = MemoryRecordSource::load_catalog(dir.path().join("none.json")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn remove_unknown_is_not_found() {
        let source = MemoryRecordSource::new();
        assert!(matches!(
            source.remove(ScreenshotId::new()),
            Err(MarkshotError::NotFound(_))
        ));
    }
}
