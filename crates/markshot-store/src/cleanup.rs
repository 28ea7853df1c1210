// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Record cleanup — delete a record's rasters and report the bytes freed.

use markshot_core::error::Result;
use markshot_core::types::{ArtifactKind, ScreenshotRecord};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::usage::{StorageAccountant, UsageReport};
use crate::ArtifactStore;

/// Outcome of deleting one record's artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PurgeReport {
    pub before: UsageReport,
    pub after: UsageReport,
    /// Artifacts that existed and were removed.
    pub removed_files: usize,
}

impl PurgeReport {
    pub fn freed_bytes(&self) -> u64 {
        self.after.freed_since(&self.before)
    }
}

/// Remove both the original and display rasters of `record`.
///
/// Already-missing artifacts are tolerated. Usage is measured the same way
/// before and after, so the freed byte count is exact.
#[instrument(skip_all, fields(id = %record.id))]
pub fn purge_record(store: &dyn ArtifactStore, record: &ScreenshotRecord) -> Result<PurgeReport> {
    let accountant = StorageAccountant::new(store);
    let records = std::slice::from_ref(record);
    let before = accountant.usage(records)?;

    let mut removed_files = 0;
    for kind in [ArtifactKind::Original, ArtifactKind::Display] {
        let key = record.artifact_key(kind);
        if store.remove(&key)? {
            removed_files += 1;
        } else {
            warn!(?kind, key = %key, "Artifact already missing during purge");
        }
    }

    let after = accountant.usage(records)?;
    let report = PurgeReport {
        before,
        after,
        removed_files,
    };
    info!(
        removed_files,
        freed_bytes = report.freed_bytes(),
        "Record artifacts purged"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryArtifactStore;

    #[test]
    fn purge_frees_both_files() {
        let store = MemoryArtifactStore::new();
        let record = ScreenshotRecord::new("a.png", 10, 10).unwrap();
        store.write(&record.filename, &[1u8; 300]).unwrap();
        store.write(&record.display_filename(), &[1u8; 200]).unwrap();

        let report = purge_record(&store, &record).unwrap();
        assert_eq!(report.removed_files, 2);
        assert_eq!(report.freed_bytes(), 500);
        assert_eq!(report.after.file_count, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn purge_tolerates_partial_state() {
        let store = MemoryArtifactStore::new();
        let record = ScreenshotRecord::new("a.png", 10, 10).unwrap();
        store.write(&record.display_filename(), &[1u8; 64]).unwrap();

        let report = purge_record(&store, &record).unwrap();
        assert_eq!(report.removed_files, 1);
        assert_eq!(report.before.file_count, 1);
        assert_eq!(report.freed_bytes(), 64);
    }
}
