// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Storage accountant — measures the byte footprint of a set of records'
// backing rasters so callers can decide when to reclaim space and report how
// much a cleanup freed.

use markshot_core::error::Result;
use markshot_core::types::{ArtifactKind, ScreenshotRecord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Aggregate storage usage for a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub total_bytes: u64,
    /// `total_bytes` in MiB, rounded to two decimals.
    pub total_mb: f64,
    /// Artifacts that were actually present.
    pub file_count: usize,
    /// Records examined, whether or not any of their files exist.
    pub record_count: usize,
}

impl UsageReport {
    fn from_totals(total_bytes: u64, file_count: usize, record_count: usize) -> Self {
        Self {
            total_bytes,
            total_mb: round_mb(total_bytes),
            file_count,
            record_count,
        }
    }

    /// Bytes released between an earlier report and this one.
    pub fn freed_since(&self, before: &UsageReport) -> u64 {
        before.total_bytes.saturating_sub(self.total_bytes)
    }
}

fn round_mb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

/// Sums artifact sizes through an [`ArtifactStore`](crate::ArtifactStore).
pub struct StorageAccountant<'a> {
    store: &'a dyn crate::ArtifactStore,
}

impl<'a> StorageAccountant<'a> {
    pub fn new(store: &'a dyn crate::ArtifactStore) -> Self {
        Self { store }
    }

    /// Measure every record's original and display artifacts.
    ///
    /// Each artifact is sized independently; a missing one contributes
    /// nothing and is not an error, so partially cleaned records are counted
    /// correctly. Lookups run in parallel across records.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn usage(&self, records: &[ScreenshotRecord]) -> Result<UsageReport> {
        let per_record: Vec<(u64, usize)> = records
            .par_iter()
            .map(|record| self.record_footprint(record))
            .collect::<Result<_>>()?;

        let (total_bytes, file_count) = per_record
            .iter()
            .fold((0u64, 0usize), |(bytes, files), (b, f)| (bytes + b, files + f));

        let report = UsageReport::from_totals(total_bytes, file_count, records.len());
        info!(
            total_bytes = report.total_bytes,
            file_count = report.file_count,
            record_count = report.record_count,
            "Storage usage measured"
        );
        Ok(report)
    }

    fn record_footprint(&self, record: &ScreenshotRecord) -> Result<(u64, usize)> {
        let mut bytes = 0u64;
        let mut files = 0usize;
        for kind in [ArtifactKind::Original, ArtifactKind::Display] {
            let key = record.artifact_key(kind);
            match self.store.size(&key)? {
                Some(size) => {
                    bytes += size;
                    files += 1;
                }
                None => debug!(id = %record.id, ?kind, key = %key, "Artifact absent, skipped"),
            }
        }
        Ok((bytes, files))
    }
}
