// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// markshot-store — Storage seams for Markshot.
//
// Defines the artifact store and record source interfaces the rendering core
// reads through, filesystem and in-memory implementations of both, and the
// storage accountant that measures how many bytes a set of records occupies.

pub mod artifact;
pub mod cleanup;
pub mod records;
pub mod usage;

pub use artifact::{ArtifactStore, FsArtifactStore, MemoryArtifactStore};
pub use cleanup::{PurgeReport, purge_record};
pub use records::{MemoryRecordSource, RecordSource};
pub use usage::{StorageAccountant, UsageReport};
