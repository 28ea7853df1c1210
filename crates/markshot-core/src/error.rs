// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Markshot.

use thiserror::Error;

/// Top-level error type for all Markshot operations.
///
/// The first four variants are the failure taxonomy callers branch on:
/// `InvalidInput` is rejected before any work starts, `NotFound` and
/// `RenderFailure` are recoverable per item, and `AssemblyFailure` aborts a
/// whole document build.
#[derive(Debug, Error)]
pub enum MarkshotError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("render failed: {0}")]
    RenderFailure(String),

    #[error("document assembly failed: {0}")]
    AssemblyFailure(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MarkshotError>;
