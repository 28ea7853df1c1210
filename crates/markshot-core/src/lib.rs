// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markshot — Core types, errors, and the display scale model shared by all crates.

pub mod config;
pub mod error;
pub mod scale;
pub mod types;

pub use config::AppConfig;
pub use error::MarkshotError;
pub use scale::scale;
pub use types::*;
