// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — laying out screenshot collections and serialising them.

pub mod layout;
pub mod reader;
pub mod writer;

pub use layout::{DocumentPlan, ExportItem, TextStyle};
pub use reader::PdfReader;
pub use writer::{AssembledDocument, DocumentAssembler};
