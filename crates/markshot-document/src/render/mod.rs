// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render module — burns annotations (line, arrowhead, marker dot, label box)
// into display-resolution rasters.

pub mod annotate;
pub mod font;
pub mod geometry;

pub use annotate::{AnnotationRenderer, ItemRender, RenderOutcome, RenderStatus};
pub use font::LabelFont;
