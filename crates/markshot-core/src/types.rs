// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: screenshot records, their annotations, and the artifact
// keys that back them.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MarkshotError, Result};
use crate::scale::scale;

/// Suffix appended to the original artifact's stem to name the display raster.
pub const DISPLAY_SUFFIX: &str = "_display.png";

/// Unique identifier for a screenshot record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenshotId(pub Uuid);

impl ScreenshotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id supplied by a caller. Empty or malformed ids are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        parse_uuid(raw, "screenshot").map(Self)
    }
}

impl Default for ScreenshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScreenshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationId(pub Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Result<Self> {
        parse_uuid(raw, "annotation").map(Self)
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MarkshotError::InvalidInput(format!("{what} id is empty")));
    }
    Uuid::parse_str(trimmed)
        .map_err(|err| MarkshotError::InvalidInput(format!("{what} id {trimmed:?}: {err}")))
}

/// Which stored raster of a record to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// The raster exactly as ingested.
    Original,
    /// The 90% raster every annotation coordinate refers to.
    Display,
}

impl ArtifactKind {
    /// Parse the `original` / `display` keywords.
    pub fn from_keyword(keyword: &str) -> Result<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "display" => Ok(Self::Display),
            other => Err(MarkshotError::InvalidInput(format!(
                "unknown artifact kind {other:?} (use 'original' or 'display')"
            ))),
        }
    }
}

/// Derive the display artifact key from an original artifact key.
///
/// `shot.jpeg` becomes `shot_display.png`; the display raster is always PNG.
pub fn display_key(original_key: &str) -> String {
    let stem = Path::new(original_key)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(original_key);
    format!("{stem}{DISPLAY_SUFFIX}")
}

/// Annotation payload as supplied by a caller, before it becomes a record.
///
/// This is the single place untyped input is checked: once an
/// `AnnotationInput` has been validated, the renderer and assembler trust it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationInput {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub pointer_x: f64,
    pub pointer_y: f64,
}

impl AnnotationInput {
    pub fn new(text: impl Into<String>, anchor: (f64, f64), pointer: (f64, f64)) -> Self {
        Self {
            text: text.into(),
            x: anchor.0,
            y: anchor.1,
            pointer_x: pointer.0,
            pointer_y: pointer.1,
        }
    }

    /// Reject coordinates that are NaN, infinite, or negative.
    pub fn validate(&self) -> Result<()> {
        match coordinate_problem(self.x, self.y, self.pointer_x, self.pointer_y) {
            Some(problem) => Err(MarkshotError::InvalidInput(format!("annotation {problem}"))),
            None => Ok(()),
        }
    }
}

fn coordinate_problem(x: f64, y: f64, pointer_x: f64, pointer_y: f64) -> Option<String> {
    let fields = [("x", x), ("y", y), ("pointer_x", pointer_x), ("pointer_y", pointer_y)];
    fields.into_iter().find_map(|(name, value)| {
        if !value.is_finite() {
            Some(format!("{name} is not a finite number"))
        } else if value < 0.0 {
            Some(format!("{name} is negative ({value})"))
        } else {
            None
        }
    })
}

/// A label plus a pointer arrow, positioned in the owning screenshot's
/// display coordinate space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: AnnotationId,
    pub screenshot_id: ScreenshotId,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub pointer_x: f64,
    pub pointer_y: f64,
    pub created_at: DateTime<Utc>,
}

impl AnnotationRecord {
    /// Validate `input` and build a record owned by `screenshot_id`.
    pub fn new(screenshot_id: ScreenshotId, input: AnnotationInput) -> Result<Self> {
        input.validate()?;
        Ok(Self {
            id: AnnotationId::new(),
            screenshot_id,
            text: input.text,
            x: input.x,
            y: input.y,
            pointer_x: input.pointer_x,
            pointer_y: input.pointer_y,
            created_at: Utc::now(),
        })
    }

    /// Label anchor point.
    pub fn anchor(&self) -> (f32, f32) {
        (self.x as f32, self.y as f32)
    }

    /// Arrow target point.
    pub fn pointer(&self) -> (f32, f32) {
        (self.pointer_x as f32, self.pointer_y as f32)
    }
}

/// A captured image and everything drawn on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotRecord {
    pub id: ScreenshotId,
    /// Artifact key of the original-resolution raster.
    pub filename: String,
    pub original_width: u32,
    pub original_height: u32,
    /// Pinned at creation; never recomputed.
    pub display_width: u32,
    pub display_height: u32,
    pub created_at: DateTime<Utc>,
    /// Insertion order is listing and drawing order.
    pub annotations: Vec<AnnotationRecord>,
}

impl ScreenshotRecord {
    /// Create a record for an original raster, computing its display size once.
    pub fn new(filename: impl Into<String>, original_width: u32, original_height: u32) -> Result<Self> {
        Self::with_id(ScreenshotId::new(), filename, original_width, original_height)
    }

    /// Like [`ScreenshotRecord::new`] with a caller-chosen id.
    pub fn with_id(
        id: ScreenshotId,
        filename: impl Into<String>,
        original_width: u32,
        original_height: u32,
    ) -> Result<Self> {
        let filename = filename.into();
        if filename.trim().is_empty() {
            return Err(MarkshotError::InvalidInput("artifact filename is empty".into()));
        }
        let (display_width, display_height) = scale(original_width, original_height)?;
        Ok(Self {
            id,
            filename,
            original_width,
            original_height,
            display_width,
            display_height,
            created_at: Utc::now(),
            annotations: Vec::new(),
        })
    }

    /// Check a record that did not come through [`ScreenshotRecord::new`],
    /// such as one read back from a catalog file.
    pub fn validate(&self) -> Result<()> {
        if self.filename.trim().is_empty() {
            return Err(MarkshotError::InvalidInput(format!(
                "record {}: artifact filename is empty",
                self.id
            )));
        }
        let expected = scale(self.original_width, self.original_height).map_err(|_| {
            MarkshotError::InvalidInput(format!(
                "record {}: original size {}x{} cannot be scaled",
                self.id, self.original_width, self.original_height
            ))
        })?;
        if expected != (self.display_width, self.display_height) {
            return Err(MarkshotError::InvalidInput(format!(
                "record {}: display size {}x{} does not match {}x{} scaled from the original",
                self.id, self.display_width, self.display_height, expected.0, expected.1
            )));
        }
        for annotation in &self.annotations {
            if annotation.screenshot_id != self.id {
                return Err(MarkshotError::InvalidInput(format!(
                    "record {}: annotation {} belongs to {}",
                    self.id, annotation.id, annotation.screenshot_id
                )));
            }
            let problem = coordinate_problem(
                annotation.x,
                annotation.y,
                annotation.pointer_x,
                annotation.pointer_y,
            );
            if let Some(problem) = problem {
                return Err(MarkshotError::InvalidInput(format!(
                    "record {}: annotation {} {problem}",
                    self.id, annotation.id
                )));
            }
        }
        Ok(())
    }

    /// Artifact key of the display-resolution raster.
    pub fn display_filename(&self) -> String {
        display_key(&self.filename)
    }

    /// Artifact key for either stored raster.
    pub fn artifact_key(&self, kind: ArtifactKind) -> String {
        match kind {
            ArtifactKind::Original => self.filename.clone(),
            ArtifactKind::Display => self.display_filename(),
        }
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    /// Append a new annotation and return a reference to it.
    pub fn add_annotation(&mut self, input: AnnotationInput) -> Result<&AnnotationRecord> {
        let record = AnnotationRecord::new(self.id, input)?;
        self.annotations.push(record);
        Ok(&self.annotations[self.annotations.len() - 1])
    }

    /// Replace the text and coordinates of an existing annotation in place.
    ///
    /// The annotation keeps its id, its creation time, and its position in
    /// the drawing order.
    pub fn update_annotation(&mut self, id: AnnotationId, input: AnnotationInput) -> Result<()> {
        input.validate()?;
        let annotation = self
            .annotations
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| MarkshotError::NotFound(format!("annotation {id}")))?;
        annotation.text = input.text;
        annotation.x = input.x;
        annotation.y = input.y;
        annotation.pointer_x = input.pointer_x;
        annotation.pointer_y = input.pointer_y;
        Ok(())
    }

    /// Remove an annotation by id, returning it.
    pub fn remove_annotation(&mut self, id: AnnotationId) -> Result<AnnotationRecord> {
        let index = self
            .annotations
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| MarkshotError::NotFound(format!("annotation {id}")))?;
        Ok(self.annotations.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ScreenshotRecord {
        ScreenshotRecord::new("abc.png", 1200, 900).unwrap()
    }

    #[test]
    fn new_record_pins_display_size() {
        let r = record();
        assert_eq!((r.display_width, r.display_height), (1080, 810));
        assert!(r.annotations.is_empty());
    }

    #[test]
    fn stored_records_are_revalidated() {
        let mut r = record();
        r.add_annotation(AnnotationInput::new("ok", (1.0, 2.0), (3.0, 4.0))).unwrap();
        assert!(r.validate().is_ok());

        let mut resized = r.clone();
        resized.display_width = 1200;
        assert!(matches!(resized.validate(), Err(MarkshotError::InvalidInput(_))));

        let mut negative = r.clone();
        negative.annotations[0].pointer_y = -1.0;
        assert!(matches!(negative.validate(), Err(MarkshotError::InvalidInput(_))));

        let mut foreign = r.clone();
        foreign.annotations[0].screenshot_id = ScreenshotId::new();
        assert!(matches!(foreign.validate(), Err(MarkshotError::InvalidInput(_))));

        let mut zero = r;
        zero.original_width = 0;
        assert!(zero.validate().is_err());
    }

    #[test]
    fn new_record_rejects_bad_input() {
        assert!(matches!(
            ScreenshotRecord::new("", 10, 10),
            Err(MarkshotError::InvalidInput(_))
        ));
        assert!(matches!(
            ScreenshotRecord::new("a.png", 0, 10),
            Err(MarkshotError::InvalidInput(_))
        ));
    }

    #[test]
    fn display_key_replaces_extension() {
        assert_eq!(display_key("shot.jpeg"), "shot_display.png");
        assert_eq!(display_key("noext"), "noext_display.png");
        let r = record();
        assert_eq!(r.artifact_key(ArtifactKind::Original), "abc.png");
        assert_eq!(r.artifact_key(ArtifactKind::Display), "abc_display.png");
    }

    #[test]
    fn artifact_kind_keywords() {
        assert_eq!(ArtifactKind::from_keyword("Display").unwrap(), ArtifactKind::Display);
        assert_eq!(ArtifactKind::from_keyword("original").unwrap(), ArtifactKind::Original);
        assert!(ArtifactKind::from_keyword("thumb").is_err());
    }

    #[test]
    fn ids_reject_empty_and_garbage() {
        assert!(matches!(ScreenshotId::parse(""), Err(MarkshotError::InvalidInput(_))));
        assert!(matches!(ScreenshotId::parse("   "), Err(MarkshotError::InvalidInput(_))));
        assert!(AnnotationId::parse("not-a-uuid").is_err());
        let id = ScreenshotId::new();
        assert_eq!(ScreenshotId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn annotation_input_validation() {
        assert!(AnnotationInput::new("ok", (1.0, 2.0), (3.0, 4.0)).validate().is_ok());
        assert!(AnnotationInput::new("", (0.0, 0.0), (0.0, 0.0)).validate().is_ok());
        assert!(AnnotationInput::new("nan", (f64::NAN, 0.0), (0.0, 0.0)).validate().is_err());
        assert!(AnnotationInput::new("inf", (0.0, 0.0), (f64::INFINITY, 0.0)).validate().is_err());
        assert!(AnnotationInput::new("neg", (0.0, -1.0), (0.0, 0.0)).validate().is_err());
    }

    #[test]
    fn annotations_keep_insertion_order_and_edit_in_place() {
        let mut r = record();
        let first = r
            .add_annotation(AnnotationInput::new("one", (1.0, 1.0), (2.0, 2.0)))
            .unwrap()
            .id;
        r.add_annotation(AnnotationInput::new("two", (3.0, 3.0), (4.0, 4.0)))
            .unwrap();
        assert_eq!(r.annotation_count(), 2);
        assert_eq!(r.annotations[0].screenshot_id, r.id);

        let created = r.annotations[0].created_at;
        r.update_annotation(first, AnnotationInput::new("uno", (5.0, 6.0), (7.0, 8.0)))
            .unwrap();
        assert_eq!(r.annotations[0].id, first);
        assert_eq!(r.annotations[0].text, "uno");
        assert_eq!(r.annotations[0].created_at, created);
        assert_eq!(r.annotations[1].text, "two");

        let removed = r.remove_annotation(first).unwrap();
        assert_eq!(removed.text, "uno");
        assert_eq!(r.annotations.len(), 1);
        assert_eq!(r.annotations[0].text, "two");
    }

    #[test]
    fn editing_unknown_annotation_is_not_found() {
        let mut r = record();
        let missing = AnnotationId::new();
        assert!(matches!(
            r.remove_annotation(missing),
            Err(MarkshotError::NotFound(_))
        ));
        assert!(matches!(
            r.update_annotation(missing, AnnotationInput::new("x", (0.0, 0.0), (0.0, 0.0))),
            Err(MarkshotError::NotFound(_))
        ));
    }

    #[test]
    fn degenerate_annotation_is_accepted() {
        let mut r = record();
        r.add_annotation(AnnotationInput::new("dot", (10.0, 10.0), (10.0, 10.0)))
            .unwrap();
        assert_eq!(r.annotations[0].anchor(), r.annotations[0].pointer());
    }
}
