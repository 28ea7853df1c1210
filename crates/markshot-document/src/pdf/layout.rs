// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document layout — turns an ordered list of export items into a flat list of
// blocks (text lines, spacers, images, page breaks) and flows those blocks onto
// pages. Nothing here touches the PDF backend, so the structure of a document
// can be inspected without serialising it.

use chrono::NaiveDateTime;
use image::RgbImage;
use markshot_core::types::{AnnotationRecord, ScreenshotRecord};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::image::ImageProcessor;

/// Margin on every side of the page, in points.
pub const MARGIN_PT: f32 = 40.0;
/// Width screenshots are scaled to (7 inches).
pub const IMAGE_WIDTH_PT: f32 = 7.0 * 72.0;
/// Gap after the title and after the summary.
pub const SECTION_GAP_PT: f32 = 20.0;
/// Gap between a screenshot and its annotation list.
pub const IMAGE_GAP_PT: f32 = 10.0;

/// One screenshot to place in the document.
#[derive(Debug, Clone)]
pub struct ExportItem {
    /// Metadata and the annotations to list.
    pub record: ScreenshotRecord,
    /// The rendered raster, or `None` if nothing could be rendered.
    pub image: Option<Vec<u8>>,
}

impl ExportItem {
    pub fn new(record: ScreenshotRecord, image: Option<Vec<u8>>) -> Self {
        Self { record, image }
    }
}

/// Typographic role of a line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Title,
    Heading,
    Info,
    Annotation,
}

impl TextStyle {
    /// Font size in points.
    pub fn size(self) -> f32 {
        match self {
            Self::Title => 18.0,
            Self::Heading | Self::Info => 10.0,
            Self::Annotation => 9.0,
        }
    }

    /// Baseline-to-baseline distance in points.
    pub fn leading(self) -> f32 {
        self.size() * 1.2
    }

    /// Left indent in points.
    pub fn indent(self) -> f32 {
        match self {
            Self::Annotation => 20.0,
            _ => 0.0,
        }
    }

    /// Space after a paragraph in this style.
    pub fn space_after(self) -> f32 {
        match self {
            Self::Title => 30.0,
            Self::Heading | Self::Info => 12.0,
            Self::Annotation => 6.0,
        }
    }

    /// Fill colour as RGB fractions.
    pub fn color(self) -> (f32, f32, f32) {
        match self {
            Self::Annotation => (1.0, 0.0, 0.0),
            _ => (0.0, 0.0, 0.0),
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, Self::Title | Self::Heading)
    }

    /// Rough characters-per-line for a given width, assuming an average
    /// Helvetica glyph width of half the font size.
    fn chars_per_line(self, width_pt: f32) -> usize {
        ((width_pt - self.indent()) / (0.5 * self.size())).max(1.0) as usize
    }
}

/// A unit of content in reading order.
#[derive(Debug, Clone)]
pub enum Block {
    Line {
        text: String,
        style: TextStyle,
        centered: bool,
    },
    Spacer(f32),
    Image {
        raster: RgbImage,
        width_pt: f32,
        height_pt: f32,
    },
    PageBreak,
}

impl Block {
    /// Vertical space the block occupies.
    pub fn height(&self) -> f32 {
        match self {
            Self::Line { style, .. } => style.leading(),
            Self::Spacer(h) => *h,
            Self::Image { height_pt, .. } => *height_pt,
            Self::PageBreak => 0.0,
        }
    }
}

/// A block placed on a page: its index in [`DocumentPlan::blocks`] and its
/// distance from the top of the usable area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub block: usize,
    pub top: f32,
}

/// The laid-out content of a document before pagination.
#[derive(Debug, Clone)]
pub struct DocumentPlan {
    pub title: String,
    pub blocks: Vec<Block>,
    /// Number of per-item content sections.
    pub sections: usize,
    pub total_annotations: usize,
    /// Items whose raster was replaced by a placeholder line.
    pub placeholders: usize,
}

/// Default title when the caller does not supply one.
pub fn default_title(generated_at: NaiveDateTime) -> String {
    format!(
        "Screenshot Collection - {}",
        generated_at.format("%Y-%m-%d %H:%M")
    )
}

/// One line of the per-item annotation list, with 1-based numbering and
/// coordinates truncated toward zero.
pub fn annotation_line(index: usize, annotation: &AnnotationRecord) -> String {
    format!(
        "{}. \"{}\" Position: ({}, {}) → ({}, {})",
        index,
        annotation.text,
        annotation.x.trunc() as i64,
        annotation.y.trunc() as i64,
        annotation.pointer_x.trunc() as i64,
        annotation.pointer_y.trunc() as i64,
    )
}

impl DocumentPlan {
    /// Lay out `items` in the given order.
    ///
    /// `usable` is the page area inside the margins, in points. Item rasters
    /// are decoded in parallel; everything else is sequential.
    pub fn build(
        items: &[ExportItem],
        title: Option<&str>,
        generated_at: NaiveDateTime,
        usable: (f32, f32),
    ) -> Self {
        let (usable_w, _) = usable;
        let title = match title.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => default_title(generated_at),
        };
        let total_annotations: usize = items.iter().map(|i| i.record.annotation_count()).sum();

        let mut plan = Self {
            title: title.clone(),
            blocks: Vec::new(),
            sections: 0,
            total_annotations,
            placeholders: 0,
        };

        plan.push_paragraph(&title, TextStyle::Title, true, usable_w);
        plan.blocks.push(Block::Spacer(SECTION_GAP_PT));

        plan.push_lines(
            &[
                ("Collection Summary:".to_string(), TextStyle::Heading),
                (format!("Total Screenshots: {}", items.len()), TextStyle::Info),
                (
                    format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
                    TextStyle::Info,
                ),
                (format!("Total Annotations: {}", total_annotations), TextStyle::Info),
            ],
            usable_w,
        );
        plan.blocks.push(Block::Spacer(SECTION_GAP_PT));

        let rasters: Vec<Result<RgbImage, String>> = items.par_iter().map(decode_raster).collect();

        for (index, (item, raster)) in items.iter().zip(rasters).enumerate() {
            plan.push_item(index + 1, item, raster, usable);
            if index + 1 < items.len() {
                plan.blocks.push(Block::PageBreak);
            }
        }

        debug!(
            blocks = plan.blocks.len(),
            sections = plan.sections,
            page_breaks = plan.page_breaks(),
            "Document planned"
        );
        plan
    }

    fn push_item(
        &mut self,
        number: usize,
        item: &ExportItem,
        raster: Result<RgbImage, String>,
        usable: (f32, f32),
    ) {
        let record = &item.record;
        self.sections += 1;

        self.push_lines(
            &[
                (format!("Screenshot #{}", number), TextStyle::Heading),
                (
                    format!("Created: {}", record.created_at.format("%Y-%m-%d %H:%M:%S")),
                    TextStyle::Info,
                ),
                (
                    format!(
                        "Original Size: {} × {} pixels",
                        record.original_width, record.original_height
                    ),
                    TextStyle::Info,
                ),
                (
                    format!(
                        "Display Size: {} × {} pixels",
                        record.display_width, record.display_height
                    ),
                    TextStyle::Info,
                ),
                (format!("Annotations: {}", record.annotation_count()), TextStyle::Info),
            ],
            usable.0,
        );

        match raster {
            Ok(raster) => {
                let (width_pt, height_pt) = fit_image(raster.width(), raster.height(), usable);
                self.blocks.push(Block::Image {
                    raster,
                    width_pt,
                    height_pt,
                });
            }
            Err(reason) => {
                warn!(id = %record.id, reason = %reason, "Screenshot image replaced by placeholder");
                self.placeholders += 1;
                self.push_paragraph(
                    &format!("[Image unavailable: {}]", reason),
                    TextStyle::Info,
                    false,
                    usable.0,
                );
            }
        }
        self.blocks.push(Block::Spacer(IMAGE_GAP_PT));

        if !record.annotations.is_empty() {
            self.push_paragraph("Annotations:", TextStyle::Heading, false, usable.0);
            for (j, annotation) in record.annotations.iter().enumerate() {
                self.push_paragraph(
                    &annotation_line(j + 1, annotation),
                    TextStyle::Annotation,
                    false,
                    usable.0,
                );
            }
        }
    }

    /// Push consecutive single-line paragraphs that share one trailing gap.
    fn push_lines(&mut self, lines: &[(String, TextStyle)], width_pt: f32) {
        let mut last_style = None;
        for (text, style) in lines {
            for line in wrap_text(text, style.chars_per_line(width_pt)) {
                self.blocks.push(Block::Line {
                    text: line,
                    style: *style,
                    centered: false,
                });
            }
            last_style = Some(*style);
        }
        if let Some(style) = last_style {
            self.blocks.push(Block::Spacer(style.space_after()));
        }
    }

    /// Push a wrapped paragraph followed by its style's trailing gap.
    fn push_paragraph(&mut self, text: &str, style: TextStyle, centered: bool, width_pt: f32) {
        for line in wrap_text(text, style.chars_per_line(width_pt)) {
            self.blocks.push(Block::Line {
                text: line,
                style,
                centered,
            });
        }
        self.blocks.push(Block::Spacer(style.space_after()));
    }

    /// Explicit page breaks between items.
    pub fn page_breaks(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::PageBreak))
            .count()
    }

    /// Flow blocks onto pages of `usable_height` points.
    ///
    /// Besides explicit page breaks, a block that does not fit in the space
    /// left on a page starts a continuation page. Spacers never carry over
    /// to the top of a new page.
    pub fn paginate(&self, usable_height: f32) -> Vec<Vec<Placement>> {
        let mut pages: Vec<Vec<Placement>> = vec![Vec::new()];
        let mut cursor = 0.0f32;

        for (index, block) in self.blocks.iter().enumerate() {
            match block {
                Block::PageBreak => {
                    pages.push(Vec::new());
                    cursor = 0.0;
                }
                Block::Spacer(h) => {
                    // Clamped, so the next block decides whether a new page starts.
                    cursor = (cursor + h).min(usable_height);
                }
                _ => {
                    let h = block.height();
                    let page_has_content = pages.last().is_some_and(|p| !p.is_empty());
                    if cursor + h > usable_height && page_has_content {
                        pages.push(Vec::new());
                        cursor = 0.0;
                    }
                    if let Some(page) = pages.last_mut() {
                        page.push(Placement {
                            block: index,
                            top: cursor,
                        });
                    }
                    cursor += h;
                }
            }
        }

        pages
    }
}

/// Decode an item's raster for embedding, or explain why it cannot be used.
fn decode_raster(item: &ExportItem) -> Result<RgbImage, String> {
    let bytes = item
        .image
        .as_deref()
        .ok_or_else(|| "no rendered image".to_string())?;
    ImageProcessor::from_bytes(bytes)
        .map(|processor| processor.into_rgb8())
        .map_err(|err| err.to_string())
}

/// Scale an image to [`IMAGE_WIDTH_PT`] (never wider than the usable width),
/// preserving aspect ratio, and shrink further if it would overflow a page.
pub fn fit_image(width_px: u32, height_px: u32, usable: (f32, f32)) -> (f32, f32) {
    let (usable_w, usable_h) = usable;
    let aspect = height_px as f32 / width_px.max(1) as f32;
    let mut width = IMAGE_WIDTH_PT.min(usable_w);
    let mut height = width * aspect;
    if height > usable_h {
        height = usable_h;
        width = height / aspect;
    }
    (width, height)
}

// -- Text wrapping helper -----------------------------------------------------

/// Wrap a string so that no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then performs simple word-wrap within
/// each paragraph. Words longer than `max_width` are force-broken on
/// character boundaries.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        let mut current_len = 0usize;

        for word in words {
            let word_len = word.chars().count();
            if word_len > max_width {
                if !current_line.is_empty() {
                    result.push(std::mem::take(&mut current_line));
                }
                let chars: Vec<char> = word.chars().collect();
                let mut chunks = chars.chunks(max_width).peekable();
                while let Some(chunk) = chunks.next() {
                    let piece: String = chunk.iter().collect();
                    if chunks.peek().is_some() {
                        result.push(piece);
                    } else {
                        current_len = chunk.len();
                        current_line = piece;
                    }
                }
            } else if current_line.is_empty() {
                current_line.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
                current_len += 1 + word_len;
            } else {
                result.push(std::mem::replace(&mut current_line, word.to_string()));
                current_len = word_len;
            }
        }

        if !current_line.is_empty() {
            result.push(current_line);
        }
    }

    result
}
