// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler — serialises a paginated screenshot collection to PDF
// using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use chrono::{Local, NaiveDateTime};
use markshot_core::error::{MarkshotError, Result};
use printpdf::{
    BuiltinFont, Color, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt,
    RawImage, RawImageData, RawImageFormat, Rgb, TextItem, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use super::layout::{Block, DocumentPlan, ExportItem, MARGIN_PT, Placement, TextStyle};
use super::reader::PdfReader;

/// A finished document plus the structural facts callers report on.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub bytes: Vec<u8>,
    pub title: String,
    pub page_count: usize,
    /// One per export item.
    pub sections: usize,
    /// Explicit breaks between items; continuation pages are not counted.
    pub page_breaks: usize,
    pub total_annotations: usize,
    /// Items whose image was replaced by a placeholder.
    pub placeholders: usize,
}

/// A4 portrait, in millimetres.
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;

/// Builds the screenshot collection PDF on A4 pages.
#[derive(Debug, Default)]
pub struct DocumentAssembler {
    /// Fixed generation time; `None` means "now".
    generated_at: Option<NaiveDateTime>,
}

impl DocumentAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the timestamp shown in the default title and the summary.
    pub fn with_generated_at(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        (Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM))
    }

    /// Paper dimensions in points.
    fn page_dimensions_pt(&self) -> (f32, f32) {
        let (w, h) = self.page_dimensions();
        (w.into_pt().0, h.into_pt().0)
    }

    /// Usable area inside the margins, in points.
    pub fn usable_area(&self) -> (f32, f32) {
        let (w, h) = self.page_dimensions_pt();
        (w - 2.0 * MARGIN_PT, h - 2.0 * MARGIN_PT)
    }

    /// Assemble `items`, in order, into one PDF.
    ///
    /// Per-item problems (an unreadable raster) become placeholders; only a
    /// failure to produce a valid document as a whole is an error, and then
    /// no bytes are returned at all.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub fn assemble(&self, items: &[ExportItem], title: Option<&str>) -> Result<AssembledDocument> {
        let generated_at = self
            .generated_at
            .unwrap_or_else(|| Local::now().naive_local());
        let usable = self.usable_area();
        let plan = DocumentPlan::build(items, title, generated_at, usable);
        let pages = plan.paginate(usable.1);

        info!(
            title = %plan.title,
            pages = pages.len(),
            "Assembling screenshot document"
        );

        let (page_w, page_h) = self.page_dimensions();
        let page_h_pt = page_h.into_pt().0;

        let mut doc = PdfDocument::new(&plan.title);
        let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(pages.len());
        for placements in &pages {
            let ops = page_ops(&mut doc, &plan, placements, usable, page_h_pt);
            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }
        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(warnings = warnings.len(), "PDF serialiser reported warnings");
        }

        verify(&bytes, pages.len())?;

        let document = AssembledDocument {
            bytes,
            title: plan.title.clone(),
            page_count: pages.len(),
            sections: plan.sections,
            page_breaks: plan.page_breaks(),
            total_annotations: plan.total_annotations,
            placeholders: plan.placeholders,
        };
        if document.placeholders > 0 {
            warn!(
                placeholders = document.placeholders,
                "Document assembled with missing images"
            );
        }
        debug!(
            bytes = document.bytes.len(),
            sections = document.sections,
            page_breaks = document.page_breaks,
            "Document assembled"
        );
        Ok(document)
    }
}

/// Re-read the serialised bytes and check the page tree before handing the
/// document out.
fn verify(bytes: &[u8], expected_pages: usize) -> Result<()> {
    if bytes.is_empty() {
        return Err(MarkshotError::AssemblyFailure(
            "PDF serialiser produced no output".into(),
        ));
    }
    let reader = PdfReader::from_bytes(bytes).map_err(|err| {
        MarkshotError::AssemblyFailure(format!("generated PDF does not parse: {err}"))
    })?;
    let found = reader.page_count();
    if found != expected_pages {
        return Err(MarkshotError::AssemblyFailure(format!(
            "generated PDF has {found} pages, expected {expected_pages}"
        )));
    }
    Ok(())
}

/// Drawing operations for one page.
fn page_ops(
    doc: &mut PdfDocument,
    plan: &DocumentPlan,
    placements: &[Placement],
    usable: (f32, f32),
    page_h_pt: f32,
) -> Vec<Op> {
    let (usable_w, _) = usable;
    let content_top = page_h_pt - MARGIN_PT;
    let mut ops: Vec<Op> = Vec::new();

    for placement in placements {
        let top = content_top - placement.top;
        match &plan.blocks[placement.block] {
            Block::Line {
                text,
                style,
                centered,
            } => {
                let x = if *centered {
                    let estimated = text.chars().count() as f32 * 0.5 * style.size();
                    MARGIN_PT + ((usable_w - estimated) / 2.0).max(0.0)
                } else {
                    MARGIN_PT + style.indent()
                };
                // Baseline sits one font size below the line's top edge.
                push_text(&mut ops, text, *style, x, top - style.size());
            }
            Block::Image {
                raster,
                width_pt,
                height_pt,
            } => {
                let (px_w, px_h) = raster.dimensions();
                let raw = RawImage {
                    pixels: RawImageData::U8(raster.as_raw().clone()),
                    width: px_w as usize,
                    height: px_h as usize,
                    data_format: RawImageFormat::RGB8,
                    tag: Vec::new(),
                };
                let xobject_id = doc.add_image(&raw);

                // At 72 dpi one pixel is one point before scaling.
                let x_offset = MARGIN_PT + (usable_w - width_pt) / 2.0;
                let y_offset = top - height_pt;
                ops.push(Op::UseXobject {
                    id: xobject_id,
                    transform: XObjectTransform {
                        translate_x: Some(Pt(x_offset)),
                        translate_y: Some(Pt(y_offset)),
                        scale_x: Some(width_pt / px_w as f32),
                        scale_y: Some(height_pt / px_h as f32),
                        dpi: Some(72.0),
                        rotate: None,
                    },
                });
            }
            Block::Spacer(_) | Block::PageBreak => {}
        }
    }
    ops
}

fn push_text(ops: &mut Vec<Op>, text: &str, style: TextStyle, x: f32, baseline: f32) {
    let font = if style.is_bold() {
        BuiltinFont::HelveticaBold
    } else {
        BuiltinFont::Helvetica
    };
    let (r, g, b) = style.color();

    ops.push(Op::StartTextSection);
    ops.push(Op::SetFillColor {
        col: Color::Rgb(Rgb {
            r,
            g,
            b,
            icc_profile: None,
        }),
    });
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(x),
            y: Pt(baseline),
        },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(style.size()),
        font,
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(builtin_safe(text))],
        font,
    });
    ops.push(Op::EndTextSection);
}

/// The standard 14 fonts only cover Latin-1. Arrows become `->` and any other
/// character outside that range becomes `?`.
fn builtin_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '→' => out.push_str("->"),
            c if (c as u32) < 0x100 => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use image::{Rgba, RgbaImage};
    use markshot_core::types::{AnnotationInput, ScreenshotRecord};

    use crate::image::ImageProcessor;

    fn assembler() -> DocumentAssembler {
        let at = NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        DocumentAssembler::new().with_generated_at(at)
    }

    fn item(width: u32, height: u32, annotations: usize) -> ExportItem {
        let mut record = ScreenshotRecord::new("s.png", width, height).unwrap();
        for i in 0..annotations {
            record
                .add_annotation(AnnotationInput::new("Test", (i as f64, 1.0), (20.0, 20.0)))
                .unwrap();
        }
        let png = ImageProcessor::from_rgba(RgbaImage::from_pixel(width, height, Rgba([9, 9, 9, 255])))
            .to_png_bytes()
            .unwrap();
        ExportItem::new(record, Some(png))
    }

    #[test]
    fn empty_collection_is_a_valid_one_page_document() {
        let doc = assembler().assemble(&[], None).unwrap();
        assert_eq!(doc.page_count, 1);
        assert_eq!(doc.sections, 0);
        assert_eq!(doc.page_breaks, 0);
        assert_eq!(doc.title, "Screenshot Collection - 2026-01-02 03:04");
        assert!(doc.bytes.starts_with(b"%PDF"));
        assert_eq!(PdfReader::from_bytes(&doc.bytes).unwrap().page_count(), 1);
    }

    #[test]
    fn pages_are_a4_inside_40pt_margins() {
        let (w, h) = DocumentAssembler::new().usable_area();
        assert!((w - (595.28 - 80.0)).abs() < 0.1);
        assert!((h - (841.89 - 80.0)).abs() < 0.1);
    }

    #[test]
    fn one_page_per_item_with_breaks_between() {
        for n in [1usize, 5] {
            let items: Vec<_> = (0..n).map(|_| item(60, 40, 1)).collect();
            let doc = assembler().assemble(&items, Some("Release notes")).unwrap();
            assert_eq!(doc.sections, n);
            assert_eq!(doc.page_breaks, n - 1);
            assert_eq!(doc.page_count, n);
            assert_eq!(PdfReader::from_bytes(&doc.bytes).unwrap().page_count(), n);
        }
    }

    #[test]
    fn supplied_title_reaches_the_document() {
        let doc = assembler().assemble(&[item(60, 40, 0)], Some("  Release notes ")).unwrap();
        assert_eq!(doc.title, "Release notes");
        let reader = PdfReader::from_bytes(&doc.bytes).unwrap();
        assert_eq!(reader.title().as_deref(), Some("Release notes"));
    }

    #[test]
    fn single_item_summary_counts() {
        let doc = assembler().assemble(&[item(120, 90, 1)], None).unwrap();
        assert_eq!(doc.sections, 1);
        assert_eq!(doc.page_breaks, 0);
        assert_eq!(doc.total_annotations, 1);
    }

    #[test]
    fn broken_rasters_do_not_abort_assembly() {
        let mut broken = item(60, 40, 0);
        broken.image = Some(b"corrupt".to_vec());
        let doc = assembler().assemble(&[item(60, 40, 0), broken], None).unwrap();
        assert_eq!(doc.placeholders, 1);
        assert_eq!(doc.sections, 2);
        assert_eq!(doc.page_count, 2);
    }

    #[test]
    fn builtin_text_is_latin1() {
        assert_eq!(builtin_safe("(1, 2) → (3, 4)"), "(1, 2) -> (3, 4)");
        assert_eq!(builtin_safe("400 × 300 café"), "400 × 300 café");
        assert_eq!(builtin_safe("日本"), "??");
    }

    #[test]
    fn usable_area_respects_margins() {
        let (w, h) = DocumentAssembler::new().usable_area();
        assert!((w - (595.27 - 80.0)).abs() < 0.1);
        assert!((h - (841.89 - 80.0)).abs() < 0.1);
    }
}
