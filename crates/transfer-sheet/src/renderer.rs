//! PDF output for laid-out pages
//!
//! Page operations are in millimetres from the top-left corner; they are
//! converted to points here and written through `pdf_core`.

use crate::assembler::RenderedPage;
use crate::decorator::PageGeometry;
use crate::layout::{CellOp, PageOp, TextOp};
use crate::presets::ColumnAlign;
use crate::schema::DocumentMetadata;
use crate::Result;
use pdf_core::{Align, ImageScaleMode, PageSize, PdfDocument, StandardFont};
use sheet_text::Unit;

const PRODUCER: &str = "transfer-sheet";

fn pt(mm: f64) -> f64 {
    Unit::Millimetre.to_points(mm)
}

/// Convert column alignment to PDF text alignment
fn convert_align(align: ColumnAlign) -> Align {
    match align {
        ColumnAlign::Left => Align::Left,
        ColumnAlign::Center => Align::Center,
        ColumnAlign::Right => Align::Right,
    }
}

/// Writes rendered pages as a PDF
#[derive(Debug, Clone, Copy)]
pub struct PdfRenderer {
    geometry: PageGeometry,
}

impl PdfRenderer {
    pub fn new(geometry: PageGeometry) -> Self {
        Self { geometry }
    }

    /// Render pages to PDF bytes
    ///
    /// # Arguments
    /// * `pages` - Pages in order, each holding its draw operations
    /// * `metadata` - Document metadata for the Info dictionary
    /// * `title` - Title as printed on the page
    pub fn render(
        &self,
        pages: &[RenderedPage],
        metadata: &DocumentMetadata,
        title: &str,
    ) -> Result<Vec<u8>> {
        let mut doc = PdfDocument::new(PageSize::from_mm(
            self.geometry.page_width,
            self.geometry.page_height,
        ));
        doc.set_title(title);
        doc.set_author(&metadata.clerk);
        doc.set_subject(&metadata.vendor);
        doc.set_producer(PRODUCER);
        doc.set_creation_date(&metadata.pdf_date());

        for page in pages {
            let number = doc.add_page();
            for op in &page.ops {
                draw(&mut doc, number, op)?;
            }
        }

        Ok(doc.to_bytes()?)
    }
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new(PageGeometry::A4)
    }
}

fn draw(doc: &mut PdfDocument, page: usize, op: &PageOp) -> Result<()> {
    match op {
        PageOp::BeginPage { .. } => {}
        PageOp::Row(row) => {
            for cell in &row.cells {
                draw_cell(doc, page, cell)?;
            }
        }
        PageOp::Text(text) => draw_text(doc, page, text)?,
        PageOp::Line(line) => {
            doc.set_line_width(pt(line.width));
            doc.draw_line(page, pt(line.x1), pt(line.y1), pt(line.x2), pt(line.y2))?;
        }
        PageOp::Image(image) => {
            let width = pt(image.width);
            doc.insert_image_scaled(
                image.image.data(),
                page,
                pt(image.x),
                pt(image.y),
                width,
                width,
                ImageScaleMode::FitWidth,
            )?;
        }
    }
    Ok(())
}

fn draw_cell(doc: &mut PdfDocument, page: usize, cell: &CellOp) -> Result<()> {
    doc.set_line_width(pt(cell.border_width));
    doc.draw_rect(page, pt(cell.x), pt(cell.y), pt(cell.width), pt(cell.height))?;
    for text in &cell.texts {
        draw_text(doc, page, text)?;
    }
    Ok(())
}

fn draw_text(doc: &mut PdfDocument, page: usize, text: &TextOp) -> Result<()> {
    doc.set_font(StandardFont::from_descriptor(&text.font), text.font.size);
    doc.insert_text(&text.text, page, pt(text.x), pt(text.y), convert_align(text.align))?;
    Ok(())
}
