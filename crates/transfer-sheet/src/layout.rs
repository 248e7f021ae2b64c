//! Table layout and pagination
//!
//! The layout engine turns canonical line items into page-bounded draw
//! operations. All coordinates are in millimetres from the top-left corner
//! of the page.
//!
//! Row heights come from a width estimate (`floor(width / column) + 1`
//! lines per wrapping cell), and a row is never split: if it does not fit
//! below the cursor, a new page is opened and the header row repeated
//! before the row is placed.

use crate::decorator::LogoImage;
use crate::presets::{ColumnAlign, ColumnPreset, ColumnSpec};
use crate::schema::CanonicalLineItem;
use crate::Result;
use sheet_text::{estimate_line_count, wrap_to_width, FontDescriptor, TextMeasurer};
use std::sync::Arc;

/// Per-page layout state
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    pub content_top: f64,
    pub content_bottom: f64,
    pub content_left: f64,
    pub content_right: f64,
    /// Top of the next row
    pub cursor_y: f64,
    /// 1-indexed page number
    pub page_number: usize,
}

impl PageContext {
    /// Fresh context with the cursor at the top of the content area
    pub fn new(
        page_number: usize,
        content_top: f64,
        content_bottom: f64,
        content_left: f64,
        content_right: f64,
    ) -> Self {
        Self {
            content_top,
            content_bottom,
            content_left,
            content_right,
            cursor_y: content_top,
            page_number,
        }
    }

    /// Whether a row of `height` fits below the cursor
    pub fn fits(&self, height: f64) -> bool {
        self.cursor_y + height <= self.content_bottom
    }
}

/// A line of text
#[derive(Debug, Clone, PartialEq)]
pub struct TextOp {
    pub text: String,
    /// Anchor X: left edge, centre or right edge of the text per `align`
    pub x: f64,
    /// Baseline Y
    pub y: f64,
    pub align: ColumnAlign,
    pub font: FontDescriptor,
}

/// A straight rule
#[derive(Debug, Clone, PartialEq)]
pub struct LineOp {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    /// Stroke width
    pub width: f64,
}

/// An image scaled proportionally to `width`
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOp {
    pub image: Arc<LogoImage>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

/// One bordered table cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellOp {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub border_width: f64,
    pub texts: Vec<TextOp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Header,
    /// Data row for the item at `index` in the input
    Data { index: usize },
}

/// A full table row
#[derive(Debug, Clone, PartialEq)]
pub struct RowOp {
    pub kind: RowKind,
    pub top: f64,
    pub height: f64,
    pub cells: Vec<CellOp>,
}

/// A draw operation
#[derive(Debug, Clone, PartialEq)]
pub enum PageOp {
    /// Starts page `number`; every following op belongs to it
    BeginPage { number: usize },
    Row(RowOp),
    Text(TextOp),
    Line(LineOp),
    Image(ImageOp),
}

/// Opens pages for the layout engine
pub trait PageFactory {
    /// Decorate page `page_number`, appending its ops, and return its context
    fn open_page(&mut self, page_number: usize, ops: &mut Vec<PageOp>) -> Result<PageContext>;
}

/// Fonts and cell styling for the table
#[derive(Debug, Clone, PartialEq)]
pub struct TableStyle {
    pub body_font: FontDescriptor,
    pub header_font: FontDescriptor,
    /// Horizontal padding inside cells
    pub cell_padding: f64,
    pub border_width: f64,
    pub currency_symbol: String,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            body_font: FontDescriptor::regular("Helvetica", 12.0),
            header_font: FontDescriptor::bold("Helvetica", 12.0),
            cell_padding: 1.0,
            border_width: 0.2,
            currency_symbol: "$".to_string(),
        }
    }
}

/// Baseline for a single line of text vertically centred in a band
pub(crate) fn baseline(band_top: f64, band_height: f64, font_size: f64) -> f64 {
    band_top + band_height / 2.0 + 0.3 * font_size
}

/// Lays out line items against one column preset
pub struct TableLayout<'a> {
    preset: &'a ColumnPreset,
    measurer: &'a dyn TextMeasurer,
    style: &'a TableStyle,
}

impl<'a> TableLayout<'a> {
    pub fn new(
        preset: &'a ColumnPreset,
        measurer: &'a dyn TextMeasurer,
        style: &'a TableStyle,
    ) -> Self {
        Self {
            preset,
            measurer,
            style,
        }
    }

    /// Estimated line count for a wrapping cell
    pub fn line_count(&self, text: &str, column: &ColumnSpec) -> Result<usize> {
        if text.is_empty() {
            return Ok(1);
        }
        let width = self.measurer.text_width(&self.style.body_font, text)?;
        Ok(estimate_line_count(width, column.width))
    }

    /// Row height for an item: line height times the tallest wrapping cell
    pub fn row_height(&self, item: &CanonicalLineItem) -> Result<f64> {
        let mut lines = 1;
        for column in self.preset.columns.iter().filter(|c| c.wrap) {
            let text = column.key.cell_text(item, &self.style.currency_symbol);
            lines = lines.max(self.line_count(&text, column)?);
        }
        Ok(self.preset.line_height * lines as f64)
    }

    /// Lay out all items, opening pages through `factory`
    ///
    /// Always produces at least one page with a header row, even for no
    /// items.
    pub fn layout(
        &self,
        items: &[CanonicalLineItem],
        factory: &mut dyn PageFactory,
    ) -> Result<Vec<PageOp>> {
        let mut ops = Vec::new();
        let mut ctx = self.start_page(1, factory, &mut ops)?;
        let mut rows_on_page = 0;

        for (index, item) in items.iter().enumerate() {
            let height = self.row_height(item)?;

            if !ctx.fits(height) && rows_on_page > 0 {
                log::debug!(
                    "Page {} full after {} rows, breaking before item {}",
                    ctx.page_number,
                    rows_on_page,
                    index + 1
                );
                ctx = self.start_page(ctx.page_number + 1, factory, &mut ops)?;
                rows_on_page = 0;
            }
            if !ctx.fits(height) {
                log::warn!(
                    "Item {} needs a {height} mm row, taller than the page allows; drawing it anyway",
                    index + 1
                );
            }

            ops.push(PageOp::Row(self.data_row(index, item, &ctx, height)?));
            ctx.cursor_y += height;
            rows_on_page += 1;
        }

        Ok(ops)
    }

    /// Open a page and draw the header row at the top of its content area
    fn start_page(
        &self,
        page_number: usize,
        factory: &mut dyn PageFactory,
        ops: &mut Vec<PageOp>,
    ) -> Result<PageContext> {
        ops.push(PageOp::BeginPage {
            number: page_number,
        });
        let mut ctx = factory.open_page(page_number, ops)?;
        ops.push(PageOp::Row(self.header_row(&ctx)));
        ctx.cursor_y += self.preset.header_row_height;
        Ok(ctx)
    }

    fn header_row(&self, ctx: &PageContext) -> RowOp {
        let height = self.preset.header_row_height;
        let font = &self.style.header_font;
        let font_size = self.measurer.points_to_units(font.size);

        let mut x = ctx.content_left;
        let cells = self
            .preset
            .columns
            .iter()
            .map(|column| {
                let texts = if column.header_label.is_empty() {
                    Vec::new()
                } else {
                    vec![TextOp {
                        text: column.header_label.clone(),
                        x: x + column.width / 2.0,
                        y: baseline(ctx.cursor_y, height, font_size),
                        align: ColumnAlign::Center,
                        font: font.clone(),
                    }]
                };
                let cell = self.cell(x, ctx.cursor_y, column.width, height, texts);
                x += column.width;
                cell
            })
            .collect();

        RowOp {
            kind: RowKind::Header,
            top: ctx.cursor_y,
            height,
            cells,
        }
    }

    fn data_row(
        &self,
        index: usize,
        item: &CanonicalLineItem,
        ctx: &PageContext,
        height: f64,
    ) -> Result<RowOp> {
        let font = &self.style.body_font;
        let font_size = self.measurer.points_to_units(font.size);
        let line_height = self.preset.line_height;
        let top = ctx.cursor_y;

        let mut cells = Vec::with_capacity(self.preset.columns.len());
        let mut x = ctx.content_left;
        for column in &self.preset.columns {
            let text = column.key.cell_text(item, &self.style.currency_symbol);
            let anchor = self.anchor_x(x, column);

            let texts = if text.is_empty() {
                Vec::new()
            } else if column.wrap {
                let max_width = column.width - 2.0 * self.style.cell_padding;
                wrap_to_width(&text, max_width, |s| self.measurer.text_width(font, s))?
                    .into_iter()
                    .enumerate()
                    .map(|(i, line)| TextOp {
                        text: line,
                        x: anchor,
                        y: baseline(top + i as f64 * line_height, line_height, font_size),
                        align: column.align,
                        font: font.clone(),
                    })
                    .collect()
            } else {
                vec![TextOp {
                    text,
                    x: anchor,
                    y: baseline(top, height, font_size),
                    align: column.align,
                    font: font.clone(),
                }]
            };

            cells.push(self.cell(x, top, column.width, height, texts));
            x += column.width;
        }

        Ok(RowOp {
            kind: RowKind::Data { index },
            top,
            height,
            cells,
        })
    }

    fn anchor_x(&self, cell_x: f64, column: &ColumnSpec) -> f64 {
        match column.align {
            ColumnAlign::Left => cell_x + self.style.cell_padding,
            ColumnAlign::Center => cell_x + column.width / 2.0,
            ColumnAlign::Right => cell_x + column.width - self.style.cell_padding,
        }
    }

    fn cell(&self, x: f64, y: f64, width: f64, height: f64, texts: Vec<TextOp>) -> CellOp {
        CellOp {
            x,
            y,
            width,
            height,
            border_width: self.style.border_width,
            texts,
        }
    }
}

/// Lay out items with the default table style
pub fn layout(
    items: &[CanonicalLineItem],
    preset: &ColumnPreset,
    measurer: &dyn TextMeasurer,
    factory: &mut dyn PageFactory,
) -> Result<Vec<PageOp>> {
    let style = TableStyle::default();
    TableLayout::new(preset, measurer, &style).layout(items, factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::get_preset;
    use sheet_text::TextError;

    /// One millimetre per character
    struct FixedAdvance;

    impl TextMeasurer for FixedAdvance {
        fn text_width(&self, _font: &FontDescriptor, text: &str) -> sheet_text::Result<f64> {
            Ok(text.chars().count() as f64)
        }

        fn points_to_units(&self, points: f64) -> f64 {
            points * 25.4 / 72.0
        }
    }

    struct NoMetrics;

    impl TextMeasurer for NoMetrics {
        fn text_width(&self, font: &FontDescriptor, _text: &str) -> sheet_text::Result<f64> {
            Err(TextError::MetricsUnavailable(font.to_string()))
        }

        fn points_to_units(&self, points: f64) -> f64 {
            points
        }
    }

    /// Plain pages with a fixed content area and no decoration
    struct PlainPages {
        top: f64,
        bottom: f64,
        opened: Vec<usize>,
    }

    impl PlainPages {
        fn new(top: f64, bottom: f64) -> Self {
            Self {
                top,
                bottom,
                opened: Vec::new(),
            }
        }
    }

    impl PageFactory for PlainPages {
        fn open_page(&mut self, page_number: usize, _ops: &mut Vec<PageOp>) -> Result<PageContext> {
            self.opened.push(page_number);
            Ok(PageContext::new(page_number, self.top, self.bottom, 10.0, 200.0))
        }
    }

    fn item(description: &str) -> CanonicalLineItem {
        CanonicalLineItem {
            quantity: "1".to_string(),
            sku: "SKU-1".to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    fn rows(ops: &[PageOp]) -> Vec<&RowOp> {
        ops.iter()
            .filter_map(|op| match op {
                PageOp::Row(row) => Some(row),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_line_count_estimate() {
        let preset = get_preset("three_column").unwrap();
        let style = TableStyle::default();
        let table = TableLayout::new(&preset, &FixedAdvance, &style);
        let title = &preset.columns[1];

        assert_eq!(table.line_count("short", title).unwrap(), 1);
        // 312 mm in a 130 mm column is 2.4 widths
        assert_eq!(table.line_count(&"x".repeat(312), title).unwrap(), 3);
        assert_eq!(table.line_count("", title).unwrap(), 1);
    }

    #[test]
    fn test_row_height_uses_tallest_wrapping_column() {
        let preset = get_preset("three_column").unwrap();
        let style = TableStyle::default();
        let table = TableLayout::new(&preset, &FixedAdvance, &style);

        assert_eq!(table.row_height(&item("Widget")).unwrap(), 8.0);
        assert_eq!(table.row_height(&item(&"x".repeat(312))).unwrap(), 24.0);
    }

    #[test]
    fn test_non_wrapping_columns_ignored_for_height() {
        let preset = get_preset("four_column").unwrap();
        let style = TableStyle::default();
        let table = TableLayout::new(&preset, &FixedAdvance, &style);

        let mut long_sku = item("Widget");
        long_sku.sku = "S".repeat(200);
        assert_eq!(table.row_height(&long_sku).unwrap(), 8.0);
    }

    #[test]
    fn test_empty_items_single_page_with_header() {
        let preset = get_preset("three_column").unwrap();
        let mut pages = PlainPages::new(68.0, 277.0);
        let ops = layout(&[], &preset, &FixedAdvance, &mut pages).unwrap();

        assert_eq!(pages.opened, vec![1]);
        let rows = rows(&ops);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, RowKind::Header);
        assert_eq!(rows[0].top, 68.0);
        assert_eq!(rows[0].height, 10.0);
    }

    #[test]
    fn test_header_cells_centered_and_bold() {
        let preset = get_preset("four_column").unwrap();
        let mut pages = PlainPages::new(68.0, 277.0);
        let ops = layout(&[], &preset, &FixedAdvance, &mut pages).unwrap();

        let header = rows(&ops)[0];
        let xs: Vec<f64> = header.cells.iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![10.0, 25.0, 65.0, 160.0]);
        let sku_label = &header.cells[1].texts[0];
        assert_eq!(sku_label.text, "SKU");
        assert_eq!(sku_label.align, ColumnAlign::Center);
        assert_eq!(sku_label.x, 45.0);
        assert!(sku_label.font.style.is_bold());
    }

    #[test]
    fn test_page_break_repeats_header() {
        let preset = get_preset("three_column").unwrap();
        // 10 mm header + 3 rows of 8 mm fit in 40 mm
        let mut pages = PlainPages::new(0.0, 40.0);
        let items: Vec<_> = (0..7).map(|i| item(&format!("Item {i}"))).collect();
        let ops = layout(&items, &preset, &FixedAdvance, &mut pages).unwrap();

        assert_eq!(pages.opened, vec![1, 2, 3]);
        let kinds: Vec<RowKind> = rows(&ops).iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RowKind::Header,
                RowKind::Data { index: 0 },
                RowKind::Data { index: 1 },
                RowKind::Data { index: 2 },
                RowKind::Header,
                RowKind::Data { index: 3 },
                RowKind::Data { index: 4 },
                RowKind::Data { index: 5 },
                RowKind::Header,
                RowKind::Data { index: 6 },
            ]
        );
        for row in rows(&ops) {
            assert!(row.top + row.height <= 40.0);
        }
    }

    #[test]
    fn test_begin_page_precedes_each_page() {
        let preset = get_preset("three_column").unwrap();
        let mut pages = PlainPages::new(0.0, 40.0);
        let items: Vec<_> = (0..4).map(|i| item(&format!("Item {i}"))).collect();
        let ops = layout(&items, &preset, &FixedAdvance, &mut pages).unwrap();

        let numbers: Vec<usize> = ops
            .iter()
            .filter_map(|op| match op {
                PageOp::BeginPage { number } => Some(*number),
                _ => None,
            })
            .collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(ops[0], PageOp::BeginPage { number: 1 });
    }

    #[test]
    fn test_oversized_row_drawn_on_fresh_page() {
        let preset = get_preset("three_column").unwrap();
        let mut pages = PlainPages::new(0.0, 40.0);
        // 1300 mm of text -> 11 lines -> 88 mm row, taller than any page
        let items = vec![item("short"), item(&"word ".repeat(260)), item("after")];
        let ops = layout(&items, &preset, &FixedAdvance, &mut pages).unwrap();

        assert_eq!(pages.opened, vec![1, 2, 3]);
        let data: Vec<&RowOp> = rows(&ops)
            .into_iter()
            .filter(|r| r.kind != RowKind::Header)
            .collect();
        assert_eq!(data.len(), 3);
        assert_eq!(data[1].top, 10.0);
        assert_eq!(data[1].height, 88.0);
        assert_eq!(data[2].top, 10.0);
    }

    #[test]
    fn test_wrapped_cell_lines_one_line_height_apart() {
        let preset = get_preset("three_column").unwrap();
        let mut pages = PlainPages::new(0.0, 277.0);
        let text = "alpha ".repeat(40);
        let ops = layout(&[item(text.trim())], &preset, &FixedAdvance, &mut pages).unwrap();

        let row = rows(&ops)[1];
        let title_cell = &row.cells[1];
        assert!(title_cell.texts.len() >= 2);
        let gap = title_cell.texts[1].y - title_cell.texts[0].y;
        assert!((gap - 8.0).abs() < 1e-9);
        for line in &title_cell.texts {
            assert!(line.text.chars().count() as f64 <= 128.0);
            assert_eq!(line.x, 31.0);
        }
    }

    #[test]
    fn test_alignment_anchors() {
        let preset = get_preset("five_column").unwrap();
        let mut pages = PlainPages::new(0.0, 277.0);
        let mut priced = item("Widget");
        priced.bin_location = "A-03".to_string();
        priced.unit_price = rust_decimal::Decimal::new(1250, 2);
        let ops = layout(&[priced], &preset, &FixedAdvance, &mut pages).unwrap();

        let row = rows(&ops)[1];
        // QTY centred in 10..25
        assert_eq!(row.cells[0].texts[0].x, 17.5);
        assert_eq!(row.cells[0].texts[0].align, ColumnAlign::Center);
        // Item left-aligned with padding
        assert_eq!(row.cells[1].texts[0].text, "SKU-1 - Widget");
        assert_eq!(row.cells[1].texts[0].x, 26.0);
        // Price right-aligned in 155..180 with padding
        assert_eq!(row.cells[3].texts[0].text, "$12.50");
        assert_eq!(row.cells[3].texts[0].x, 179.0);
        assert_eq!(row.cells[3].texts[0].align, ColumnAlign::Right);
        // Spacer has a border but no text
        assert!(row.cells[4].texts.is_empty());
    }

    #[test]
    fn test_measure_failure_is_fatal() {
        let preset = get_preset("three_column").unwrap();
        let mut pages = PlainPages::new(0.0, 277.0);
        let result = layout(&[item("Widget")], &preset, &NoMetrics, &mut pages);
        assert!(matches!(result, Err(crate::SheetError::Measure(_))));
    }

    #[test]
    fn test_baseline() {
        // 12 pt is 4.2333 mm; 0.3 of it below the band middle
        let y = baseline(68.0, 10.0, 12.0 * 25.4 / 72.0);
        assert!((y - 74.27).abs() < 1e-9);
    }
}
