//! Page decoration: masthead, title, divider and footer

use crate::layout::{baseline, ImageOp, LineOp, PageContext, PageFactory, PageOp, TextOp};
use crate::presets::ColumnAlign;
use crate::schema::{DocumentMetadata, SheetConfig};
use crate::Result;
use pdf_core::{get_dimensions, ImageDimensions};
use sheet_text::{FontDescriptor, TextMeasurer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Page size and the fixed regions of the masthead, in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    /// Top of the content area, directly below the divider
    pub content_top: f64,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        page_width: 210.0,
        page_height: 297.0,
        margin_left: 10.0,
        margin_right: 10.0,
        margin_bottom: 20.0,
        content_top: 68.0,
    };

    pub fn content_left(&self) -> f64 {
        self.margin_left
    }

    pub fn content_right(&self) -> f64 {
        self.page_width - self.margin_right
    }

    pub fn content_width(&self) -> f64 {
        self.content_right() - self.content_left()
    }

    pub fn content_bottom(&self) -> f64 {
        self.page_height - self.margin_bottom
    }

    /// The table area below the masthead
    pub fn content_rect(&self) -> ContentRect {
        ContentRect {
            top: self.content_top,
            bottom: self.content_bottom(),
            left: self.content_left(),
            right: self.content_right(),
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// Usable content area of a decorated page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentRect {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

/// A decoded-enough logo: the file bytes plus pixel dimensions
#[derive(Clone, PartialEq)]
pub struct LogoImage {
    data: Vec<u8>,
    dimensions: ImageDimensions,
}

impl LogoImage {
    /// Wrap JPEG or PNG bytes, checking that they are a readable image
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let dimensions = get_dimensions(&data)?;
        Ok(Self { data, dimensions })
    }

    /// Load a logo file
    ///
    /// A missing or unreadable logo is not an error: it is logged and the
    /// masthead is drawn without it.
    pub fn load<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        let loaded = std::fs::read(path)
            .map_err(crate::SheetError::from)
            .and_then(Self::from_bytes);

        match loaded {
            Ok(logo) => Some(logo),
            Err(e) => {
                log::warn!("Logo {} unavailable, continuing without it: {e}", path.display());
                None
            }
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn dimensions(&self) -> ImageDimensions {
        self.dimensions
    }

    /// Height when drawn at `width`, preserving aspect ratio
    pub fn height_for_width(&self, width: f64) -> f64 {
        if self.dimensions.width == 0 {
            return 0.0;
        }
        width * self.dimensions.height as f64 / self.dimensions.width as f64
    }
}

impl fmt::Debug for LogoImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoImage")
            .field("bytes", &self.data.len())
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

/// Fixed masthead content shared by every document of a generator
#[derive(Debug, Clone, Default)]
pub struct Masthead {
    pub issuer: Vec<String>,
    pub title_prefix: String,
    /// Vendor/location identifier -> display name
    pub location_names: BTreeMap<String, String>,
    pub logo: Option<Arc<LogoImage>>,
}

impl Masthead {
    /// Masthead from configuration; the logo is loaded if configured
    pub fn from_config(config: &SheetConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            title_prefix: config.title_prefix.clone(),
            location_names: config.location_names.clone(),
            logo: config.logo.as_ref().and_then(LogoImage::load).map(Arc::new),
        }
    }
}

const LOGO_X: f64 = 10.0;
const LOGO_Y: f64 = 8.0;
const LOGO_WIDTH: f64 = 30.0;
const ISSUER_TOP: f64 = 35.0;
const METADATA_X: f64 = 150.0;
const METADATA_TOP: f64 = 10.0;
const MASTHEAD_LINE: f64 = 5.0;
const TITLE_TOP: f64 = 50.0;
const TITLE_BAND: f64 = 10.0;
const DIVIDER_Y: f64 = 63.0;
const DIVIDER_WIDTH: f64 = 0.5;
const FOOTER_BASELINE: f64 = 287.0;

/// Draws the repeating page decoration
#[derive(Clone)]
pub struct PageDecorator {
    geometry: PageGeometry,
    masthead: Masthead,
    measurer: Arc<dyn TextMeasurer>,
    masthead_font: FontDescriptor,
    title_font: FontDescriptor,
    footer_font: FontDescriptor,
}

impl PageDecorator {
    pub fn new(geometry: PageGeometry, masthead: Masthead, measurer: Arc<dyn TextMeasurer>) -> Self {
        Self {
            geometry,
            masthead,
            measurer,
            masthead_font: FontDescriptor::regular("Helvetica", 10.0),
            title_font: FontDescriptor::bold("Helvetica", 14.0),
            footer_font: FontDescriptor::regular("Helvetica", 8.0),
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn masthead(&self) -> &Masthead {
        &self.masthead
    }

    /// Display name for a vendor identifier
    pub fn vendor_display<'a>(&'a self, vendor: &'a str) -> &'a str {
        self.masthead
            .location_names
            .get(vendor)
            .map(String::as_str)
            .unwrap_or(vendor)
    }

    /// The title line as printed
    pub fn display_title(&self, metadata: &DocumentMetadata) -> String {
        format!("{}{}", self.masthead.title_prefix, metadata.title)
    }

    /// Draw the masthead for page `page_number`
    ///
    /// Returns the content area below the divider. It is the same on every
    /// page whatever the masthead holds.
    pub fn decorate(
        &self,
        page_number: usize,
        metadata: &DocumentMetadata,
        ops: &mut Vec<PageOp>,
    ) -> Result<ContentRect> {
        if let Some(logo) = &self.masthead.logo {
            ops.push(PageOp::Image(ImageOp {
                image: Arc::clone(logo),
                x: LOGO_X,
                y: LOGO_Y,
                width: LOGO_WIDTH,
            }));
        }

        let left = self.geometry.content_left();
        for (i, line) in self.masthead.issuer.iter().enumerate() {
            let top = ISSUER_TOP + i as f64 * MASTHEAD_LINE;
            ops.push(PageOp::Text(self.masthead_line(line, left, top)));
        }

        let metadata_lines = [
            format!("Vendor: {}", self.vendor_display(&metadata.vendor)),
            format!("Clerk: {}", metadata.clerk),
            format!("Date: {}", metadata.date_label()),
            format!("Page: {page_number}"),
        ];
        for (i, line) in metadata_lines.iter().enumerate() {
            let top = METADATA_TOP + i as f64 * MASTHEAD_LINE;
            let text = self.masthead_line(line, METADATA_X, top);
            let width = self.measurer.text_width(&text.font, &text.text)?;
            if METADATA_X + width > self.geometry.content_right() {
                log::debug!("Masthead line '{line}' runs past the right margin");
            }
            ops.push(PageOp::Text(text));
        }

        let title = self.display_title(metadata);
        let title_width = self.measurer.text_width(&self.title_font, &title)?;
        let title_size = self.measurer.points_to_units(self.title_font.size);
        ops.push(PageOp::Text(TextOp {
            text: title,
            x: left + (self.geometry.content_width() - title_width) / 2.0,
            y: baseline(TITLE_TOP, TITLE_BAND, title_size),
            align: ColumnAlign::Left,
            font: self.title_font.clone(),
        }));

        ops.push(PageOp::Line(LineOp {
            x1: left,
            y1: DIVIDER_Y,
            x2: self.geometry.content_right(),
            y2: DIVIDER_Y,
            width: DIVIDER_WIDTH,
        }));

        Ok(self.geometry.content_rect())
    }

    /// "Page n of N" footer, added once the page count is known
    pub fn footer(&self, page_number: usize, total_pages: usize) -> TextOp {
        TextOp {
            text: format!("Page {page_number} of {total_pages}"),
            x: self.geometry.page_width / 2.0,
            y: FOOTER_BASELINE,
            align: ColumnAlign::Center,
            font: self.footer_font.clone(),
        }
    }

    fn masthead_line(&self, text: &str, x: f64, top: f64) -> TextOp {
        let size = self.measurer.points_to_units(self.masthead_font.size);
        TextOp {
            text: text.to_string(),
            x,
            y: baseline(top, MASTHEAD_LINE, size),
            align: ColumnAlign::Left,
            font: self.masthead_font.clone(),
        }
    }
}

impl fmt::Debug for PageDecorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageDecorator")
            .field("geometry", &self.geometry)
            .field("masthead", &self.masthead)
            .finish_non_exhaustive()
    }
}

/// Decorated pages for one document
pub struct DecoratedPages<'a> {
    decorator: &'a PageDecorator,
    metadata: &'a DocumentMetadata,
}

impl<'a> DecoratedPages<'a> {
    pub fn new(decorator: &'a PageDecorator, metadata: &'a DocumentMetadata) -> Self {
        Self {
            decorator,
            metadata,
        }
    }
}

impl PageFactory for DecoratedPages<'_> {
    fn open_page(&mut self, page_number: usize, ops: &mut Vec<PageOp>) -> Result<PageContext> {
        let rect = self.decorator.decorate(page_number, self.metadata, ops)?;
        Ok(PageContext::new(
            page_number,
            rect.top,
            rect.bottom,
            rect.left,
            rect.right,
        ))
    }
}
