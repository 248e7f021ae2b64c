//! PDF document builder

use crate::font::StandardFont;
use crate::image::{
    calculate_scaled_dimensions, generate_image_operators, ImageScaleMode, ImageXObject,
};
use crate::text::{encode_win_ansi, generate_text_operators, to_hex_string, TextRenderContext};
use crate::{Align, PdfError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use sheet_text::{MetricsRegistry, TextMeasurer, Unit};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Page size in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// ISO A4 portrait (210 x 297 mm)
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    /// US Letter portrait
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    /// Size from millimetres
    pub fn from_mm(width: f64, height: f64) -> Self {
        Self {
            width: Unit::Millimetre.to_points(width),
            height: Unit::Millimetre.to_points(height),
        }
    }
}

/// Operators and resources collected for one page
#[derive(Debug, Default)]
struct PageBuffer {
    content: Vec<u8>,
    fonts: BTreeSet<StandardFont>,
    /// Resource name -> index into `PdfDocument::images`
    images: BTreeMap<String, usize>,
}

/// Document metadata written to the Info dictionary
#[derive(Debug, Clone, Default)]
struct DocumentInfo {
    title: Option<String>,
    author: Option<String>,
    subject: Option<String>,
    creator: Option<String>,
    producer: Option<String>,
    creation_date: Option<String>,
}

/// PDF document builder
///
/// Drawing calls are buffered per page and the file is assembled in one
/// pass by `to_bytes`/`save`. Nothing time-dependent is written unless set
/// through [`PdfDocument::set_creation_date`], so identical calls produce
/// identical bytes.
pub struct PdfDocument {
    page_size: PageSize,
    pages: Vec<PageBuffer>,
    /// Embedded images, in first-use order
    images: Vec<ImageXObject>,
    /// Hash of image bytes -> index into `images`
    image_index: HashMap<u64, usize>,
    current_font: Option<StandardFont>,
    current_font_size: f64,
    current_text_color: Color,
    current_line_width: f64,
    metrics: Arc<MetricsRegistry>,
    info: DocumentInfo,
}

impl PdfDocument {
    /// Create an empty document
    ///
    /// # Arguments
    /// * `page_size` - Size used for every page
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            images: Vec::new(),
            image_index: HashMap::new(),
            current_font: None,
            current_font_size: 12.0,
            current_text_color: Color::black(),
            current_line_width: 1.0,
            metrics: Arc::new(MetricsRegistry::builtin().with_unit(Unit::Point)),
            info: DocumentInfo::default(),
        }
    }

    /// Page size used for every page
    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Append a blank page
    ///
    /// # Returns
    /// New page number (1-indexed)
    pub fn add_page(&mut self) -> usize {
        self.pages.push(PageBuffer::default());
        self.pages.len()
    }

    /// Set the current font and size (in points)
    pub fn set_font(&mut self, font: StandardFont, size: f64) {
        self.current_font = Some(font);
        self.current_font_size = size;
    }

    /// Set the text color for subsequent text operations
    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    /// Set the stroke width (in points) for subsequent lines and rectangles
    pub fn set_line_width(&mut self, width: f64) {
        self.current_line_width = width;
    }

    pub fn set_title(&mut self, title: &str) {
        self.info.title = Some(title.to_string());
    }

    pub fn set_author(&mut self, author: &str) {
        self.info.author = Some(author.to_string());
    }

    pub fn set_subject(&mut self, subject: &str) {
        self.info.subject = Some(subject.to_string());
    }

    pub fn set_creator(&mut self, creator: &str) {
        self.info.creator = Some(creator.to_string());
    }

    pub fn set_producer(&mut self, producer: &str) {
        self.info.producer = Some(producer.to_string());
    }

    /// Set the creation date, in PDF date format (e.g., "D:20240315000000")
    pub fn set_creation_date(&mut self, date: &str) {
        self.info.creation_date = Some(date.to_string());
    }

    /// Width of text in the current font, in points
    pub fn get_text_width(&self, text: &str) -> Result<f64> {
        let font = self.current_font.ok_or(PdfError::FontNotSet)?;
        let width = self
            .metrics
            .text_width(&font.descriptor(self.current_font_size), text)?;
        Ok(width)
    }

    /// Insert text at a position
    ///
    /// # Arguments
    /// * `text` - Text to draw (one line)
    /// * `page` - Page number (1-indexed)
    /// * `x` - Anchor X in points; left edge, centre or right edge per `align`
    /// * `y` - Baseline Y in points, measured from the top of the page
    /// * `align` - Text alignment around `x`
    pub fn insert_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        align: Align,
    ) -> Result<()> {
        self.check_page(page)?;
        let font = self.current_font.ok_or(PdfError::FontNotSet)?;

        let text_width = match align {
            Align::Left => 0.0,
            Align::Center | Align::Right => self.get_text_width(text)?,
        };
        let ctx = TextRenderContext {
            font_name: font.resource_name(),
            font_size: self.current_font_size,
            text_width,
            color: self.current_text_color,
        };

        let hex = to_hex_string(&encode_win_ansi(text));
        let pdf_y = self.page_size.height - y;
        let operators = generate_text_operators(&hex, x, pdf_y, align, &ctx);

        let buffer = self.page_mut(page)?;
        buffer.fonts.insert(font);
        buffer.content.extend_from_slice(&operators);
        Ok(())
    }

    /// Draw a straight line between two points
    ///
    /// Coordinates are in points with Y measured from the top of the page.
    pub fn draw_line(&mut self, page: usize, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()> {
        self.check_page(page)?;
        let height = self.page_size.height;
        let ops = format!(
            "q\n0 0 0 RG\n{} w\n{} {} m\n{} {} l\nS\nQ\n",
            self.current_line_width,
            x1,
            height - y1,
            x2,
            height - y2
        );
        self.page_mut(page)?.content.extend_from_slice(ops.as_bytes());
        Ok(())
    }

    /// Stroke a rectangle outline
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    /// * `x` - Left edge in points
    /// * `y` - Top edge in points (from top of page)
    /// * `width` - Width in points
    /// * `height` - Height in points
    pub fn draw_rect(
        &mut self,
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        self.check_page(page)?;
        let pdf_y = self.page_size.height - y - height;
        let ops = format!(
            "q\n0 0 0 RG\n{} w\n{} {} {} {} re\nS\nQ\n",
            self.current_line_width, x, pdf_y, width, height
        );
        self.page_mut(page)?.content.extend_from_slice(ops.as_bytes());
        Ok(())
    }

    /// Insert an image stretched to the given box
    ///
    /// # Arguments
    /// * `data` - Image file bytes (JPEG or PNG)
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Y coordinate in points (from top)
    /// * `width` - Image width in points
    /// * `height` - Image height in points
    pub fn insert_image(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        self.insert_image_scaled(data, page, x, y, width, height, ImageScaleMode::Stretch)
            .map(|_| ())
    }

    /// Insert an image with scaling mode
    ///
    /// # Returns
    /// The drawn (width, height) in points
    #[allow(clippy::too_many_arguments)]
    pub fn insert_image_scaled(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        mode: ImageScaleMode,
    ) -> Result<(f64, f64)> {
        self.check_page(page)?;

        let index = self.get_or_create_image(data)?;
        let (orig_width, orig_height) = (self.images[index].width, self.images[index].height);
        let (actual_width, actual_height) =
            calculate_scaled_dimensions(orig_width, orig_height, width, height, mode);

        let resource_name = format!("Im{}", index + 1);
        let pdf_y = self.page_size.height - y - actual_height;
        let operators =
            generate_image_operators(&resource_name, x, pdf_y, actual_width, actual_height);

        let buffer = self.page_mut(page)?;
        buffer.images.insert(resource_name, index);
        buffer.content.extend_from_slice(&operators);

        Ok((actual_width, actual_height))
    }

    /// Save the document to a file
    ///
    /// # Arguments
    /// * `path` - Output file path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Serialize the document to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let used_fonts: BTreeSet<StandardFont> = self
            .pages
            .iter()
            .flat_map(|p| p.fonts.iter().copied())
            .collect();
        let font_ids: BTreeMap<StandardFont, ObjectId> = used_fonts
            .into_iter()
            .map(|font| (font, doc.add_object(font.to_dictionary())))
            .collect();

        let image_ids: Vec<ObjectId> = self
            .images
            .iter()
            .map(|image| doc.add_object(image.to_pdf_stream()))
            .collect();

        let media_box = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::from(self.page_size.width),
            Object::from(self.page_size.height),
        ];

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let mut font_dict = Dictionary::new();
            for font in &page.fonts {
                font_dict.set(font.resource_name(), Object::Reference(font_ids[font]));
            }
            let mut xobject_dict = Dictionary::new();
            for (name, index) in &page.images {
                xobject_dict.set(name.as_bytes(), Object::Reference(image_ids[*index]));
            }

            let mut resources = Dictionary::new();
            if !font_dict.is_empty() {
                resources.set("Font", font_dict);
            }
            if !xobject_dict.is_empty() {
                resources.set("XObject", xobject_dict);
            }

            let contents = doc.add_object(Stream::new(
                dictionary! { "Filter" => "FlateDecode" },
                compress(&page.content)?,
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box.clone(),
                "Resources" => resources,
                "Contents" => contents,
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => self.pages.len() as i64,
                "Kids" => kids,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let info = self.info_dictionary();
        if !info.is_empty() {
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", info_id);
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(buffer)
    }

    fn info_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        let entries = [
            ("Title", &self.info.title),
            ("Author", &self.info.author),
            ("Subject", &self.info.subject),
            ("Creator", &self.info.creator),
            ("Producer", &self.info.producer),
            ("CreationDate", &self.info.creation_date),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                dict.set(
                    key,
                    Object::String(encode_win_ansi(value), StringFormat::Literal),
                );
            }
        }
        dict
    }

    /// Index of the image in `images`, embedding it on first use
    ///
    /// Images are deduplicated by a hash of their bytes.
    fn get_or_create_image(&mut self, data: &[u8]) -> Result<usize> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        if let Some(index) = self.image_index.get(&data_hash) {
            return Ok(*index);
        }

        let xobject = ImageXObject::from_bytes(data)?;
        self.images.push(xobject);
        let index = self.images.len() - 1;
        self.image_index.insert(data_hash, index);
        Ok(index)
    }

    fn check_page(&self, page: usize) -> Result<()> {
        if page == 0 || page > self.pages.len() {
            return Err(PdfError::InvalidPage(page, self.pages.len()));
        }
        Ok(())
    }

    fn page_mut(&mut self, page: usize) -> Result<&mut PageBuffer> {
        let count = self.pages.len();
        page.checked_sub(1)
            .and_then(|i| self.pages.get_mut(i))
            .ok_or(PdfError::InvalidPage(page, count))
    }
}

/// Zlib-compress a content stream
fn compress(content: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content)?;
    Ok(encoder.finish()?)
}
