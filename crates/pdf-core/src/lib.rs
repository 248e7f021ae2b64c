//! PDF Core - Low-level PDF writing
//!
//! This crate provides functionality for:
//! - Creating PDF documents page by page
//! - Drawing text with the PDF standard fonts
//! - Drawing lines and rectangles
//! - Inserting images (JPEG, PNG)
//!
//! Coordinates are in points with `y` measured from the top of the page.
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Align, PageSize, PdfDocument, StandardFont};
//!
//! let mut doc = PdfDocument::new(PageSize::A4);
//! let page = doc.add_page();
//! doc.set_font(StandardFont::Helvetica, 12.0);
//! doc.insert_text("Hello, World!", page, 100.0, 100.0, Align::Left)?;
//! doc.save("output.pdf")?;
//! ```

mod document;
mod font;
mod image;
mod text;

pub use document::{Color, PageSize, PdfDocument};
pub use font::StandardFont;
pub use image::{calculate_scaled_dimensions, get_dimensions, ImageDimensions, ImageScaleMode};
pub use text::{calculate_x_offset, encode_win_ansi};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("No font set")]
    FontNotSet,

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),

    #[error("Text error: {0}")]
    TextError(#[from] sheet_text::TextError),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}
