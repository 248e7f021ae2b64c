//! Transfer Sheet - paginated stock transfer documents
//!
//! This crate provides:
//! - Normalization of differently-named input records into canonical line items
//! - Named column presets
//! - Table layout with wrapped rows, page breaks and repeated headers
//! - Page decoration (masthead, title, divider, footer)
//! - PDF rendering of the laid-out pages
//!
//! # Example
//!
//! ```ignore
//! use transfer_sheet::{RawRecord, SheetConfig, SheetGenerator, SheetRequest};
//!
//! let config = SheetConfig::from_json(config_json)?;
//! let generator = SheetGenerator::new(config)?;
//! let request = SheetRequest::new("five_column", "STORE1", "Dana");
//! let records: Vec<RawRecord> = serde_json::from_str(records_json)?;
//! let document = generator.generate_today(&records, &request)?;
//! std::fs::write(document.file_name(), document.bytes())?;
//! ```

mod assembler;
mod decorator;
mod layout;
mod normalize;
mod presets;
mod renderer;
mod schema;

pub use assembler::{DocumentAssembler, RenderedDocument, RenderedPage, SheetGenerator};
pub use decorator::{ContentRect, DecoratedPages, LogoImage, Masthead, PageDecorator, PageGeometry};
pub use layout::{
    layout, CellOp, ImageOp, LineOp, PageContext, PageFactory, PageOp, RowKind, RowOp,
    TableLayout, TableStyle, TextOp,
};
pub use normalize::{normalize, parse_price, resolve_title, value_to_string};
pub use presets::{get_preset, ColumnAlign, ColumnKey, ColumnPreset, ColumnSpec, PresetRegistry};
pub use renderer::PdfRenderer;
pub use schema::*;

use thiserror::Error;

/// Errors that can occur while generating a transfer sheet
#[derive(Debug, Error)]
pub enum SheetError {
    /// Required request metadata is missing or blank
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown preset or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Measurement error: {0}")]
    Measure(#[from] sheet_text::TextError),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for transfer sheet operations
pub type Result<T> = std::result::Result<T, SheetError>;
