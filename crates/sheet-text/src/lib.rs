//! Sheet Text - text measurement and formatting for printed sheets
//!
//! This crate provides:
//! - Built-in metrics for the PDF standard fonts (Helvetica, Courier)
//! - Text width measurement in points or millimetres
//! - Width-based line wrapping and wrapped line-count estimation
//! - Decimal and currency formatting
//!
//! # Example
//!
//! ```ignore
//! use sheet_text::{FontDescriptor, MetricsRegistry, TextMeasurer};
//!
//! let metrics = MetricsRegistry::shared();
//! let font = FontDescriptor::regular("Helvetica", 12.0);
//! let width = metrics.text_width(&font, "Widget")?; // millimetres
//! let lines = sheet_text::estimate_line_count(width, 70.0);
//! ```

mod format;
mod metrics;
mod wrap;

pub use format::{format_currency, render_decimal};
pub use metrics::{FontMetrics, MetricsRegistry, TextMeasurer, Unit};
pub use wrap::{estimate_line_count, wrap_to_width};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during text measurement
#[derive(Debug, Error)]
pub enum TextError {
    #[error("No font metrics available for {0}")]
    MetricsUnavailable(String),

    #[error("Invalid font size: {0}")]
    InvalidFontSize(f64),
}

/// Result type for text operations
pub type Result<T> = std::result::Result<T, TextError>;

/// Font style
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }
}

/// Font family, style and size (in points)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescriptor {
    /// Font family name (e.g. "Helvetica")
    pub family: String,

    /// Font style
    #[serde(default)]
    pub style: FontStyle,

    /// Font size in points
    #[serde(default = "default_font_size")]
    pub size: f64,
}

fn default_font_size() -> f64 {
    12.0
}

impl FontDescriptor {
    pub fn new(family: &str, style: FontStyle, size: f64) -> Self {
        Self {
            family: family.to_string(),
            style,
            size,
        }
    }

    pub fn regular(family: &str, size: f64) -> Self {
        Self::new(family, FontStyle::Regular, size)
    }

    pub fn bold(family: &str, size: f64) -> Self {
        Self::new(family, FontStyle::Bold, size)
    }

    /// Same family and style at a different size
    pub fn with_size(&self, size: f64) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }
}

impl std::fmt::Display for FontDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?} {}pt", self.family, self.style, self.size)
    }
}
