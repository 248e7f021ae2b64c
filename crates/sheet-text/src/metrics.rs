//! Font metrics tables and text measurement

use crate::{FontDescriptor, FontStyle, Result, TextError};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

/// Points per millimetre
const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// Font units per em for the standard font tables
const UNITS_PER_EM: f64 = 1000.0;

/// First character covered by the embedded tables (space)
const FIRST_CHAR: u32 = 32;

/// Helvetica advance widths for U+0020..=U+007E (Adobe AFM)
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for U+0020..=U+007E (Adobe AFM)
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Courier is monospaced
const COURIER_WIDTH: u16 = 600;

/// Family used when a requested family has no table
const DEFAULT_FAMILY: &str = "helvetica";

static SHARED: Lazy<Arc<MetricsRegistry>> = Lazy::new(|| Arc::new(MetricsRegistry::builtin()));

/// Measurement unit for reported widths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    Point,
    #[default]
    Millimetre,
}

impl Unit {
    /// Convert a length in points into this unit
    pub fn from_points(self, points: f64) -> f64 {
        match self {
            Unit::Point => points,
            Unit::Millimetre => points / POINTS_PER_MM,
        }
    }

    /// Convert a length in this unit into points
    pub fn to_points(self, value: f64) -> f64 {
        match self {
            Unit::Point => value,
            Unit::Millimetre => value * POINTS_PER_MM,
        }
    }
}

/// Something that can report the rendered width of a string
///
/// Widths are in document units. Implementations must be safe to share
/// between concurrent document generations.
pub trait TextMeasurer: Send + Sync {
    /// Rendered width of `text` in `font`
    fn text_width(&self, font: &FontDescriptor, text: &str) -> Result<f64>;

    /// Convert a font size in points to document units
    fn points_to_units(&self, points: f64) -> f64;
}

/// Advance widths for one font face, in 1/1000 em
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Face name (e.g. "Helvetica-Bold")
    name: String,
    /// Code point of the first entry in `widths`
    first_char: u32,
    /// Advance widths by code point offset
    widths: Vec<u16>,
    /// Width for characters outside the table
    missing_width: u16,
}

impl FontMetrics {
    /// Create a metrics table
    ///
    /// # Arguments
    /// * `name` - Face name
    /// * `first_char` - Code point of `widths[0]`
    /// * `widths` - Advance widths in 1/1000 em
    /// * `missing_width` - Width used for unmapped characters
    pub fn new(name: &str, first_char: u32, widths: Vec<u16>, missing_width: u16) -> Self {
        Self {
            name: name.to_string(),
            first_char,
            widths,
            missing_width,
        }
    }

    /// Create a table where every character has the same advance
    pub fn monospaced(name: &str, width: u16) -> Self {
        Self::new(name, FIRST_CHAR, Vec::new(), width)
    }

    pub fn helvetica() -> Self {
        Self::new("Helvetica", FIRST_CHAR, HELVETICA_WIDTHS.to_vec(), 556)
    }

    pub fn helvetica_bold() -> Self {
        Self::new(
            "Helvetica-Bold",
            FIRST_CHAR,
            HELVETICA_BOLD_WIDTHS.to_vec(),
            611,
        )
    }

    pub fn courier() -> Self {
        Self::monospaced("Courier", COURIER_WIDTH)
    }

    /// Face name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Advance width of one character in 1/1000 em
    pub fn char_width(&self, c: char) -> u16 {
        (c as u32)
            .checked_sub(self.first_char)
            .and_then(|offset| self.widths.get(offset as usize))
            .copied()
            .unwrap_or(self.missing_width)
    }

    /// Calculate text width in font units
    pub fn text_width(&self, text: &str) -> u32 {
        text.chars().map(|c| self.char_width(c) as u32).sum()
    }

    /// Calculate text width in points for a given font size
    pub fn text_width_points(&self, text: &str, font_size: f64) -> f64 {
        self.text_width(text) as f64 / UNITS_PER_EM * font_size
    }
}

/// Metrics tables keyed by font family and style
///
/// Family names are matched case-insensitively. A missing style falls back
/// to the family's regular face; a missing family falls back to the
/// default family.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    faces: HashMap<(String, FontStyle), Arc<FontMetrics>>,
    default_family: Option<String>,
    unit: Unit,
}

impl MetricsRegistry {
    /// Registry with no tables at all
    pub fn empty() -> Self {
        Self {
            faces: HashMap::new(),
            default_family: None,
            unit: Unit::default(),
        }
    }

    /// Registry with the built-in standard font tables, measuring in millimetres
    pub fn builtin() -> Self {
        let mut registry = Self::empty();

        let regular = Arc::new(FontMetrics::helvetica());
        let bold = Arc::new(FontMetrics::helvetica_bold());
        for family in ["helvetica", "arial", "sans-serif"] {
            // Oblique faces share the upright advances
            registry.insert(family, FontStyle::Regular, regular.clone());
            registry.insert(family, FontStyle::Italic, regular.clone());
            registry.insert(family, FontStyle::Bold, bold.clone());
            registry.insert(family, FontStyle::BoldItalic, bold.clone());
        }

        let courier = Arc::new(FontMetrics::courier());
        for family in ["courier", "monospace"] {
            registry.insert(family, FontStyle::Regular, courier.clone());
        }

        registry.default_family = Some(DEFAULT_FAMILY.to_string());
        registry
    }

    /// Process-wide read-only built-in registry
    pub fn shared() -> Arc<Self> {
        SHARED.clone()
    }

    /// Report widths in the given unit
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Register a metrics table for a family and style
    pub fn register(&mut self, family: &str, style: FontStyle, metrics: FontMetrics) {
        self.insert(family, style, Arc::new(metrics));
    }

    /// Set the family used when a requested family is unknown
    pub fn set_default_family(&mut self, family: &str) {
        self.default_family = Some(family.to_lowercase());
    }

    fn insert(&mut self, family: &str, style: FontStyle, metrics: Arc<FontMetrics>) {
        self.faces.insert((family.to_lowercase(), style), metrics);
    }

    fn lookup(&self, family: &str, style: FontStyle) -> Option<&Arc<FontMetrics>> {
        self.faces
            .get(&(family.to_string(), style))
            .or_else(|| self.faces.get(&(family.to_string(), FontStyle::Regular)))
    }

    /// Resolve the metrics table for a font descriptor
    pub fn metrics_for(&self, font: &FontDescriptor) -> Result<Arc<FontMetrics>> {
        let family = font.family.trim().to_lowercase();
        if let Some(metrics) = self.lookup(&family, font.style) {
            return Ok(metrics.clone());
        }

        if let Some(default) = &self.default_family {
            if let Some(metrics) = self.lookup(default, font.style) {
                log::warn!(
                    "No metrics for font family '{}', measuring with '{}'",
                    font.family,
                    metrics.name()
                );
                return Ok(metrics.clone());
            }
        }

        Err(TextError::MetricsUnavailable(font.to_string()))
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TextMeasurer for MetricsRegistry {
    fn text_width(&self, font: &FontDescriptor, text: &str) -> Result<f64> {
        if !(font.size.is_finite() && font.size > 0.0) {
            return Err(TextError::InvalidFontSize(font.size));
        }

        let metrics = self.metrics_for(font)?;
        Ok(self
            .unit
            .from_points(metrics.text_width_points(text, font.size)))
    }

    fn points_to_units(&self, points: f64) -> f64 {
        self.unit.from_points(points)
    }
}
