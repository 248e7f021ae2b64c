//! Column presets
//!
//! A preset is plain data: a list of columns plus row heights. New presets
//! can be registered at runtime (or listed in the configuration) without
//! touching the layout engine.

use crate::decorator::PageGeometry;
use crate::schema::CanonicalLineItem;
use crate::{Result, SheetError};
use serde::{Deserialize, Serialize};
use sheet_text::format_currency;
use std::collections::BTreeMap;

/// Which line item value a column shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKey {
    Quantity,
    Sku,
    Description,
    /// SKU and description joined as "SKU - description"
    SkuDescription,
    BinLocation,
    UnitPrice,
    /// Always empty
    Spacer,
}

impl ColumnKey {
    /// Cell text for a line item
    pub fn cell_text(self, item: &CanonicalLineItem, currency_symbol: &str) -> String {
        match self {
            ColumnKey::Quantity => item.quantity.clone(),
            ColumnKey::Sku => item.sku.clone(),
            ColumnKey::Description => item.description.clone(),
            ColumnKey::SkuDescription => match (item.sku.is_empty(), item.description.is_empty()) {
                (true, _) => item.description.clone(),
                (false, true) => item.sku.clone(),
                (false, false) => format!("{} - {}", item.sku, item.description),
            },
            ColumnKey::BinLocation => item.bin_location.clone(),
            ColumnKey::UnitPrice => format_currency(currency_symbol, item.unit_price),
            ColumnKey::Spacer => String::new(),
        }
    }
}

/// Horizontal alignment of cell text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// One table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub key: ColumnKey,
    pub header_label: String,
    /// Width in millimetres
    pub width: f64,
    #[serde(default)]
    pub align: ColumnAlign,
    /// Whether the cell text wraps onto several lines
    #[serde(default)]
    pub wrap: bool,
}

impl ColumnSpec {
    pub fn new(key: ColumnKey, header_label: &str, width: f64, align: ColumnAlign) -> Self {
        Self {
            key,
            header_label: header_label.to_string(),
            width,
            align,
            wrap: false,
        }
    }

    pub fn wrapping(mut self) -> Self {
        self.wrap = true;
        self
    }
}

fn default_line_height() -> f64 {
    8.0
}

fn default_header_row_height() -> f64 {
    10.0
}

/// A named column layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnPreset {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    /// Height of one text line in data rows (mm)
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    /// Height of the header row (mm)
    #[serde(default = "default_header_row_height")]
    pub header_row_height: f64,
}

impl ColumnPreset {
    pub fn new(name: &str, columns: Vec<ColumnSpec>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            line_height: default_line_height(),
            header_row_height: default_header_row_height(),
        }
    }

    /// Sum of the column widths
    pub fn total_width(&self) -> f64 {
        self.columns.iter().map(|c| c.width).sum()
    }

    /// Check that the preset is drawable within `content_width`
    pub fn validate(&self, content_width: f64) -> Result<()> {
        let invalid = |reason: String| {
            Err(SheetError::Config(format!(
                "preset '{}': {reason}",
                self.name
            )))
        };

        if self.name.trim().is_empty() {
            return Err(SheetError::Config("preset name is empty".to_string()));
        }
        if self.columns.is_empty() {
            return invalid("no columns".to_string());
        }
        if let Some(column) = self
            .columns
            .iter()
            .find(|c| !(c.width.is_finite() && c.width > 0.0))
        {
            return invalid(format!(
                "column '{}' has invalid width {}",
                column.header_label, column.width
            ));
        }
        if self.total_width() > content_width + 1e-6 {
            return invalid(format!(
                "columns are {} mm wide, content width is {} mm",
                self.total_width(),
                content_width
            ));
        }
        if !(self.line_height > 0.0 && self.header_row_height > 0.0) {
            return invalid("row heights must be positive".to_string());
        }
        Ok(())
    }

    /// Cost/location sheet: quantity, SKU + description, bin, price, spacer
    pub fn five_column() -> Self {
        Self::new(
            "five_column",
            vec![
                ColumnSpec::new(ColumnKey::Quantity, "QTY", 15.0, ColumnAlign::Center),
                ColumnSpec::new(ColumnKey::SkuDescription, "Item", 100.0, ColumnAlign::Left)
                    .wrapping(),
                ColumnSpec::new(ColumnKey::BinLocation, "Bin Location", 30.0, ColumnAlign::Center),
                ColumnSpec::new(ColumnKey::UnitPrice, "Price", 25.0, ColumnAlign::Right),
                ColumnSpec::new(ColumnKey::Spacer, "", 20.0, ColumnAlign::Left),
            ],
        )
    }

    /// Identification sheet: quantity, SKU, title, bin
    pub fn four_column() -> Self {
        Self::new(
            "four_column",
            vec![
                ColumnSpec::new(ColumnKey::Quantity, "QTY", 15.0, ColumnAlign::Center),
                ColumnSpec::new(ColumnKey::Sku, "SKU", 40.0, ColumnAlign::Left),
                ColumnSpec::new(ColumnKey::Description, "Title", 95.0, ColumnAlign::Left)
                    .wrapping(),
                ColumnSpec::new(ColumnKey::BinLocation, "Bin Location", 40.0, ColumnAlign::Center),
            ],
        )
    }

    /// Minimal sheet: quantity, title, bin
    pub fn three_column() -> Self {
        Self::new(
            "three_column",
            vec![
                ColumnSpec::new(ColumnKey::Quantity, "QTY", 20.0, ColumnAlign::Center),
                ColumnSpec::new(ColumnKey::Description, "Title", 130.0, ColumnAlign::Left)
                    .wrapping(),
                ColumnSpec::new(ColumnKey::BinLocation, "Bin Location", 40.0, ColumnAlign::Center),
            ],
        )
    }
}

/// Named presets available to a generator
#[derive(Debug, Clone)]
pub struct PresetRegistry {
    presets: BTreeMap<String, ColumnPreset>,
    content_width: f64,
}

impl PresetRegistry {
    /// Registry holding the built-in presets, validated against the A4 content width
    pub fn builtin() -> Self {
        let mut registry = Self {
            presets: BTreeMap::new(),
            content_width: PageGeometry::A4.content_width(),
        };
        for preset in [
            ColumnPreset::five_column(),
            ColumnPreset::four_column(),
            ColumnPreset::three_column(),
        ] {
            registry.presets.insert(preset.name.clone(), preset);
        }
        registry
    }

    /// Add a preset, replacing any preset with the same name
    pub fn register(&mut self, preset: ColumnPreset) -> Result<()> {
        preset.validate(self.content_width)?;
        if self.presets.contains_key(&preset.name) {
            log::info!("Replacing column preset '{}'", preset.name);
        }
        self.presets.insert(preset.name.clone(), preset);
        Ok(())
    }

    /// Look up a preset by name
    pub fn get_preset(&self, name: &str) -> Result<&ColumnPreset> {
        self.presets
            .get(name.trim())
            .ok_or_else(|| SheetError::Config(format!("unknown preset '{name}'")))
    }

    /// Registered preset names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Look up a built-in preset by name
pub fn get_preset(name: &str) -> Result<ColumnPreset> {
    PresetRegistry::builtin().get_preset(name).cloned()
}
