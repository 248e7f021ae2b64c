//! Request, record and configuration types

use crate::presets::ColumnPreset;
use crate::{Result, SheetError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A raw keyed input record (spreadsheet row or API object)
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// A line item with fixed field names, independent of its source schema
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalLineItem {
    pub quantity: String,
    pub sku: String,
    pub description: String,
    pub bin_location: String,
    pub unit_price: Decimal,
}

/// Canonical line item fields that are read from raw records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Quantity,
    Sku,
    Description,
    BinLocation,
    UnitPrice,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 5] = [
        CanonicalField::Quantity,
        CanonicalField::Sku,
        CanonicalField::Description,
        CanonicalField::BinLocation,
        CanonicalField::UnitPrice,
    ];
}

/// Accepted source-key spellings per canonical field, in priority order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldAliasTable {
    pub quantity: Vec<String>,
    pub sku: Vec<String>,
    pub description: Vec<String>,
    pub bin_location: Vec<String>,
    pub unit_price: Vec<String>,
    /// Keys holding the document title (document level, not per item)
    pub title: Vec<String>,
}

fn strings(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

impl Default for FieldAliasTable {
    fn default() -> Self {
        Self {
            quantity: strings(&["Quantity", "QTY", "Transfer Quantity", "quantity"]),
            sku: strings(&["SKU", "Variant SKU", "sku"]),
            description: strings(&["Product", "Title", "Product Title", "Description", "title"]),
            bin_location: strings(&["Transfer Bin Location", "Bin Location", "Bin", "bin_location"]),
            unit_price: strings(&["Retail Price", "Price", "Unit Price", "price"]),
            title: strings(&["Stock Transfer", "Transfer", "Transfer Name", "name"]),
        }
    }
}

impl FieldAliasTable {
    /// Aliases for a canonical field
    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        match field {
            CanonicalField::Quantity => &self.quantity,
            CanonicalField::Sku => &self.sku,
            CanonicalField::Description => &self.description,
            CanonicalField::BinLocation => &self.bin_location,
            CanonicalField::UnitPrice => &self.unit_price,
        }
    }
}

/// Per-document metadata printed in the masthead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: String,
    pub vendor: String,
    pub clerk: String,
    pub date: NaiveDate,
}

impl DocumentMetadata {
    pub fn new(title: &str, vendor: &str, clerk: &str, date: NaiveDate) -> Self {
        Self {
            title: title.to_string(),
            vendor: vendor.to_string(),
            clerk: clerk.to_string(),
            date,
        }
    }

    /// Check that title, vendor and clerk are all present
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("title", &self.title),
            ("vendor", &self.vendor),
            ("clerk", &self.clerk),
        ] {
            if value.trim().is_empty() {
                return Err(SheetError::Validation(format!("missing {name}")));
            }
        }
        Ok(())
    }

    /// Date as printed in the masthead (MM/DD/YYYY)
    pub fn date_label(&self) -> String {
        self.date.format("%m/%d/%Y").to_string()
    }

    /// Date in PDF date format
    pub fn pdf_date(&self) -> String {
        self.date.format("D:%Y%m%d000000").to_string()
    }
}

/// A document request from the ingestion side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRequest {
    pub preset_name: String,
    /// Document title; taken from the records when absent
    #[serde(default)]
    pub title: Option<String>,
    pub vendor: String,
    pub clerk: String,
}

impl SheetRequest {
    pub fn new(preset_name: &str, vendor: &str, clerk: &str) -> Self {
        Self {
            preset_name: preset_name.to_string(),
            title: None,
            vendor: vendor.to_string(),
            clerk: clerk.to_string(),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Parse a request from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Generator configuration
///
/// Everything here is fixed for the life of a generator and shared by every
/// document it produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SheetConfig {
    /// Issuer address lines printed under the logo
    pub issuer: Vec<String>,

    /// Optional logo image (JPEG or PNG)
    pub logo: Option<PathBuf>,

    /// Printed before the document title
    pub title_prefix: String,

    /// Prefix for price cells
    pub currency_symbol: String,

    /// Vendor/location identifier -> display name
    pub location_names: BTreeMap<String, String>,

    /// Source-key aliases per canonical field
    pub aliases: FieldAliasTable,

    /// Presets added on top of the built-in ones
    pub presets: Vec<ColumnPreset>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            issuer: Vec::new(),
            logo: None,
            title_prefix: "Transfer # ".to_string(),
            currency_symbol: "$".to_string(),
            location_names: BTreeMap::new(),
            aliases: FieldAliasTable::default(),
            presets: Vec::new(),
        }
    }
}

impl SheetConfig {
    /// Parse a configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
