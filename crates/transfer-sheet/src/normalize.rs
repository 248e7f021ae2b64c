//! Record normalization
//!
//! Every integration names its fields differently ("QTY" vs "Quantity",
//! "Retail Price" vs "price"). Normalization looks each canonical field up
//! through its alias list and produces one [`CanonicalLineItem`] per record.

use crate::schema::{CanonicalLineItem, FieldAliasTable, RawRecord};
use crate::{Result, SheetError};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Normalize a raw record into a canonical line item
///
/// For each field the aliases are tried in order; the first alias present
/// in the record supplies the value. Missing fields default to an empty
/// string, or zero for the price. Never fails.
///
/// # Arguments
/// * `raw` - Source record
/// * `aliases` - Alias table
pub fn normalize(raw: &RawRecord, aliases: &FieldAliasTable) -> CanonicalLineItem {
    CanonicalLineItem {
        quantity: text_field(raw, &aliases.quantity),
        sku: text_field(raw, &aliases.sku),
        description: text_field(raw, &aliases.description),
        bin_location: text_field(raw, &aliases.bin_location),
        unit_price: lookup(raw, &aliases.unit_price)
            .map(parse_price)
            .unwrap_or(Decimal::ZERO),
    }
}

/// Resolve the document title
///
/// A non-blank requested title wins. Otherwise the first record's title
/// field is used. No title at all is a validation error.
pub fn resolve_title(
    requested: Option<&str>,
    records: &[RawRecord],
    aliases: &FieldAliasTable,
) -> Result<String> {
    if let Some(title) = requested.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(title.to_string());
    }

    records
        .first()
        .and_then(|record| lookup(record, &aliases.title))
        .map(value_to_string)
        .filter(|title| !title.is_empty())
        .ok_or_else(|| SheetError::Validation("missing title".to_string()))
}

/// Find the value for the first matching alias
///
/// Keys are compared trimmed: an exact match first, then an ASCII
/// case-insensitive one. `null` values count as absent.
fn lookup<'a>(raw: &'a RawRecord, aliases: &[String]) -> Option<&'a Value> {
    aliases.iter().map(|alias| alias.trim()).find_map(|alias| {
        raw.iter()
            .filter(is_present)
            .find(|(key, _)| key.trim() == alias)
            .or_else(|| {
                raw.iter()
                    .filter(is_present)
                    .find(|(key, _)| key.trim().eq_ignore_ascii_case(alias))
            })
            .map(|(_, value)| value)
    })
}

fn is_present(entry: &(&String, &Value)) -> bool {
    !entry.1.is_null()
}

fn text_field(raw: &RawRecord, aliases: &[String]) -> String {
    lookup(raw, aliases).map(value_to_string).unwrap_or_default()
}

/// Convert a JSON value to trimmed display text
///
/// Integral numbers print without a fractional part (`5.0` -> `"5"`).
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => format!("{f}"),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Parse a price value, yielding zero when it is not a number
///
/// Strings may carry a currency symbol and thousands separators
/// (`"$1,299.00"`).
pub fn parse_price(value: &Value) -> Decimal {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s
            .chars()
            .filter(|c| !matches!(c, '$' | '€' | '£' | ',') && !c.is_whitespace())
            .collect(),
        _ => String::new(),
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .unwrap_or_else(|_| {
            if !text.is_empty() {
                log::debug!("Unparsable price {value}, using zero");
            }
            Decimal::ZERO
        })
}
