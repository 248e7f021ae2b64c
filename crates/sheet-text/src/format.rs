//! Decimal and currency formatting

use rust_decimal::{Decimal, RoundingStrategy};

/// Pattern used for money amounts
const CURRENCY_PATTERN: &str = "#,###.00";

/// Format a money amount with a currency symbol and two decimals
///
/// # Examples
/// ```
/// use rust_decimal::Decimal;
/// use sheet_text::format_currency;
/// assert_eq!(format_currency("$", Decimal::new(123450, 2)), "$1,234.50");
/// assert_eq!(format_currency("$", Decimal::new(-5, 0)), "-$5.00");
/// ```
pub fn format_currency(symbol: &str, amount: Decimal) -> String {
    let digits = render_decimal(CURRENCY_PATTERN, amount.abs());
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{symbol}{digits}")
    } else {
        format!("{symbol}{digits}")
    }
}

/// Render a decimal with a formatting pattern
///
/// Supports patterns like "#,###.##" for thousand separators and decimal
/// places. The number of `#`/`0` characters after the decimal point sets
/// the precision; midpoints round away from zero.
///
/// # Arguments
/// * `format` - Format pattern
/// * `n` - Number to format
pub fn render_decimal(format: &str, n: Decimal) -> String {
    let (precision, thousand_sep) = parse_format(format);

    let rounded = n
        .abs()
        .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    let fixed = format!("{:.*}", precision as usize, rounded);

    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let int_str = format_with_thousands(int_part, thousand_sep);
    let sign = if n.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    match frac_part {
        Some(frac) if precision > 0 => format!("{sign}{int_str}.{frac}"),
        _ => format!("{sign}{int_str}"),
    }
}

/// Parse format pattern to extract precision and thousands separator
fn parse_format(format: &str) -> (u32, Option<char>) {
    if format.is_empty() {
        return (2, Some(','));
    }

    let precision = match format.rfind('.') {
        Some(pos) => format[pos + 1..]
            .chars()
            .filter(|c| *c == '#' || *c == '0')
            .count() as u32,
        None => 0,
    };

    let thousand_sep = format.contains(',').then_some(',');

    (precision, thousand_sep)
}

/// Insert thousands separators into a run of digits
fn format_with_thousands(digits: &str, sep: Option<char>) -> String {
    let Some(sep) = sep else {
        return digits.to_string();
    };

    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(sep);
        }
        result.push(c);
    }

    result
}
