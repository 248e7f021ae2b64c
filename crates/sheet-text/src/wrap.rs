//! Width-based line breaking

use crate::Result;

/// Estimate how many lines a cell needs from its measured width
///
/// Returns `floor(text_width / column_width) + 1`. This is a width
/// approximation, not a word wrap: it never looks at break opportunities,
/// so text that greedy-wraps badly can need more lines than estimated.
///
/// # Arguments
/// * `text_width` - Measured width of the whole cell text
/// * `column_width` - Width of the column
pub fn estimate_line_count(text_width: f64, column_width: f64) -> usize {
    if !(column_width > 0.0) || !(text_width > 0.0) || !text_width.is_finite() {
        return 1;
    }

    (text_width / column_width).floor() as usize + 1
}

/// Split text into lines that fit within `max_width`
///
/// Greedy: words are added to the current line while the line still fits.
/// A single word wider than `max_width` is kept whole on its own line.
/// Explicit newlines always start a new line.
///
/// # Arguments
/// * `text` - Text to split
/// * `max_width` - Available width in the measurer's units
/// * `measure` - Width of a string in the same units
pub fn wrap_to_width<F>(text: &str, max_width: f64, measure: F) -> Result<Vec<String>>
where
    F: Fn(&str) -> Result<f64>,
{
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current_line = String::new();

        for word in paragraph.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
                continue;
            }

            let candidate = format!("{current_line} {word}");
            if measure(&candidate)? <= max_width {
                current_line = candidate;
            } else {
                lines.push(std::mem::replace(&mut current_line, word.to_string()));
            }
        }

        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    Ok(lines)
}
