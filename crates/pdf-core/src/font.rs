//! Standard PDF fonts
//!
//! Only the base-14 Helvetica and Courier faces are supported. They need no
//! embedding, so a document only carries a small Type1 dictionary per face.

use lopdf::{dictionary, Dictionary};
use sheet_text::{FontDescriptor, FontStyle};

/// A base-14 font face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// PostScript name written as `/BaseFont`
    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
            StandardFont::CourierOblique => "Courier-Oblique",
            StandardFont::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    /// Page resource name (e.g., "F1")
    ///
    /// Names are fixed per face so that identical input always produces
    /// identical content streams.
    pub fn resource_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
            StandardFont::HelveticaOblique => "F3",
            StandardFont::HelveticaBoldOblique => "F4",
            StandardFont::Courier => "F5",
            StandardFont::CourierBold => "F6",
            StandardFont::CourierOblique => "F7",
            StandardFont::CourierBoldOblique => "F8",
        }
    }

    /// Pick a face from a family name and style flags
    ///
    /// Courier and monospace names map to Courier; every other family falls
    /// back to Helvetica.
    pub fn from_family(family: &str, bold: bool, italic: bool) -> Self {
        let family = family.trim().to_ascii_lowercase();
        let courier = matches!(family.as_str(), "courier" | "monospace" | "courier new");

        match (courier, bold, italic) {
            (false, false, false) => StandardFont::Helvetica,
            (false, true, false) => StandardFont::HelveticaBold,
            (false, false, true) => StandardFont::HelveticaOblique,
            (false, true, true) => StandardFont::HelveticaBoldOblique,
            (true, false, false) => StandardFont::Courier,
            (true, true, false) => StandardFont::CourierBold,
            (true, false, true) => StandardFont::CourierOblique,
            (true, true, true) => StandardFont::CourierBoldOblique,
        }
    }

    /// Pick a face for a font descriptor
    pub fn from_descriptor(font: &FontDescriptor) -> Self {
        Self::from_family(&font.family, font.style.is_bold(), font.style.is_italic())
    }

    /// Font descriptor used to look up metrics for this face
    pub fn descriptor(self, size: f64) -> FontDescriptor {
        let family = match self {
            StandardFont::Helvetica
            | StandardFont::HelveticaBold
            | StandardFont::HelveticaOblique
            | StandardFont::HelveticaBoldOblique => "Helvetica",
            _ => "Courier",
        };
        let style = match self {
            StandardFont::Helvetica | StandardFont::Courier => FontStyle::Regular,
            StandardFont::HelveticaBold | StandardFont::CourierBold => FontStyle::Bold,
            StandardFont::HelveticaOblique | StandardFont::CourierOblique => FontStyle::Italic,
            StandardFont::HelveticaBoldOblique | StandardFont::CourierBoldOblique => {
                FontStyle::BoldItalic
            }
        };

        FontDescriptor::new(family, style, size)
    }

    /// Type1 font dictionary with WinAnsi encoding
    pub fn to_dictionary(self) -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.base_font(),
            "Encoding" => "WinAnsiEncoding",
        }
    }
}
