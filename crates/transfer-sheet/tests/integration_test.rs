//! End-to-end tests: raw records in, paginated PDF out

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sheet_text::{FontDescriptor, TextMeasurer};
use std::sync::Arc;
use transfer_sheet::{
    normalize, FieldAliasTable, PageOp, RawRecord, RenderedDocument, RowKind, SheetConfig,
    SheetError, SheetGenerator, SheetRequest,
};

/// One millimetre per character, whatever the font
struct FixedAdvance;

impl TextMeasurer for FixedAdvance {
    fn text_width(&self, _font: &FontDescriptor, text: &str) -> sheet_text::Result<f64> {
        Ok(text.chars().count() as f64)
    }

    fn points_to_units(&self, points: f64) -> f64 {
        points * 25.4 / 72.0
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
}

fn record(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        _ => panic!("test record must be an object"),
    }
}

fn records(count: usize) -> Vec<RawRecord> {
    (0..count)
        .map(|i| {
            record(json!({
                "Quantity": i + 1,
                "SKU": format!("SKU-{i:03}"),
                "Product": format!("Item {i}"),
                "Bin Location": "A-01",
                "Price": "9.99"
            }))
        })
        .collect()
}

fn generator() -> SheetGenerator {
    init_logger();
    SheetGenerator::new(SheetConfig::default()).unwrap()
}

fn page_count_in_pdf(doc: &RenderedDocument) -> usize {
    lopdf::Document::load_mem(doc.bytes())
        .expect("generated PDF must re-open")
        .get_pages()
        .len()
}

/// Check the layout invariants that hold for every document
fn assert_well_formed(doc: &RenderedDocument, item_count: usize) {
    let numbers: Vec<usize> = doc.pages().iter().map(|p| p.number).collect();
    let expected: Vec<usize> = (1..=doc.page_count()).collect();
    assert_eq!(numbers, expected);

    let mut indices = Vec::new();
    for page in doc.pages() {
        let mut rows = page.rows();
        assert_eq!(rows.next().map(|r| r.kind), Some(RowKind::Header));

        let mut cursor = 0.0;
        for row in page.rows() {
            assert!(row.top >= cursor, "cursor moved backwards");
            assert!(row.top + row.height <= 277.0 + 1e-9, "row below content bottom");
            cursor = row.top + row.height;
            if let RowKind::Data { index } = row.kind {
                indices.push(index);
            }
        }
    }
    let expected: Vec<usize> = (0..item_count).collect();
    assert_eq!(indices, expected);
    assert_eq!(doc.data_row_count(), item_count);
    assert_eq!(page_count_in_pdf(doc), doc.page_count());
}

#[test]
fn test_zero_records_single_page() {
    let request = SheetRequest::new("three_column", "STORE1", "Dana").with_title("T-100");
    let doc = generator().generate(&[], &request, date()).unwrap();

    assert_eq!(doc.page_count(), 1);
    assert_eq!(doc.data_row_count(), 0);
    assert_eq!(doc.pages()[0].rows().count(), 1);
    assert_eq!(doc.file_name(), "T-100.pdf");
    assert_well_formed(&doc, 0);
}

#[test]
fn test_single_short_record() {
    let records = vec![record(json!({"quantity": 5, "sku": "AB-1", "description": "Widget"}))];
    let request = SheetRequest::new("five_column", "STORE1", "Dana").with_title("T-101");
    let doc = generator().generate(&records, &request, date()).unwrap();

    assert_eq!(doc.page_count(), 1);
    let row = doc.pages()[0].data_rows().next().unwrap();
    assert_eq!(row.height, 8.0);
    assert_eq!(row.cells[0].texts[0].text, "5");
    assert_eq!(row.cells[1].texts[0].text, "AB-1 - Widget");
    assert_eq!(row.cells[3].texts[0].text, "$0.00");
}

#[test]
fn test_wrapped_description_row_height() {
    init_logger();
    let generator =
        SheetGenerator::with_measurer(SheetConfig::default(), Arc::new(FixedAdvance)).unwrap();
    // 312 mm of text in the 130 mm title column is 2.4 column widths
    let records = vec![record(json!({"Quantity": 1, "Product": "x".repeat(312)}))];
    let request = SheetRequest::new("three_column", "STORE1", "Dana").with_title("T-102");
    let doc = generator.generate(&records, &request, date()).unwrap();

    let row = doc.pages()[0].data_rows().next().unwrap();
    assert_eq!(row.height, 24.0);
}

#[test]
fn test_page_breaks_repeat_header() {
    let item_count = 60;
    let request = SheetRequest::new("four_column", "STORE1", "Dana").with_title("T-103");
    let doc = generator()
        .generate(&records(item_count), &request, date())
        .unwrap();

    // Rows start 10 mm below the 68 mm content top; 8 mm rows down to 277 mm
    let rows_per_page = ((277.0 - 78.0) / 8.0_f64).floor();
    let total_height = item_count as f64 * 8.0;
    let expected_pages = (total_height / (rows_per_page * 8.0)).ceil() as usize;
    assert_eq!(expected_pages, 3);
    assert_eq!(doc.page_count(), expected_pages);

    for page in &doc.pages()[1..] {
        let first = page.rows().next().unwrap();
        assert_eq!(first.kind, RowKind::Header);
        assert_eq!(first.top, 68.0);
    }
    assert_well_formed(&doc, item_count);
}

#[test]
fn test_later_alias_used_when_first_absent() {
    let aliases = FieldAliasTable {
        quantity: vec!["Quantity".to_string(), "QTY".to_string()],
        ..FieldAliasTable::default()
    };
    let item = normalize(&record(json!({"QTY": 3})), &aliases);
    assert_eq!(item.quantity, "3");
}

#[test]
fn test_mixed_row_heights_keep_invariants() {
    init_logger();
    let generator =
        SheetGenerator::with_measurer(SheetConfig::default(), Arc::new(FixedAdvance)).unwrap();
    let records: Vec<RawRecord> = (0..45)
        .map(|i| {
            let words = (i * 7) % 60 + 1;
            record(json!({"Quantity": i, "SKU": "S", "Product": "word ".repeat(words)}))
        })
        .collect();

    for preset in ["five_column", "four_column", "three_column"] {
        let request = SheetRequest::new(preset, "STORE1", "Dana").with_title("T-104");
        let doc = generator.generate(&records, &request, date()).unwrap();
        assert!(doc.page_count() > 1, "{preset} should need several pages");
        assert_well_formed(&doc, records.len());
    }
}

#[test]
fn test_normalize_is_idempotent() {
    let aliases = FieldAliasTable::default();
    let raw = record(json!({" SKU ": "AB-1", "qty": 2, "Retail Price": "$1,050.00"}));
    assert_eq!(normalize(&raw, &aliases), normalize(&raw, &aliases));
}

#[test]
fn test_first_and_last_alias_agree() {
    let aliases = FieldAliasTable::default();
    let first = record(json!({
        "Quantity": 4,
        "SKU": "AB-1",
        "Product": "Widget",
        "Transfer Bin Location": "C-2",
        "Retail Price": "3.25"
    }));
    let last = record(json!({
        "quantity": 4,
        "sku": "AB-1",
        "title": "Widget",
        "bin_location": "C-2",
        "price": "3.25"
    }));
    assert_eq!(normalize(&first, &aliases), normalize(&last, &aliases));
}

#[test]
fn test_identical_input_identical_bytes() {
    let generator = generator();
    let request = SheetRequest::new("five_column", "STORE1", "Dana").with_title("T-105");
    let records = records(40);

    let a = generator.generate(&records, &request, date()).unwrap();
    let b = generator.generate(&records, &request, date()).unwrap();
    assert_eq!(a.page_count(), b.page_count());
    assert!(a.bytes() == b.bytes(), "output differs between runs");
}

#[test]
fn test_concurrent_generation() {
    let generator = generator();
    let records = records(30);
    let request = SheetRequest::new("four_column", "STORE1", "Dana").with_title("T-106");
    let expected = generator.generate(&records, &request, date()).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    generator
                        .generate(&records, &request, date())
                        .unwrap()
                        .into_bytes()
                })
            })
            .collect();
        for handle in handles {
            let bytes = handle.join().unwrap();
            assert!(bytes == expected.bytes());
        }
    });
}

#[test]
fn test_missing_metadata_is_validation_error() {
    let generator = generator();

    let request = SheetRequest::new("three_column", "STORE1", " ").with_title("T-107");
    let err = generator.generate(&records(2), &request, date()).unwrap_err();
    assert!(matches!(err, SheetError::Validation(ref m) if m == "missing clerk"));

    let request = SheetRequest::new("three_column", "STORE1", "Dana");
    let err = generator.generate(&[], &request, date()).unwrap_err();
    assert!(matches!(err, SheetError::Validation(ref m) if m == "missing title"));
}

#[test]
fn test_title_from_records() {
    let mut records = records(1);
    records[0].insert("Transfer Name".to_string(), json!("North Dock 7"));
    let request = SheetRequest::new("three_column", "STORE1", "Dana");
    let doc = generator().generate(&records, &request, date()).unwrap();

    assert_eq!(doc.metadata().title, "North Dock 7");
    assert_eq!(doc.file_name(), "North_Dock_7.pdf");
}

#[test]
fn test_unknown_preset_is_config_error() {
    let request = SheetRequest::new("six_column", "STORE1", "Dana").with_title("T-108");
    let err = generator().generate(&[], &request, date()).unwrap_err();
    assert!(matches!(err, SheetError::Config(_)));
}

#[test]
fn test_masthead_on_every_page() {
    let config = SheetConfig::from_json(
        r#"{"issuer": ["Harbour Chandler"], "locationNames": {"STORE1": "Downtown"}}"#,
    )
    .unwrap();
    let generator = SheetGenerator::new(config).unwrap();
    let request = SheetRequest::new("three_column", "STORE1", "Dana").with_title("T-109");
    let doc = generator.generate(&records(50), &request, date()).unwrap();

    for page in doc.pages() {
        let texts: Vec<&str> = page
            .ops
            .iter()
            .filter_map(|op| match op {
                PageOp::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect();
        let page_label = format!("Page: {}", page.number);
        let footer = format!("Page {} of {}", page.number, doc.page_count());
        assert!(texts.contains(&"Harbour Chandler"));
        assert!(texts.contains(&"Vendor: Downtown"));
        assert!(texts.contains(&"Date: 03/05/2024"));
        assert!(texts.contains(&"Transfer # T-109"));
        assert!(texts.contains(&page_label.as_str()));
        assert!(texts.contains(&footer.as_str()));
    }
}

#[test]
fn test_logo_embedded_when_present() {
    let jpeg: Vec<u8> = vec![
        0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x10, 0x00, 0x20, 0x03, 0x01, 0x22,
        0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01, 0xFF, 0xD9,
    ];
    let path = std::env::temp_dir().join("transfer_sheet_test_logo.jpg");
    std::fs::write(&path, &jpeg).unwrap();

    let config = SheetConfig {
        logo: Some(path.clone()),
        ..SheetConfig::default()
    };
    let generator = SheetGenerator::new(config).unwrap();
    let request = SheetRequest::new("three_column", "STORE1", "Dana").with_title("T-110");
    let doc = generator.generate(&records(30), &request, date()).unwrap();
    std::fs::remove_file(&path).ok();

    for page in doc.pages() {
        assert!(page.ops.iter().any(|op| matches!(op, PageOp::Image(_))));
    }

    let pdf = lopdf::Document::load_mem(doc.bytes()).unwrap();
    let page_id = pdf.get_pages()[&1];
    let content = String::from_utf8_lossy(&pdf.get_page_content(page_id).unwrap()).into_owned();
    assert!(content.contains("/Im1 Do"));
}

#[test]
fn test_missing_logo_still_renders() {
    let config = SheetConfig {
        logo: Some("/nonexistent/logo.png".into()),
        ..SheetConfig::default()
    };
    let generator = SheetGenerator::new(config).unwrap();
    let request = SheetRequest::new("three_column", "STORE1", "Dana").with_title("T-111");
    let doc = generator.generate(&records(3), &request, date()).unwrap();

    assert_eq!(doc.page_count(), 1);
    assert!(!doc.pages()[0]
        .ops
        .iter()
        .any(|op| matches!(op, PageOp::Image(_))));
}
