//! Transfer Sheet Generator
//!
//! Generates a five-column transfer sheet from a handful of records that
//! use mixed field names, the way spreadsheet exports and API payloads do.
//!
//! Run with: RUST_LOG=info cargo run --example transfer_sheet

use serde_json::json;
use transfer_sheet::{RawRecord, SheetConfig, SheetGenerator, SheetRequest};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    std::fs::create_dir_all("output")?;

    let config = SheetConfig::from_json(
        r#"{
            "issuer": ["Harbour Chandler", "52 Esplanade", "Nanaimo, BC"],
            "logo": "assets/logo.png",
            "locationNames": {"STORE1": "Downtown", "WH2": "North Warehouse"}
        }"#,
    )?;
    let generator = SheetGenerator::new(config)?;

    // Spreadsheet-style rows and API-style objects side by side
    let payload = json!([
        {"Stock Transfer": "T-2041", "Quantity": 4, "SKU": "SH-0516", "Product": "Galvanized anchor shackle 5/16\"", "Transfer Bin Location": "A-03", "Retail Price": "$12.50"},
        {"QTY": 2, "Variant SKU": "RP-1200", "Title": "Three-strand nylon rope, 12 mm x 30 m, white", "Bin": "C-11", "Price": 89.0},
        {"quantity": "10", "sku": "FN-M8", "title": "Stainless wing nut M8", "bin_location": "B-07", "price": "1.25"},
        {"Quantity": 1, "SKU": "BP-900", "Product": "Bilge pump 900 GPH with float switch, wiring harness and mounting hardware for small craft", "Bin Location": "D-02", "Retail Price": "1,049.99"}
    ]);
    let records: Vec<RawRecord> = serde_json::from_value(payload)?;

    let request = SheetRequest::new("five_column", "WH2", "Dana");
    let document = generator.generate_today(&records, &request)?;

    let output_path = format!("output/{}", document.file_name());
    std::fs::write(&output_path, document.bytes())?;

    println!(
        "Generated: {output_path} ({} rows, {} pages)",
        document.data_row_count(),
        document.page_count()
    );

    Ok(())
}
