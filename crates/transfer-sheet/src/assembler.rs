//! Document assembly
//!
//! [`DocumentAssembler`] validates a request, drives the decorator and the
//! layout engine across pages and renders the result. [`SheetGenerator`]
//! adds the record side on top: title resolution and normalization.

use crate::decorator::{DecoratedPages, Masthead, PageDecorator, PageGeometry};
use crate::layout::{PageOp, RowKind, RowOp, TableLayout, TableStyle};
use crate::normalize::{normalize, resolve_title};
use crate::presets::PresetRegistry;
use crate::renderer::PdfRenderer;
use crate::schema::{CanonicalLineItem, DocumentMetadata, RawRecord, SheetConfig, SheetRequest};
use crate::Result;
use chrono::NaiveDate;
use sheet_text::{MetricsRegistry, TextMeasurer};
use std::sync::Arc;

/// One finished page and its draw operations
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub number: usize,
    pub ops: Vec<PageOp>,
}

impl RenderedPage {
    /// Header and data rows on this page, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &RowOp> {
        self.ops.iter().filter_map(|op| match op {
            PageOp::Row(row) => Some(row),
            _ => None,
        })
    }

    /// Data rows on this page
    pub fn data_rows(&self) -> impl Iterator<Item = &RowOp> {
        self.rows().filter(|row| row.kind != RowKind::Header)
    }
}

/// A finished document: its pages, metadata and PDF bytes
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    metadata: DocumentMetadata,
    pages: Vec<RenderedPage>,
    bytes: Vec<u8>,
}

impl RenderedDocument {
    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn pages(&self) -> &[RenderedPage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of data rows across all pages
    pub fn data_row_count(&self) -> usize {
        self.pages.iter().map(|p| p.data_rows().count()).sum()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Suggested file name: the title with whitespace replaced by underscores
    pub fn file_name(&self) -> String {
        let stem: String = self
            .metadata
            .title
            .trim()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        format!("{stem}.pdf")
    }
}

/// Group a flat op sequence into pages at each `BeginPage`
fn split_pages(ops: Vec<PageOp>) -> Vec<RenderedPage> {
    let mut pages: Vec<RenderedPage> = Vec::new();
    for op in ops {
        match op {
            PageOp::BeginPage { number } => pages.push(RenderedPage {
                number,
                ops: Vec::new(),
            }),
            op => match pages.last_mut() {
                Some(page) => page.ops.push(op),
                None => pages.push(RenderedPage {
                    number: 1,
                    ops: vec![op],
                }),
            },
        }
    }
    pages
}

/// Drives decoration, layout and rendering for one document at a time
///
/// Holds only read-only state, so one assembler can serve concurrent
/// requests.
pub struct DocumentAssembler {
    registry: PresetRegistry,
    decorator: PageDecorator,
    measurer: Arc<dyn TextMeasurer>,
    style: TableStyle,
    renderer: PdfRenderer,
}

impl DocumentAssembler {
    pub fn new(
        registry: PresetRegistry,
        decorator: PageDecorator,
        measurer: Arc<dyn TextMeasurer>,
        style: TableStyle,
    ) -> Self {
        let renderer = PdfRenderer::new(*decorator.geometry());
        Self {
            registry,
            decorator,
            measurer,
            style,
            renderer,
        }
    }

    pub fn registry(&self) -> &PresetRegistry {
        &self.registry
    }

    pub fn decorator(&self) -> &PageDecorator {
        &self.decorator
    }

    /// Assemble a document from canonical line items
    ///
    /// Metadata is validated and the preset resolved before anything is
    /// drawn. On error nothing is returned.
    pub fn assemble(
        &self,
        items: &[CanonicalLineItem],
        preset_name: &str,
        metadata: &DocumentMetadata,
    ) -> Result<RenderedDocument> {
        metadata.validate()?;
        let preset = self.registry.get_preset(preset_name)?;

        let mut factory = DecoratedPages::new(&self.decorator, metadata);
        let ops = TableLayout::new(preset, self.measurer.as_ref(), &self.style)
            .layout(items, &mut factory)?;

        let mut pages = split_pages(ops);
        let total = pages.len();
        for page in &mut pages {
            page.ops
                .push(PageOp::Text(self.decorator.footer(page.number, total)));
        }

        let title = self.decorator.display_title(metadata);
        let bytes = self.renderer.render(&pages, metadata, &title)?;

        log::info!(
            "Assembled '{}': {} items on {} pages with preset '{}'",
            metadata.title,
            items.len(),
            total,
            preset.name
        );

        Ok(RenderedDocument {
            metadata: metadata.clone(),
            pages,
            bytes,
        })
    }
}

/// Generates transfer sheets from raw records
///
/// # Example
///
/// ```ignore
/// let generator = SheetGenerator::new(SheetConfig::default())?;
/// let request = SheetRequest::new("three_column", "STORE1", "Dana").with_title("T-100");
/// let document = generator.generate(&records, &request, date)?;
/// ```
pub struct SheetGenerator {
    config: SheetConfig,
    assembler: DocumentAssembler,
}

impl SheetGenerator {
    /// Generator using the shared built-in font metrics
    pub fn new(config: SheetConfig) -> Result<Self> {
        Self::with_measurer(config, MetricsRegistry::shared())
    }

    /// Generator with a custom text measurer
    pub fn with_measurer(config: SheetConfig, measurer: Arc<dyn TextMeasurer>) -> Result<Self> {
        let mut registry = PresetRegistry::builtin();
        for preset in &config.presets {
            registry.register(preset.clone())?;
        }

        let masthead = Masthead::from_config(&config);
        let decorator = PageDecorator::new(PageGeometry::A4, masthead, Arc::clone(&measurer));
        let style = TableStyle {
            currency_symbol: config.currency_symbol.clone(),
            ..TableStyle::default()
        };

        Ok(Self {
            assembler: DocumentAssembler::new(registry, decorator, measurer, style),
            config,
        })
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn registry(&self) -> &PresetRegistry {
        self.assembler.registry()
    }

    pub fn assembler(&self) -> &DocumentAssembler {
        &self.assembler
    }

    /// Generate a document dated `date`
    pub fn generate(
        &self,
        records: &[RawRecord],
        request: &SheetRequest,
        date: NaiveDate,
    ) -> Result<RenderedDocument> {
        let title = resolve_title(request.title.as_deref(), records, &self.config.aliases)?;
        let metadata = DocumentMetadata::new(&title, &request.vendor, &request.clerk, date);

        let items: Vec<CanonicalLineItem> = records
            .iter()
            .map(|record| normalize(record, &self.config.aliases))
            .collect();
        log::debug!("Normalized {} records for '{title}'", items.len());

        self.assembler
            .assemble(&items, &request.preset_name, &metadata)
    }

    /// Generate a document dated today (local time)
    pub fn generate_today(
        &self,
        records: &[RawRecord],
        request: &SheetRequest,
    ) -> Result<RenderedDocument> {
        self.generate(records, request, chrono::Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SheetError;
    use pretty_assertions::assert_eq;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn generator() -> SheetGenerator {
        SheetGenerator::new(SheetConfig::default()).unwrap()
    }

    #[test]
    fn test_split_pages() {
        let ops = vec![
            PageOp::BeginPage { number: 1 },
            PageOp::Row(RowOp {
                kind: RowKind::Header,
                top: 68.0,
                height: 10.0,
                cells: Vec::new(),
            }),
            PageOp::BeginPage { number: 2 },
            PageOp::BeginPage { number: 3 },
        ];
        let pages = split_pages(ops);
        let numbers: Vec<usize> = pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(pages[0].ops.len(), 1);
        assert!(pages[1].ops.is_empty());
    }

    #[test]
    fn test_file_name() {
        let metadata = DocumentMetadata::new(" Transfer 12\tB ", "S", "C", date());
        let doc = generator()
            .assembler()
            .assemble(&[], "three_column", &metadata)
            .unwrap();
        assert_eq!(doc.file_name(), "Transfer_12_B.pdf");
    }

    #[test]
    fn test_footer_on_every_page() {
        let items = vec![CanonicalLineItem::default(); 30];
        let metadata = DocumentMetadata::new("T-1", "S", "C", date());
        let doc = generator()
            .assembler()
            .assemble(&items, "three_column", &metadata)
            .unwrap();

        assert_eq!(doc.page_count(), 2);
        for page in doc.pages() {
            let footer = format!("Page {} of 2", page.number);
            assert!(matches!(page.ops.last(), Some(PageOp::Text(t)) if t.text == footer));
        }
    }

    #[test]
    fn test_validation_before_preset() {
        let metadata = DocumentMetadata::new("T-1", "", "C", date());
        let err = generator()
            .assembler()
            .assemble(&[], "no_such_preset", &metadata)
            .unwrap_err();
        assert!(matches!(err, SheetError::Validation(_)));
    }

    #[test]
    fn test_unknown_preset() {
        let request = SheetRequest::new("two_column", "S", "C").with_title("T-1");
        let err = generator().generate(&[], &request, date()).unwrap_err();
        assert!(matches!(err, SheetError::Config(_)));
    }

    #[test]
    fn test_config_presets_registered() {
        let config = SheetConfig::from_json(
            r#"{"presets": [{"name": "two_column", "columns": [
                {"key": "quantity", "headerLabel": "QTY", "width": 40, "align": "center"},
                {"key": "description", "headerLabel": "Title", "width": 150, "wrap": true}
            ]}]}"#,
        )
        .unwrap();
        let generator = SheetGenerator::new(config).unwrap();
        assert_eq!(
            generator.registry().names(),
            vec!["five_column", "four_column", "three_column", "two_column"]
        );

        let request = SheetRequest::new("two_column", "S", "C").with_title("T-1");
        let doc = generator.generate(&[], &request, date()).unwrap();
        assert_eq!(doc.pages()[0].rows().next().map(|r| r.cells.len()), Some(2));
    }

    #[test]
    fn test_config_preset_too_wide() {
        let config = SheetConfig::from_json(
            r#"{"presets": [{"name": "wide", "columns": [
                {"key": "quantity", "headerLabel": "QTY", "width": 200}
            ]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            SheetGenerator::new(config),
            Err(SheetError::Config(_))
        ));
    }

    #[test]
    fn test_currency_symbol_from_config() {
        let config = SheetConfig {
            currency_symbol: "€".to_string(),
            ..SheetConfig::default()
        };
        let generator = SheetGenerator::new(config).unwrap();
        let mut record = RawRecord::new();
        record.insert("Price".to_string(), serde_json::json!("4.5"));

        let request = SheetRequest::new("five_column", "S", "C").with_title("T-1");
        let doc = generator.generate(&[record], &request, date()).unwrap();
        let row = doc.pages()[0].data_rows().next().unwrap();
        assert_eq!(row.cells[3].texts[0].text, "€4.50");
    }
}
