// Product page pipeline: ingestion (fetching, discovery), processing (extraction
// through assembly), and the runner that ties them together

pub mod ingestion;
pub mod processing;
pub mod runner;

use scraper::Html;
use tracing::{debug, warn};

use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::schema::{CanonicalSchema, CanonicalSpecSet};
use crate::types::{PageMetadata, ProductRecord, RawAttributeSet};
use processing::aggregate::aggregate_sources;
use processing::assemble::assemble;
use processing::markup::{extraction_scope, flatten_lines, text_lines};
use processing::metadata::extract_metadata;
use processing::normalize::Resolver;
use processing::structural::extract_structural_attributes;
use processing::textual::extract_text_attributes;

/// Turns one product page into a `ProductRecord`.
///
/// Holds only read-only configuration, so one instance can serve any number
/// of pages, including concurrently. Every call starts from empty state.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    config: ExtractionConfig,
    schema: CanonicalSchema,
}

impl ExtractionPipeline {
    /// Validates the schema up front; a bad alias table never reaches a page.
    pub fn new(config: ExtractionConfig, schema: CanonicalSchema) -> Result<Self> {
        schema.validate()?;
        Ok(Self { config, schema })
    }

    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extracts a record from fetched markup. Missing markup (fetch failure)
    /// yields a record with only the url set.
    pub fn extract(&self, url: &str, markup: Option<&str>) -> ProductRecord {
        match markup {
            Some(markup) => self.extract_document(url, &Html::parse_document(markup)),
            None => {
                warn!("No markup for {}, emitting empty record", url);
                assemble(url, PageMetadata::default(), CanonicalSpecSet::default())
            }
        }
    }

    pub fn extract_document(&self, url: &str, document: &Html) -> ProductRecord {
        let raw = self.raw_attributes(document);
        let metadata = extract_metadata(document, url, &self.schema);
        let specs = Resolver::new(&self.schema).resolve(&raw, &metadata.description_text);
        debug!(
            "Extracted {} raw attributes and {} canonical fields from {}",
            raw.len(),
            specs.len(),
            url
        );
        assemble(url, metadata, specs)
    }

    /// Runs the textual extractor and resolver over plain description text.
    /// No structural sources exist in this mode.
    pub fn extract_from_text(&self, url: &str, text: &str) -> ProductRecord {
        let textual = extract_text_attributes(&text_lines(text), &self.config);
        let raw = aggregate_sources(Vec::new(), textual);
        let specs = Resolver::new(&self.schema).resolve(&raw, text);
        let metadata = PageMetadata {
            description_text: text.to_string(),
            ..PageMetadata::default()
        };
        assemble(url, metadata, specs)
    }

    /// Structural and textual candidates for a page, in priority order.
    pub fn raw_attributes(&self, document: &Html) -> RawAttributeSet {
        let scope = extraction_scope(document);
        let structural = extract_structural_attributes(&scope, self.config.exhaustive_structural);
        let textual = extract_text_attributes(&flatten_lines(&scope), &self.config);
        aggregate_sources(structural, textual)
    }
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self {
            config: ExtractionConfig::default(),
            schema: CanonicalSchema::builtin(),
        }
    }
}
