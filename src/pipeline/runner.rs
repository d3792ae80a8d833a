use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use super::ingestion::http_client::PageFetcher;
use super::ExtractionPipeline;
use crate::types::ProductRecord;

/// Result of one batch run.
#[derive(Debug, Serialize)]
pub struct ScrapeReport {
    pub total: usize,
    pub records: Vec<ProductRecord>,
    /// URLs whose page could not be fetched.
    pub skipped: Vec<String>,
}

/// Fetches product pages and runs each through the extraction pipeline.
pub struct ScrapeRunner {
    fetcher: Arc<dyn PageFetcher>,
    pipeline: ExtractionPipeline,
}

impl ScrapeRunner {
    pub fn new(fetcher: Arc<dyn PageFetcher>, pipeline: ExtractionPipeline) -> Self {
        Self { fetcher, pipeline }
    }

    pub fn pipeline(&self) -> &ExtractionPipeline {
        &self.pipeline
    }

    /// Fetch and extract one page. `None` when the page is unavailable.
    #[instrument(skip(self))]
    pub async fn scrape_one(&self, url: &str) -> Option<ProductRecord> {
        let Some(markup) = self.fetcher.fetch(url).await else {
            warn!("Skipping {}: page unavailable", url);
            counter!("racket_pages_skipped_total").increment(1);
            return None;
        };
        counter!("racket_pages_fetched_total").increment(1);

        let record = self.pipeline.extract(url, Some(&markup));
        counter!("racket_records_extracted_total").increment(1);
        info!(
            "Extracted '{}' with {} specifications",
            record.name(),
            record.canonical_specs().len()
        );
        Some(record)
    }

    /// Processes URLs in order. Pages are independent; one failure never
    /// affects another.
    pub async fn run(&self, urls: &[String]) -> ScrapeReport {
        info!("🚀 Starting scrape of {} product pages", urls.len());
        let started = Instant::now();

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for url in urls {
            match self.scrape_one(url).await {
                Some(record) => records.push(record),
                None => skipped.push(url.clone()),
            }
        }

        let secs = started.elapsed().as_secs_f64();
        histogram!("racket_scrape_duration_seconds").record(secs);
        info!(
            "✅ Scrape finished in {:.1}s: {} records, {} skipped",
            secs,
            records.len(),
            skipped.len()
        );

        ScrapeReport {
            total: urls.len(),
            records,
            skipped,
        }
    }
}
