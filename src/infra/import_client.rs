use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::error::{Result, ScraperError};
use crate::types::{ProductRecord, Technology};

/// Record shape accepted by the racket import endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportPayload {
    pub name: String,
    pub url: String,
    pub image_url: Option<String>,
    pub specifications: BTreeMap<String, String>,
    pub description: String,
    pub price: Option<f64>,
    pub technologies: Vec<Technology>,
}

impl From<&ProductRecord> for ImportPayload {
    fn from(record: &ProductRecord) -> Self {
        let name = if record.name().trim().is_empty() {
            "Unknown".to_string()
        } else {
            record.name().to_string()
        };
        Self {
            name,
            url: record.url().to_string(),
            image_url: record.image_url().map(str::to_string),
            specifications: record.canonical_specs().to_value_map(),
            description: record.description_text().to_string(),
            price: record.price(),
            technologies: record.technologies().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub batches: usize,
    pub sent: usize,
}

/// Posts records to the import endpoint as JSON arrays.
pub struct ImportClient {
    client: reqwest::Client,
    endpoint: String,
    batch_size: usize,
}

impl ImportClient {
    pub fn new(endpoint: &str, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(ScraperError::Config("import batch size must be positive".into()));
        }
        let endpoint = url::Url::parse(endpoint)?.to_string();
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            batch_size,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Stops at the first rejected batch; earlier batches stay imported.
    pub async fn import(&self, records: &[ProductRecord]) -> Result<ImportSummary> {
        let payloads: Vec<ImportPayload> = records.iter().map(ImportPayload::from).collect();
        let mut summary = ImportSummary::default();

        for batch in payloads.chunks(self.batch_size) {
            let response = self.client.post(&self.endpoint).json(batch).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                warn!("Import batch {} rejected with {}: {}", summary.batches + 1, status.as_u16(), body);
                return Err(ScraperError::Api {
                    message: format!("import endpoint returned {}: {}", status.as_u16(), body),
                });
            }
            summary.batches += 1;
            summary.sent += batch.len();
            info!("📤 Imported batch {} ({} records)", summary.batches, batch.len());
        }

        Ok(summary)
    }
}
