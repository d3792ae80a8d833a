pub mod config;
pub mod constants;
pub mod error;
pub mod infra;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod types;

pub use config::{Config, ExtractionConfig};
pub use error::{Result, ScraperError};
pub use pipeline::ExtractionPipeline;
pub use schema::{CanonicalField, CanonicalSchema, CanonicalSpec, CanonicalSpecSet, Provenance};
pub use types::{ProductRecord, RawAttribute, RawAttributeSet, SourceKind, Technology};
