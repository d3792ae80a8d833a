use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::constants::*;
use crate::error::{Result, ScraperError};
use crate::schema::CanonicalSchema;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub extraction: ExtractionConfig,
    pub schema: SchemaConfig,
    pub output: OutputConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub delay_ms: u64,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub max_pages: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            delay_ms: DEFAULT_DELAY_MS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_retries: DEFAULT_MAX_RETRIES,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Knobs for the extraction core.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Keep short unclassified "Key: Value" keys from description text.
    /// Raises recall at the cost of admitting some marketing labels.
    pub keep_unclassified_keys: bool,
    /// Lines this long or longer skip the per-line pattern passes.
    pub max_line_len: usize,
    /// Run definition-list and list-item passes even when a table matched.
    pub exhaustive_structural: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            keep_unclassified_keys: true,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            exhaustive_structural: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub version: String,
    /// Extra aliases per canonical display name.
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            aliases: BTreeMap::new(),
        }
    }
}

impl SchemaConfig {
    /// Builds and validates the canonical schema.
    pub fn build(&self) -> Result<CanonicalSchema> {
        CanonicalSchema::with_extra_aliases(&self.version, &self.aliases)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
    pub formats: Vec<OutputFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: DEFAULT_OUTPUT_DIR.to_string(),
            formats: vec![OutputFormat::Json, OutputFormat::Csv],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub endpoint: Option<String>,
    pub batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            batch_size: DEFAULT_IMPORT_BATCH_SIZE,
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Reads the file at `path`, falling back to defaults when it does not exist.
    /// `RACKET_IMPORT_URL` overrides the import endpoint either way.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            Self::from_toml(&content)?
        } else {
            info!("No config file at {}, using defaults", path.display());
            Config::default()
        };

        if let Ok(url) = std::env::var(IMPORT_URL_ENV) {
            if !url.trim().is_empty() {
                config.import.endpoint = Some(url.trim().to_string());
            }
        }

        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.extraction.max_line_len == 0 {
            return Err(ScraperError::Config("extraction.max_line_len must be positive".into()));
        }
        if self.import.batch_size == 0 {
            return Err(ScraperError::Config("import.batch_size must be positive".into()));
        }
        Ok(())
    }
}
