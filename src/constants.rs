/// Fixed tables shared by the extraction passes.
/// Matching against these is case-insensitive unless noted otherwise.

/// Table/definition-list keys that are storefront boilerplate, not product attributes.
pub const KEY_DENYLIST: &[&str] = &["pick up in-store", "orders over"];

/// Description lines containing any of these are dropped before pattern matching.
pub const BOILERPLATE_MARKERS: &[&str] = &["pick up", "shipping", "standard shipping", "orders over"];

/// Keys containing these read like marketing prose and are never kept verbatim.
pub const PROSE_KEY_MARKERS: &[&str] = &["made", "product", "technology"];

/// Lines at or above this length skip the per-line pattern passes.
pub const DEFAULT_MAX_LINE_LEN: usize = 150;

/// Unclassified keys at or above this length are dropped.
pub const MAX_LITERAL_KEY_LEN: usize = 30;

/// Known racket brands, in detection order.
pub const KNOWN_BRANDS: &[&str] = &["Yonex", "Victor", "Li-Ning", "Lining", "Hundred"];

// Scraper defaults
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_DELAY_MS: u64 = 2000;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Safety cap on collection pagination.
pub const DEFAULT_MAX_PAGES: u32 = 20;

pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_IMPORT_BATCH_SIZE: usize = 50;
pub const DEFAULT_CONFIG_PATH: &str = "racket_scraper.toml";

/// Environment variable overriding `[import].endpoint`.
pub const IMPORT_URL_ENV: &str = "RACKET_IMPORT_URL";

/// Version tag of the built-in canonical schema.
pub const SCHEMA_VERSION: &str = "1";
