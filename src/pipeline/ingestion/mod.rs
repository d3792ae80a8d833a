// Pipeline ingestion: page fetching, politeness, and collection discovery

pub mod catalog;
pub mod http_client;
pub mod rate_limiter;
