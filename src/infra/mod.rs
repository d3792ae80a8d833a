// Infrastructure adapters for external systems
pub mod import_client;
