pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str, validate_config, validate_ingest_config};
pub use schema::{Config, IngestConfig, LogFormat, LoggingConfig};
