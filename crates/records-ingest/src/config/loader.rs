use std::path::Path;

use crate::config::schema::{Config, IngestConfig};
use crate::error::ConfigError;

const SUPPORTED_VERSION: &str = "1.0";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != SUPPORTED_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    validate_ingest_config(&config.ingest)
}

/// Checks the worker pool and batch limits.
pub fn validate_ingest_config(ingest: &IngestConfig) -> Result<(), ConfigError> {
    if ingest.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "ingest.worker_count must be at least 1".to_string(),
        });
    }
    if ingest.queue_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "ingest.queue_capacity must be at least 1".to_string(),
        });
    }
    if ingest.max_files_per_job == 0 {
        return Err(ConfigError::Validation {
            message: "ingest.max_files_per_job must be at least 1".to_string(),
        });
    }

    Ok(())
}
