//! Configuration module for the PawHaven data core.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;

use crate::errors::AppError;

/// Which key-value backend holds the collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::Validation(format!(
                "Unknown PAWHAVEN_STORE value: {}",
                other
            ))),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Storage backend for the JSON collections
    pub store: StoreBackend,
    /// Seed every collection at start-up
    pub seed_on_start: bool,
    /// User id used when nobody is signed in
    pub demo_user_id: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("PAWHAVEN_DB_PATH")
            .unwrap_or_else(|_| "./data/pawhaven.sqlite".to_string())
            .into();

        let store = match env::var("PAWHAVEN_STORE") {
            Ok(value) => StoreBackend::parse(&value)?,
            Err(_) => StoreBackend::Sqlite,
        };

        let seed_on_start = match env::var("PAWHAVEN_SEED") {
            Ok(value) => parse_bool("PAWHAVEN_SEED", &value)?,
            Err(_) => true,
        };

        let demo_user_id =
            env::var("PAWHAVEN_DEMO_USER").unwrap_or_else(|_| "demo-user".to_string());

        let log_level = env::var("PAWHAVEN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            db_path,
            store,
            seed_on_start,
            demo_user_id,
            log_level,
        })
    }

    /// Configuration for an in-memory platform, used by tests and demos.
    pub fn in_memory() -> Self {
        Self {
            db_path: PathBuf::from(":memory:"),
            store: StoreBackend::Memory,
            seed_on_start: true,
            demo_user_id: "demo-user".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Validation(format!(
            "Invalid boolean for {}: {}",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("PAWHAVEN_DB_PATH");
        env::remove_var("PAWHAVEN_STORE");
        env::remove_var("PAWHAVEN_SEED");
        env::remove_var("PAWHAVEN_DEMO_USER");
        env::remove_var("PAWHAVEN_LOG_LEVEL");

        let config = Config::from_env().unwrap();

        assert_eq!(config.db_path, PathBuf::from("./data/pawhaven.sqlite"));
        assert_eq!(config.store, StoreBackend::Sqlite);
        assert!(config.seed_on_start);
        assert_eq!(config.demo_user_id, "demo-user");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!(StoreBackend::parse("Memory").unwrap(), StoreBackend::Memory);
        assert_eq!(StoreBackend::parse(" sqlite ").unwrap(), StoreBackend::Sqlite);
        assert!(StoreBackend::parse("redis").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "yes").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }
}
