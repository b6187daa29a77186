//! Server configuration for the BasketApp HTTP API.
//!
//! Configuration comes from command line arguments with environment
//! variable fallbacks, or programmatically for tests.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BASKETAPP_SERVER_PORT` | 8080 | Server port |
//! | `BASKETAPP_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `BASKETAPP_LOG_LEVEL` | info | Log level |
//! | `BASKETAPP_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `BASKETAPP_ENABLE_CORS` | true | Enable CORS |
//! | `BASKETAPP_CORS_ORIGINS` | * | Allowed origins |
//! | `BASKETAPP_CASSANDRA_CONTACT_POINT` | 127.0.0.1:9042 | Cassandra node |
//! | `BASKETAPP_ELASTICSEARCH_URL` | http://localhost:9200 | Search endpoint |
//!
//! Security material (trust stores, credentials) is read separately from
//! the `ELASSANDRA_*` variables by the storage crate.

use basketapp_storage::StorageConfig;
use clap::Parser;

/// Server configuration for the BasketApp HTTP API.
#[derive(Debug, Clone, Parser)]
#[command(name = "basketapp")]
#[command(about = "BasketApp HTTP server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "BASKETAPP_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "BASKETAPP_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "BASKETAPP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Request timeout in seconds.
    #[arg(long, env = "BASKETAPP_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "BASKETAPP_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "BASKETAPP_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Cassandra contact point, `host:port`.
    #[arg(
        long,
        env = "BASKETAPP_CASSANDRA_CONTACT_POINT",
        default_value = "127.0.0.1:9042"
    )]
    pub cassandra_contact_point: String,

    /// Elasticsearch node URL.
    #[arg(
        long,
        env = "BASKETAPP_ELASTICSEARCH_URL",
        default_value = "http://localhost:9200"
    )]
    pub elasticsearch_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cassandra_contact_point: "127.0.0.1:9042".to_string(),
            elasticsearch_url: "http://localhost:9200".to_string(),
        }
    }
}

impl ServerConfig {
    /// Creates a configuration suitable for tests: short timeout, default
    /// endpoints.
    pub fn for_testing() -> Self {
        Self {
            request_timeout: 5,
            ..Default::default()
        }
    }

    /// The socket address to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Derives the storage-layer configuration.
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            contact_point: self.cassandra_contact_point.clone(),
            elasticsearch_url: self.elasticsearch_url.clone(),
            ..Default::default()
        }
    }

    /// Validates the configuration, returning a list of problems.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.port == 0 {
            errors.push("port must be non-zero".to_string());
        }
        if self.host.is_empty() {
            errors.push("host must not be empty".to_string());
        }
        if self.request_timeout == 0 {
            errors.push("request timeout must be non-zero".to_string());
        }
        if !self.cassandra_contact_point.contains(':') {
            errors.push(format!(
                "cassandra contact point '{}' must be host:port",
                self.cassandra_contact_point
            ));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig {
            host: "0.0.0.0".into(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let config = ServerConfig {
            port: 0,
            host: String::new(),
            request_timeout: 0,
            cassandra_contact_point: "no-port".into(),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_storage_config_carries_endpoints() {
        let config = ServerConfig {
            cassandra_contact_point: "db:9042".into(),
            elasticsearch_url: "https://search:9200".into(),
            ..Default::default()
        };
        let storage = config.storage_config();
        assert_eq!(storage.contact_point, "db:9042");
        assert_eq!(storage.elasticsearch_url, "https://search:9200");
    }
}
