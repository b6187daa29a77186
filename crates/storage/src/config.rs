//! Configuration for the Elassandra storage layer.
//!
//! Connection endpoints live here; security material (trust stores, client
//! identity, credentials) is environment-driven and handled separately by
//! [`crate::security`].

use serde::{Deserialize, Serialize};

/// Configuration for the storage backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Cassandra contact point, `host:port` (default: `127.0.0.1:9042`).
    #[serde(default = "default_contact_point")]
    pub contact_point: String,

    /// Elasticsearch node URL (default: `http://localhost:9200`).
    #[serde(default = "default_elasticsearch_url")]
    pub elasticsearch_url: String,

    /// Request timeout for the Elasticsearch client, in milliseconds
    /// (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_contact_point() -> String {
    "127.0.0.1:9042".to_string()
}

fn default_elasticsearch_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            contact_point: default_contact_point(),
            elasticsearch_url: default_elasticsearch_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl StorageConfig {
    /// Returns the host part of the contact point, used as the TLS server
    /// name when the CQL transport is encrypted.
    pub fn contact_host(&self) -> &str {
        self.contact_point
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or(&self.contact_point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.contact_point, "127.0.0.1:9042");
        assert_eq!(config.elasticsearch_url, "http://localhost:9200");
        assert_eq!(config.request_timeout_ms, 30000);
    }

    #[test]
    fn test_contact_host() {
        let config = StorageConfig {
            contact_point: "cassandra.local:9042".into(),
            ..Default::default()
        };
        assert_eq!(config.contact_host(), "cassandra.local");

        let bare = StorageConfig {
            contact_point: "cassandra.local".into(),
            ..Default::default()
        };
        assert_eq!(bare.contact_host(), "cassandra.local");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"contact_point": "db:9042"}"#).unwrap();
        assert_eq!(config.contact_point, "db:9042");
        assert_eq!(config.elasticsearch_url, "http://localhost:9200");
    }
}
