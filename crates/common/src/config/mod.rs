//! Configuration management for the portal services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Document store configuration
    pub document_store: DocumentStoreConfig,

    /// Object store configuration
    pub object_store: ObjectStoreConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Upload ceilings
    pub uploads: UploadConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentStoreConfig {
    /// Base URL of the document database REST API
    pub base_url: String,

    /// API key sent with every request (optional for emulators)
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObjectStoreConfig {
    /// Base URL of the binary hosting service
    pub base_url: String,

    /// Unsigned upload preset name
    pub upload_preset: String,

    /// API key required for deletions (uploads work without it;
    /// deletions degrade to best-effort when absent)
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Base URL of the identity provider REST API
    pub provider_url: String,

    /// JWT secret for session token signing
    pub jwt_secret: Option<String>,

    /// JWT expiration in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Maximum accepted image size in bytes
    #[serde(default = "default_image_max_bytes")]
    pub image_max_bytes: usize,

    /// Maximum accepted PDF size in bytes
    #[serde(default = "default_pdf_max_bytes")]
    pub pdf_max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_store_timeout() -> u64 { 30 }
fn default_jwt_expiration() -> u64 { 3600 }
fn default_image_max_bytes() -> usize { 10 * 1024 * 1024 }
fn default_pdf_max_bytes() -> usize { 50 * 1024 * 1024 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "society-portal".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Get document store request timeout as Duration
    pub fn document_store_timeout(&self) -> Duration {
        Duration::from_secs(self.document_store.timeout_secs)
    }

    /// Get object store request timeout as Duration
    pub fn object_store_timeout(&self) -> Duration {
        Duration::from_secs(self.object_store.timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                shutdown_timeout_secs: default_shutdown_timeout(),
            },
            document_store: DocumentStoreConfig {
                base_url: "http://localhost:9800".to_string(),
                api_key: None,
                timeout_secs: default_store_timeout(),
            },
            object_store: ObjectStoreConfig {
                base_url: "http://localhost:9801".to_string(),
                upload_preset: "portal_unsigned".to_string(),
                api_key: None,
                timeout_secs: default_store_timeout(),
            },
            auth: AuthConfig {
                provider_url: "http://localhost:9802".to_string(),
                jwt_secret: None,
                jwt_expiration_secs: default_jwt_expiration(),
            },
            uploads: UploadConfig {
                image_max_bytes: default_image_max_bytes(),
                pdf_max_bytes: default_pdf_max_bytes(),
            },
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                metrics_port: default_metrics_port(),
                service_name: default_service_name(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.uploads.image_max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.uploads.pdf_max_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_timeouts_as_durations() {
        let config = AppConfig::default();
        assert_eq!(config.document_store_timeout(), Duration::from_secs(30));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
    }
}
