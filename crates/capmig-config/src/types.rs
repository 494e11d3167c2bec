//! Configuration types

use capmig_core::Strategy;
use serde::{Deserialize, Serialize};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub okapi: OkapiConfig,
    pub eureka: EurekaConfig,
    pub migration: MigrationConfig,
    pub report: ReportConfig,
}

/// Okapi (legacy platform) connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OkapiConfig {
    pub url: String,
    pub tenant: String,
    pub username: String,
    pub password: String,
    /// Login-token time to live, seconds
    pub token_ttl_secs: u64,
    /// Collection page size for paginated loads
    pub page_size: usize,
}

impl Default for OkapiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            tenant: String::new(),
            username: String::new(),
            password: String::new(),
            token_ttl_secs: 540,
            page_size: 500,
        }
    }
}

/// Eureka (target platform) connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EurekaConfig {
    pub url: String,
    pub page_size: usize,
}

impl Default for EurekaConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            page_size: 500,
        }
    }
}

/// Migration behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub strategy: Strategy,
    /// Enables the JWT-size safety valve
    pub enforce_token_limit: bool,
    /// Maximum serialized token payload length
    pub max_token_length: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Distributed,
            enforce_token_limit: false,
            max_token_length: 4096,
        }
    }
}

/// Report output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: "./capmig-out".to_string(),
        }
    }
}
