//! Configuration for the capmig migration tool.
//!
//! Settings come from an optional TOML file layered under `CAPMIG_*`
//! environment variables, deserialized into [`AppConfig`] and validated
//! before a run starts.

pub mod error;
pub mod loader;
pub mod types;

pub use error::{ConfigError, Result};
pub use loader::{validate, ConfigLoader};
pub use types::{AppConfig, EurekaConfig, MigrationConfig, OkapiConfig, ReportConfig};
