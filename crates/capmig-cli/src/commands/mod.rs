//! Command handlers for the capmig CLI

pub mod analyze;
pub mod graph;
pub mod migrate;
pub mod report;

use std::path::PathBuf;

pub use analyze::AnalyzeCommand;
pub use graph::GraphCommand;
pub use migrate::MigrateCommand;
pub use report::{ReportCommand, ReportFormat};

use capmig_config::AppConfig;
use capmig_core::LoadSnapshot;
use capmig_http::{CapabilityDirectory, EurekaClient, HttpClient, OkapiClient};
use tracing::{info, warn};

use crate::error::{CliError, CliResult};

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self) -> CliResult<()>;
}

/// Reads the snapshot from a local file, or loads it live from Okapi
pub(crate) async fn load_snapshot(
    config: &AppConfig,
    snapshot: &Option<PathBuf>,
) -> CliResult<LoadSnapshot> {
    match snapshot {
        Some(path) => {
            info!(path = %path.display(), "reading snapshot from file");
            Ok(capmig_reports::read_gzip_json(path)?)
        }
        None => {
            if config.okapi.url.is_empty() || config.okapi.tenant.is_empty() {
                return Err(CliError::InvalidArgument {
                    message: "no --snapshot given and okapi.url/okapi.tenant are not configured"
                        .to_string(),
                });
            }
            let client = OkapiClient::new(HttpClient::with_defaults()?, config.okapi.clone());
            Ok(client.load_snapshot().await?)
        }
    }
}

/// Loads the Eureka capability directory, or an empty one when no
/// Eureka URL is configured (every candidate then reports not-found)
pub(crate) async fn capability_directory(config: &AppConfig) -> CliResult<CapabilityDirectory> {
    if config.eureka.url.is_empty() {
        warn!("eureka.url not configured; capability resolution will find nothing");
        return Ok(CapabilityDirectory::default());
    }
    let client = EurekaClient::new(HttpClient::with_defaults()?, config.eureka.clone());
    Ok(client.capability_directory().await?)
}
