//! `capmig graph` - GEXF export of the permission nesting graph

use std::path::PathBuf;

use capmig_config::AppConfig;
use capmig_core::Classifier;
use tracing::info;

use crate::commands::{load_snapshot, Command};
use crate::error::CliResult;

pub struct GraphCommand {
    pub config: AppConfig,
    pub snapshot: Option<PathBuf>,
    pub out: Option<PathBuf>,
}

#[async_trait::async_trait]
impl Command for GraphCommand {
    async fn execute(&self) -> CliResult<()> {
        let snapshot = load_snapshot(&self.config, &self.snapshot).await?;
        let analysis = Classifier::new().classify_snapshot(&snapshot);

        let out = self.out.clone().unwrap_or_else(|| {
            PathBuf::from(&self.config.report.output_dir).join("permissions.gexf")
        });
        capmig_reports::gexf::write(&out, &analysis)?;
        info!(path = %out.display(), nodes = analysis.len(), "graph written");
        println!("wrote {}", out.display());
        Ok(())
    }
}
