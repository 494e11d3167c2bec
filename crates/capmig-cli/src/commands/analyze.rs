//! `capmig analyze` - classify permission sets and write the analysis

use std::path::PathBuf;

use capmig_config::AppConfig;
use capmig_core::Classifier;
use tracing::info;

use crate::commands::{load_snapshot, Command};
use crate::error::CliResult;

pub struct AnalyzeCommand {
    pub config: AppConfig,
    pub snapshot: Option<PathBuf>,
    pub save_snapshot: Option<PathBuf>,
    pub out: Option<PathBuf>,
}

#[async_trait::async_trait]
impl Command for AnalyzeCommand {
    async fn execute(&self) -> CliResult<()> {
        let snapshot = load_snapshot(&self.config, &self.snapshot).await?;

        if let Some(path) = &self.save_snapshot {
            capmig_reports::write_gzip_json(path, &snapshot)?;
            info!(path = %path.display(), "snapshot saved");
        }

        let analysis = Classifier::new().classify_snapshot(&snapshot);
        let report = analysis.report();

        let out = self.out.clone().unwrap_or_else(|| {
            PathBuf::from(&self.config.report.output_dir).join("analysis.json")
        });
        capmig_reports::write_pretty_json(&out, &report)?;
        info!(path = %out.display(), "analysis written");

        let counts = &report.counts;
        println!(
            "classified {} permission names: {} mutable, {} okapi, {} deprecated, \
             {} questionable, {} invalid, {} unprocessed ({} system names excluded)",
            analysis.len(),
            counts.mutable,
            counts.okapi,
            counts.deprecated,
            counts.questionable,
            counts.invalid,
            counts.unprocessed,
            analysis.system_names().len(),
        );
        Ok(())
    }
}
