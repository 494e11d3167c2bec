//! `capmig report` - full migration report (roles, capabilities, users)

use std::path::PathBuf;

use capmig_config::AppConfig;
use capmig_core::{
    Classifier, RoleSynthesizer, SafetyValve, Strategy, UserRoleResolver,
};
use capmig_reports::{MigrationReport, WorkbookWriter};
use clap::ValueEnum;
use tracing::info;

use crate::commands::{capability_directory, load_snapshot, Command};
use crate::error::CliResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Json,
    Csv,
}

pub struct ReportCommand {
    pub config: AppConfig,
    pub snapshot: Option<PathBuf>,
    pub format: ReportFormat,
    pub strategy: Option<Strategy>,
    pub out: Option<PathBuf>,
}

impl ReportCommand {
    fn strategy(&self) -> Strategy {
        self.strategy.unwrap_or(self.config.migration.strategy)
    }

    fn output_dir(&self) -> PathBuf {
        self.out
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.config.report.output_dir))
    }

    fn safety_valve(&self) -> SafetyValve {
        if self.config.migration.enforce_token_limit {
            SafetyValve::limit(self.config.migration.max_token_length)
        } else {
            SafetyValve::disabled()
        }
    }
}

#[async_trait::async_trait]
impl Command for ReportCommand {
    async fn execute(&self) -> CliResult<()> {
        let strategy = self.strategy();
        let snapshot = load_snapshot(&self.config, &self.snapshot).await?;
        let directory = capability_directory(&self.config).await?;

        let analysis = Classifier::new().classify_snapshot(&snapshot);
        let synthesis =
            RoleSynthesizer::new(&analysis, &directory).synthesize(&snapshot.permission_users);
        let user_roles = UserRoleResolver::new(&analysis, &synthesis.roles, strategy)
            .with_safety_valve(self.safety_valve())
            .resolve()?;

        let report = MigrationReport::new(strategy, analysis.report())
            .with_synthesis(
                synthesis.roles,
                synthesis.assignments,
                synthesis.skipped,
            )
            .with_user_roles(user_roles);

        let dir = self.output_dir();
        match self.format {
            ReportFormat::Json => {
                let path = dir.join("migration-report.json.gz");
                capmig_reports::write_gzip_json(&path, &report)?;
                info!(path = %path.display(), "migration report written");
                println!("wrote {}", path.display());
            }
            ReportFormat::Csv => {
                let written = WorkbookWriter::new(&dir).write(&report)?;
                println!("wrote {} sheets to {}", written.len(), dir.display());
            }
        }
        println!(
            "{} roles synthesized ({} skipped), {} users resolved under '{}' strategy",
            report.roles.len(),
            report.skipped_roles.len(),
            report.user_roles.len(),
            strategy,
        );
        Ok(())
    }
}
