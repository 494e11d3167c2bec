//! Command-line interface definition and dispatch

use std::path::PathBuf;

use capmig_config::{AppConfig, ConfigLoader};
use capmig_core::Strategy;
use clap::{Parser, Subcommand};

use crate::commands::{
    AnalyzeCommand, Command, GraphCommand, MigrateCommand, ReportCommand, ReportFormat,
};
use crate::error::CliResult;

/// capmig - migrate Okapi permission sets to Eureka roles/capabilities
#[derive(Parser, Debug)]
#[command(name = "capmig")]
#[command(about = "Classify Okapi permission sets and migrate them to Eureka roles")]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimize output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Alternate configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Classify permission sets and write the analysis report
    Analyze {
        /// Read the input snapshot from a local gzip JSON file instead
        /// of the Okapi APIs
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,

        /// Save the loaded snapshot for later offline runs
        #[arg(long, value_name = "FILE")]
        save_snapshot: Option<PathBuf>,

        /// Output file for the analysis JSON
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Produce the full migration report (roles, capabilities, users)
    Report {
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
        format: ReportFormat,

        /// Assignment strategy override
        #[arg(long)]
        strategy: Option<Strategy>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Export the permission nesting graph as GEXF
    Graph {
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Replay synthesized roles and user assignments against Eureka
    Migrate {
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,

        /// Assignment strategy override
        #[arg(long)]
        strategy: Option<Strategy>,

        /// Log the migration calls without performing them
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    pub fn load_config(&self) -> CliResult<AppConfig> {
        let loader = match &self.config {
            Some(path) => ConfigLoader::with_path(path.clone()),
            None => ConfigLoader::new(),
        };
        Ok(loader.load()?)
    }
}

/// Builds the handler for the parsed command and runs it
pub async fn route(cli: Cli) -> CliResult<()> {
    let config = cli.load_config()?;
    match cli.command {
        Commands::Analyze {
            snapshot,
            save_snapshot,
            out,
        } => {
            AnalyzeCommand {
                config,
                snapshot,
                save_snapshot,
                out,
            }
            .execute()
            .await
        }
        Commands::Report {
            snapshot,
            format,
            strategy,
            out,
        } => {
            ReportCommand {
                config,
                snapshot,
                format,
                strategy,
                out,
            }
            .execute()
            .await
        }
        Commands::Graph { snapshot, out } => {
            GraphCommand {
                config,
                snapshot,
                out,
            }
            .execute()
            .await
        }
        Commands::Migrate {
            snapshot,
            strategy,
            dry_run,
        } => {
            MigrateCommand {
                config,
                snapshot,
                strategy,
                dry_run,
            }
            .execute()
            .await
        }
    }
}
