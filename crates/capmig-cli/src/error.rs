//! CLI-specific errors

use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] capmig_config::ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] capmig_http::HttpError),

    #[error("Report error: {0}")]
    Report(#[from] capmig_reports::ReportError),

    #[error("Core error: {0}")]
    Core(#[from] capmig_core::Error),

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// User-facing rendering with a next-step hint where one exists
    pub fn user_message(&self) -> String {
        match self {
            CliError::Config(e) => {
                format!("Configuration error: {e}\n\nCheck your config file or CAPMIG_* environment variables.")
            }
            CliError::Http(e) => {
                format!("Request failed: {e}\n\nCheck the okapi/eureka URLs and credentials in your configuration.")
            }
            CliError::Report(e) => format!("Report writing failed: {e}"),
            CliError::Core(e) => format!("Processing failed: {e}"),
            CliError::InvalidArgument { message } => {
                format!("Invalid argument: {message}\n\nRun 'capmig --help' for usage information.")
            }
            CliError::Io(e) => format!("File operation failed: {e}"),
        }
    }
}
