//! prsync CLI entrypoint.

use std::io::{self, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use prsync::{OperationMode, PrsyncConfig, ServiceError};
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ignored = writeln!(io::stderr().lock(), "error[{}]: {error}", error.code());
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ServiceError> {
    let config = load_config()?;

    match config.operation_mode() {
        OperationMode::MigrateDatabase => cli::migrations::run(&config),
        OperationMode::Sync => cli::sync::run(&config).await,
        OperationMode::Prepare => cli::prepare::run(&config).await,
        OperationMode::Promote => cli::promote::run(&config).await,
    }
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`ServiceError::ValidationFailed`] when ortho-config fails to
/// parse arguments or load configuration files.
fn load_config() -> Result<PrsyncConfig, ServiceError> {
    PrsyncConfig::load().map_err(|error| ServiceError::validation(error.to_string()))
}
