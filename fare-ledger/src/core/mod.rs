//! Core: configuration, environment setup and application state

pub mod config;
pub mod state;

pub use config::Config;
pub use state::LedgerApp;

use shared::error::{AppError, AppResult};

/// Load `.env`, create the working directories and start logging
///
/// Call before [`Config::from_env`] so values from `.env` are visible.
pub fn setup_environment() -> AppResult<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env();

    std::fs::create_dir_all(&config.work_dir)
        .map_err(|e| AppError::config(format!("Failed to create work dir: {e}")))?;
    std::fs::create_dir_all(&config.log_dir)
        .map_err(|e| AppError::config(format!("Failed to create log dir: {e}")))?;

    crate::utils::init_logger_with_file(Some(&config.log_level), Some(&config.log_dir));
    tracing::info!(
        work_dir = %config.work_dir,
        environment = %config.environment,
        "Environment ready"
    );
    Ok(())
}
