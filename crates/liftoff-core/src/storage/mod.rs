pub mod config;
pub mod database;

pub use config::Config;
pub use database::{Database, WorkoutRecord, WorkoutStats};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Environment variable that overrides the data directory outright.
pub const HOME_ENV: &str = "LIFTOFF_HOME";

/// Returns `~/.config/liftoff[-dev]/` based on LIFTOFF_ENV, or `$LIFTOFF_HOME`
/// when set.
///
/// Set LIFTOFF_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os(HOME_ENV) {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("LIFTOFF_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("liftoff-dev")
            } else {
                base_dir.join("liftoff")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
