pub mod config;
pub mod database;
pub mod migrations;
pub mod snapshot;

pub use config::{Config, LoggingConfig, ProtocolConfig, StorageBackend, StorageConfig};
pub use database::Database;
pub use snapshot::{migrate_snapshot, SnapshotBackend};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Overrides the data directory entirely when set.
pub const DATA_DIR_ENV: &str = "RITUALTRACK_DATA_DIR";
/// Set to `dev` to use the development data directory.
pub const ENV_ENV: &str = "RITUALTRACK_ENV";

/// Returns `$RITUALTRACK_DATA_DIR` if set, otherwise
/// `~/.config/ritualtrack[-dev]/` based on RITUALTRACK_ENV.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var(ENV_ENV).unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("ritualtrack-dev")
            } else {
                base_dir.join("ritualtrack")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
