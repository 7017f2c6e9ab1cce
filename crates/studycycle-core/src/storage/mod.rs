mod config;
pub mod database;

pub use config::{Config, NotificationsConfig, Preset, Theme};
pub use database::{Database, LogEntry};

use std::path::PathBuf;

/// Returns `~/.config/studycycle[-dev]/` based on STUDYCYCLE_ENV.
///
/// Set STUDYCYCLE_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYCYCLE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studycycle-dev")
    } else {
        base_dir.join("studycycle")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
