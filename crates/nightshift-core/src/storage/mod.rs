mod config;
pub mod database;
pub mod migrations;

pub use config::{BedtimeConfig, Config, NotificationsConfig, ProbeConfig};
pub use database::{Database, NightRow};

use std::path::PathBuf;

/// Returns the nightshift data directory, creating it if needed.
///
/// Defaults to `~/.config/nightshift/`; `NIGHTSHIFT_ENV=dev` switches to
/// `~/.config/nightshift-dev/`, and `NIGHTSHIFT_DATA_DIR` overrides the
/// location entirely (tests point it at a temp directory).
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = if let Ok(dir) = std::env::var("NIGHTSHIFT_DATA_DIR") {
        PathBuf::from(dir)
    } else {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config");
        let env = std::env::var("NIGHTSHIFT_ENV").unwrap_or_else(|_| "production".to_string());
        if env == "dev" {
            base_dir.join("nightshift-dev")
        } else {
            base_dir.join("nightshift")
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
