//! Locating and loading `config.toml`.
//!
//! Lookup order: an explicit path, then `RESOURCEFUL_CONFIG`, then
//! `<config dir>/resourceful/config.toml`. Only an explicitly named file has
//! to exist; a missing default file yields default settings.

pub mod models;

use crate::constants;
use crate::error::Error;
use models::Settings;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Returns the default configuration file location, if the platform has a config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| {
        dir.join(constants::CONFIG_DIR_NAME)
            .join(constants::CONFIG_FILE_NAME)
    })
}

/// Loads settings from the file chosen by the lookup order above.
///
/// # Errors
///
/// Returns an error if an explicitly named file is missing or unreadable, or
/// if any file found is not valid configuration.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, Error> {
    let explicit = explicit.map(Path::to_path_buf).or_else(|| {
        std::env::var_os(constants::ENV_RESOURCEFUL_CONFIG).map(PathBuf::from)
    });

    if let Some(path) = explicit {
        return load_settings_from(&path);
    }

    match default_config_path() {
        Some(path) if path.exists() => load_settings_from(&path),
        _ => {
            debug!("No configuration file found; using defaults");
            Ok(Settings::default())
        }
    }
}

/// Loads settings from `path`, which must exist.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_settings_from(path: &Path) -> Result<Settings, Error> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::invalid_config(format!(
            "Failed to read config file '{}': {e}",
            path.display()
        ))
    })?;
    debug!("Loaded configuration from {}", path.display());
    Settings::from_toml_str(&content)
}
