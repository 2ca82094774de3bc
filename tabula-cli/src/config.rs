//! Settings file loading.
//!
//! Settings are TOML. Every key is optional:
//!
//! ```toml
//! default_page_size = 20
//! page_size_options = [20, 50]
//!
//! [labels]
//! empty = "No users"
//!
//! [labels.network_error]
//! title = "Offline"
//! description = "Check the VPN."
//! ```

use std::fs;
use std::path::Path;

use log::{debug, info};
use tabula_lib::settings::TableSettings;

use crate::error::CliError;
use crate::paths;

/// Load settings from `explicit`, or from the platform config file.
///
/// An explicit path must exist. A missing platform file yields defaults.
pub fn load_settings(explicit: Option<&Path>) -> Result<TableSettings, CliError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match paths::config_file() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No settings file, using defaults");
                return Ok(TableSettings::default());
            }
        },
    };

    let text = fs::read_to_string(&path).map_err(|source| CliError::Io {
        path: path.clone(),
        source,
    })?;
    let settings = parse_settings(&text).map_err(|source| CliError::Settings {
        path: path.clone(),
        source,
    })?;
    settings.validate()?;
    info!("Loaded settings from {}", path.display());
    Ok(settings)
}

fn parse_settings(text: &str) -> Result<TableSettings, toml::de::Error> {
    toml::from_str(text)
}
