use std::path::PathBuf;

use tabula_lib::error::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Expected a JSON array of records in {0}")]
    NotAnArray(PathBuf),

    #[error("Either --file or --url is required")]
    NoSource,

    #[error("Invalid --param '{0}', expected key=value")]
    InvalidParam(String),

    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
