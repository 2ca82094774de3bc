//! Table settings and caller-supplied labels.
//!
//! Settings deserialize with defaults for every field, so a partial
//! configuration file only needs to name what it overrides.

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;
use crate::error::ErrorKind;
use crate::pagination::DEFAULT_PAGE_SIZE;

/// Title and description shown in the error panel for one error kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorText {
    pub title: String,
    pub description: String,
}

impl ErrorText {
    fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// Labels rendered by the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub empty: String,
    pub loading: String,
    pub retry: String,
    pub select_all: String,
    pub select_row: String,
    pub network_error: ErrorText,
    pub api_error: ErrorText,
    pub generic_error: ErrorText,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            empty: "No data".to_string(),
            loading: "Loading...".to_string(),
            retry: "Retry".to_string(),
            select_all: "Select all".to_string(),
            select_row: "Select row".to_string(),
            network_error: ErrorText::new(
                "Network error",
                "The server could not be reached. Check your connection and try again.",
            ),
            api_error: ErrorText::new(
                "Request failed",
                "The server rejected the request.",
            ),
            generic_error: ErrorText::new(
                "Something went wrong",
                "The data could not be loaded.",
            ),
        }
    }
}

impl Labels {
    /// Error panel text for a kind.
    pub fn error_text(&self, kind: ErrorKind) -> &ErrorText {
        match kind {
            ErrorKind::Network => &self.network_error,
            ErrorKind::Api => &self.api_error,
            ErrorKind::Generic => &self.generic_error,
        }
    }
}

/// Engine-wide defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    /// Initial page size when the pagination config gives none.
    pub default_page_size: u32,
    /// Page sizes offered by the footer.
    pub page_size_options: Vec<u32>,
    /// Skeleton rows shown during the first load.
    pub skeleton_rows: usize,
    pub labels: Labels,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: vec![10, 20, 50, 100],
            skeleton_rows: 5,
            labels: Labels::default(),
        }
    }
}

impl TableSettings {
    /// Check that sizes are positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.page_size_options.is_empty() || self.page_size_options.contains(&0) {
            return Err(ConfigError::InvalidPageSizeOptions);
        }
        Ok(())
    }
}
