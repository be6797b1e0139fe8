use std::path::PathBuf;
use std::time::Duration;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "tagTranslation.metadata[1]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Root of the settings file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub tag_translation: CacheSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// `[localFileName, remoteUrl]`.
    /// Any other shape disables tag translation.
    pub metadata: Vec<String>,

    /// Directory under which `tag-translations/` is created.
    pub data_dir: PathBuf,

    /// Timeout of the whole download request.
    pub request_timeout_secs: u64,

    /// Minimum interval between two network refreshes.
    pub update_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            metadata: Vec::new(),
            data_dir: PathBuf::from("."),
            request_timeout_secs: 60,
            update_interval_secs: 60 * 60 * 24,
        }
    }
}

impl CacheSettings {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub const fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// # Errors
    /// - Empty metadata entry
    /// - Empty data directory
    /// - Zero timeout
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (index, entry) in self.metadata.iter().enumerate() {
            if entry.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("tagTranslation.metadata[{index}]"),
                    "Entries cannot be empty. Expected [\"<local file name>\", \"<remote url>\"]",
                ));
            }
        }

        if let Some(name) = self.metadata.first()
            && (name.contains('/') || name.contains('\\'))
        {
            errors.push(ValidationError::new(
                "tagTranslation.metadata[0]",
                format!("The local file name '{name}' must not contain path separators"),
            ));
        }

        if self.data_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "tagTranslation.dataDir",
                "The directory cannot be empty. Example: \"./data\"",
            ));
        }

        if self.request_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "tagTranslation.requestTimeoutSecs",
                "The timeout must be at least 1 second",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
