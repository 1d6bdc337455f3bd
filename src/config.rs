//! Compiler configuration

use serde::{Deserialize, Serialize};

use crate::observability::Severity;

/// Compiler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Reserved identity key primary keys are renamed to (default: "_id")
    #[serde(default = "default_identity_key")]
    pub identity_key: String,

    /// Minimum severity that gets logged (default: ERROR, i.e. silent)
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_identity_key() -> String {
    "_id".to_string()
}

fn default_log_level() -> Severity {
    Severity::Error
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            identity_key: default_identity_key(),
            log_level: default_log_level(),
        }
    }
}

impl CompilerConfig {
    /// Parses a JSON config; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_identity_key(mut self, key: impl Into<String>) -> Self {
        self.identity_key = key.into();
        self
    }

    pub fn with_log_level(mut self, level: Severity) -> Self {
        self.log_level = level;
        self
    }
}
