//! Configuration file parsing
//!
//! Reads changelog-lint.toml configuration files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::document::ParseError;
use crate::exclusions::ExclusionError;
use crate::output::OutputFormat;
use crate::rules::RuleName;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "changelog-lint.toml";

/// Fatal configuration problems. Any of these aborts the run before a
/// single changelog is validated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Malformed rule definitions: {0}")]
    Definition(#[from] ParseError),

    #[error("Unknown rule '{token}' in rule definitions")]
    UnknownRule { token: String },

    #[error("Rule '{rule}' is missing required parameter '{parameter}'")]
    MissingParameter { rule: RuleName, parameter: String },

    #[error("Rule '{rule}' has invalid parameter '{parameter}': {message}")]
    InvalidParameter {
        rule: RuleName,
        parameter: String,
        message: String,
    },

    #[error("Invalid exclusions: {0}")]
    Exclusion(#[from] ExclusionError),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub changelogs: ChangelogsConfig,

    #[serde(default)]
    pub rules: RulesConfig,

    #[serde(default)]
    pub exclusions: ExclusionsConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChangelogsConfig {
    /// Changelog files or directories to validate
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RulesConfig {
    /// Rule-definition file (XML, YAML or JSON)
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExclusionsConfig {
    /// Exclusion-definition file; absent means nothing is excluded
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Tags whose properties are dropped before rules run
    #[serde(default = "default_structural_tags")]
    pub structural_tags: BTreeSet<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            structural_tags: default_structural_tags(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Report format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_structural_tags() -> BTreeSet<String> {
    ["databaseChangeLog", "comment", "include", "includeAll"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit config file, or the default one if it exists.
    ///
    /// A missing explicit file is an error; a missing default file falls
    /// back to built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    tracing::warn!(
                        "config file '{DEFAULT_CONFIG_FILE}' not found, using defaults"
                    );
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.output_format()?;
        Ok(())
    }

    pub fn output_format(&self) -> Result<OutputFormat, ConfigError> {
        self.output.format.parse().map_err(|_| {
            ConfigError::Validation(format!(
                "invalid output format '{}'. Valid values: text, json",
                self.output.format
            ))
        })
    }

    /// Rule-definition file, which must be set before a run.
    pub fn rules_file(&self) -> Result<&Path, ConfigError> {
        self.rules.file.as_deref().ok_or_else(|| {
            ConfigError::Validation(
                "no rule-definition file: set [rules] file or pass --rules".to_string(),
            )
        })
    }
}
