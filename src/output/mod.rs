//! Output reporters for different formats
//!
//! Supports plain text and JSON output.

use std::io::Write;

use strum_macros::{EnumString, IntoStaticStr};
use thiserror::Error;

use crate::engine::ValidationReport;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error writing report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Report format selected by `[output] format` or `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn reporter(self) -> Box<dyn Reporter> {
        match self {
            Self::Text => Box::new(TextReporter::new()),
            Self::Json => Box::new(JsonReporter::new()),
        }
    }
}

/// Trait for output format reporters.
pub trait Reporter {
    /// Write the report to `out`.
    fn emit(&self, report: &ValidationReport, out: &mut dyn Write) -> Result<(), ReportError>;
}

/// One violation per line followed by a count.
pub struct TextReporter;

impl TextReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextReporter {
    fn default() -> Self {
        Self::new()
    }
}

pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

pub mod json;
pub mod text;
