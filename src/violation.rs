//! Violation strings and the rule failure type
//!
//! A [`Violation`] is the only thing the engine hands back: an opaque,
//! human-readable line naming the file, the rule, the offending changeset
//! when there is one, and a description. Every violation goes through
//! [`Violation::new`] so the layout stays uniform.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::document::{ChangeSetIdentity, ParseError};
use crate::rules::RuleName;

/// Pseudo rule token used for files that could not be parsed.
pub const PARSE_ERROR_RULE: &str = "parse-error";

/// Failure half of a rule evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    /// Changeset the failure belongs to, when the rule knows it.
    pub changeset: Option<ChangeSetIdentity>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            changeset: None,
        }
    }

    /// Attach the changeset the failure was found in.
    pub fn in_changeset(mut self, identity: ChangeSetIdentity) -> Self {
        self.changeset = Some(identity);
        self
    }

    /// Attach `identity` unless the rule already attached one.
    pub fn or_changeset(mut self, identity: ChangeSetIdentity) -> Self {
        if self.changeset.is_none() {
            self.changeset = Some(identity);
        }
        self
    }
}

/// One reported rule failure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Violation(String);

impl Violation {
    /// Format a violation. An empty identity is treated as no changeset.
    pub fn new(
        file_name: &str,
        rule: &str,
        changeset: Option<&ChangeSetIdentity>,
        message: &str,
    ) -> Self {
        match changeset.filter(|identity| !identity.is_empty()) {
            Some(identity) => Self(format!(
                "{file_name}: {rule}: changeSet '{identity}': {message}"
            )),
            None => Self(format!("{file_name}: {rule}: {message}")),
        }
    }

    pub fn from_error(file_name: &str, rule: RuleName, error: &ValidationError) -> Self {
        Self::new(
            file_name,
            rule.as_str(),
            error.changeset.as_ref(),
            &error.message,
        )
    }

    pub fn parse_failure(file_name: &str, error: &ParseError) -> Self {
        Self::new(file_name, PARSE_ERROR_RULE, None, &error.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
