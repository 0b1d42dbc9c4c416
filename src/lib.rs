//! changelog-lint: rule-based validator for Liquibase changelogs
//!
//! Changelogs in XML, YAML or JSON are read into one format-neutral tree and
//! checked against a declarative rule set. Findings can be silenced per file
//! or per changeset through an exclusion file. The result of a run is an
//! ordered list of violation strings.

pub mod config;
pub mod discover;
pub mod document;
pub mod engine;
pub mod exclusions;
pub mod output;
pub mod rules;
pub mod violation;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use document::{ChangeSetIdentity, Document, Format, Node, ParseError};
pub use engine::{ValidationReport, Validator};
pub use exclusions::{ExclusionError, ExclusionIndex};
pub use rules::{ConfiguredRule, RuleName, RuleRegistry};
pub use violation::{ValidationError, Violation};
