//! Rule engine contract and rule vocabulary
//!
//! Every rule has a name drawn from the closed [`RuleName`] vocabulary and
//! plays exactly one of three roles:
//!
//! - [`FileRule`]: raw file content and name, no tree;
//! - [`ChangeLogRule`]: once per file, against the whole tree;
//! - [`ChangeSetRule`]: once per changeset node.
//!
//! Rules are stateless predicates over their parameters and the nodes they
//! receive. A failure is returned as a [`ValidationError`]; the engine turns
//! it into a violation and moves on.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::document::{Format, Node};
use crate::exclusions::ExclusionIndex;
use crate::violation::ValidationError;

pub mod attr_charset;
pub mod attr_presence;
pub mod attr_shape;
pub mod existence;
pub mod file_shape;
pub mod params;
pub mod registry;

pub use params::RuleParams;
pub use registry::RuleRegistry;

/// Strongly-typed rule name.
///
/// Adding a variant forces updates in `role()`, `description()`,
/// `explain()` and the registry's default builder table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumString, IntoStaticStr,
)]
pub enum RuleName {
    // Existence
    /// A tag must appear somewhere in the changelog.
    #[strum(serialize = "tag-must-exist")]
    TagMustExist,
    /// A tag must not appear anywhere in the changelog.
    #[strum(serialize = "tag-must-not-exist")]
    TagMustNotExist,
    /// A tag must appear inside every changeset.
    #[strum(serialize = "changeset-tag-must-exist")]
    ChangeSetTagMustExist,
    /// A tag must not appear inside any changeset.
    #[strum(serialize = "changeset-tag-must-not-exist")]
    ChangeSetTagMustNotExist,

    // Attribute shape
    #[strum(serialize = "attr-starts-with")]
    AttrStartsWith,
    #[strum(serialize = "attr-ends-with")]
    AttrEndsWith,
    #[strum(serialize = "attr-not-starts-with")]
    AttrNotStartsWith,
    #[strum(serialize = "attr-not-ends-with")]
    AttrNotEndsWith,
    #[strum(serialize = "attr-starts-with-conditioned")]
    AttrStartsWithConditioned,
    #[strum(serialize = "attr-ends-with-conditioned")]
    AttrEndsWithConditioned,

    // Attribute presence
    #[strum(serialize = "attr-must-exist")]
    AttrMustExist,

    // Attribute character class
    #[strum(serialize = "no-hyphens-in-attributes")]
    NoHyphensInAttributes,
    #[strum(serialize = "no-underscores-in-attributes")]
    NoUnderscoresInAttributes,
    #[strum(serialize = "no-uppercase-in-attributes")]
    NoUppercaseInAttributes,
    #[strum(serialize = "no-lowercase-in-attributes")]
    NoLowercaseInAttributes,
    #[strum(serialize = "no-whitespace-in-attributes")]
    NoWhitespaceInAttributes,

    // File shape
    #[strum(serialize = "file-name-matches-regexp")]
    FileNameMatchesRegexp,
    #[strum(serialize = "file-max-lines")]
    FileMaxLines,
    #[strum(serialize = "no-tabs")]
    NoTabs,
    #[strum(serialize = "no-trailing-whitespace")]
    NoTrailingWhitespace,
    #[strum(serialize = "file-ends-with-newline")]
    FileEndsWithNewline,
}

/// Which validation entry point a rule uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleRole {
    File,
    WholeChangeLog,
    ChangeSet,
}

impl fmt::Display for RuleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::WholeChangeLog => "whole changelog",
            Self::ChangeSet => "changeset",
        })
    }
}

impl RuleName {
    /// Zero-allocation string representation.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Iterate the whole vocabulary.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    pub fn role(&self) -> RuleRole {
        use RuleName::*;
        match self {
            TagMustExist | TagMustNotExist => RuleRole::WholeChangeLog,
            FileNameMatchesRegexp | FileMaxLines | NoTabs | NoTrailingWhitespace
            | FileEndsWithNewline => RuleRole::File,
            ChangeSetTagMustExist
            | ChangeSetTagMustNotExist
            | AttrStartsWith
            | AttrEndsWith
            | AttrNotStartsWith
            | AttrNotEndsWith
            | AttrStartsWithConditioned
            | AttrEndsWithConditioned
            | AttrMustExist
            | NoHyphensInAttributes
            | NoUnderscoresInAttributes
            | NoUppercaseInAttributes
            | NoLowercaseInAttributes
            | NoWhitespaceInAttributes => RuleRole::ChangeSet,
        }
    }

    /// Human-readable short description.
    pub fn description(&self) -> &'static str {
        use RuleName::*;
        match self {
            TagMustExist => existence::TAG_MUST_EXIST,
            TagMustNotExist => existence::TAG_MUST_NOT_EXIST,
            ChangeSetTagMustExist => existence::CHANGESET_TAG_MUST_EXIST,
            ChangeSetTagMustNotExist => existence::CHANGESET_TAG_MUST_NOT_EXIST,
            AttrStartsWith => attr_shape::STARTS_WITH,
            AttrEndsWith => attr_shape::ENDS_WITH,
            AttrNotStartsWith => attr_shape::NOT_STARTS_WITH,
            AttrNotEndsWith => attr_shape::NOT_ENDS_WITH,
            AttrStartsWithConditioned => attr_shape::STARTS_WITH_CONDITIONED,
            AttrEndsWithConditioned => attr_shape::ENDS_WITH_CONDITIONED,
            AttrMustExist => attr_presence::DESCRIPTION,
            NoHyphensInAttributes => attr_charset::NO_HYPHENS,
            NoUnderscoresInAttributes => attr_charset::NO_UNDERSCORES,
            NoUppercaseInAttributes => attr_charset::NO_UPPERCASE,
            NoLowercaseInAttributes => attr_charset::NO_LOWERCASE,
            NoWhitespaceInAttributes => attr_charset::NO_WHITESPACE,
            FileNameMatchesRegexp => file_shape::NAME_MATCHES,
            FileMaxLines => file_shape::MAX_LINES,
            NoTabs => file_shape::NO_TABS,
            NoTrailingWhitespace => file_shape::NO_TRAILING_WHITESPACE,
            FileEndsWithNewline => file_shape::ENDS_WITH_NEWLINE,
        }
    }

    /// Detailed explanation for --explain: what it checks, parameters, example.
    pub fn explain(&self) -> &'static str {
        use RuleName::*;
        match self {
            TagMustExist | TagMustNotExist | ChangeSetTagMustExist | ChangeSetTagMustNotExist => {
                existence::EXPLAIN
            }
            AttrStartsWith
            | AttrEndsWith
            | AttrNotStartsWith
            | AttrNotEndsWith
            | AttrStartsWithConditioned
            | AttrEndsWithConditioned => attr_shape::EXPLAIN,
            AttrMustExist => attr_presence::EXPLAIN,
            NoHyphensInAttributes
            | NoUnderscoresInAttributes
            | NoUppercaseInAttributes
            | NoLowercaseInAttributes
            | NoWhitespaceInAttributes => attr_charset::EXPLAIN,
            FileNameMatchesRegexp
            | FileMaxLines
            | NoTabs
            | NoTrailingWhitespace
            | FileEndsWithNewline => file_shape::EXPLAIN,
        }
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RuleName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Parse a rule token, mapping strum's error to the rejected token.
pub fn parse_rule_name(token: &str) -> Result<RuleName, String> {
    RuleName::from_str(token).map_err(|_| token.to_string())
}

/// Raw file handed to file rules.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    pub path: &'a Path,
    /// Bare file name, the key exclusions are matched against.
    pub file_name: &'a str,
    pub content: &'a str,
}

/// Per-file context available to tree rules.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub file_name: &'a str,
    pub format: Format,
    pub exclusions: &'a ExclusionIndex,
}

/// Trait that every rule implements.
pub trait Rule: Send + Sync {
    fn name(&self) -> RuleName;

    fn role(&self) -> RuleRole {
        self.name().role()
    }
}

/// Checks on raw file content and metadata.
pub trait FileRule: Rule {
    fn validate_file(&self, file: &SourceFile<'_>) -> Result<(), ValidationError>;
}

/// Checks run once per file against the whole tree.
pub trait ChangeLogRule: Rule {
    fn validate_changelog(
        &self,
        root: Node<'_>,
        ctx: &RuleContext<'_>,
    ) -> Result<(), ValidationError>;
}

/// Checks run once per changeset node.
pub trait ChangeSetRule: Rule {
    fn validate_changeset(
        &self,
        changeset: Node<'_>,
        ctx: &RuleContext<'_>,
    ) -> Result<(), ValidationError>;
}

/// A rule instance built from one rule-definition entry.
pub enum ConfiguredRule {
    File(Box<dyn FileRule>),
    ChangeLog(Box<dyn ChangeLogRule>),
    ChangeSet(Box<dyn ChangeSetRule>),
}

impl ConfiguredRule {
    pub fn name(&self) -> RuleName {
        match self {
            Self::File(rule) => rule.name(),
            Self::ChangeLog(rule) => rule.name(),
            Self::ChangeSet(rule) => rule.name(),
        }
    }

    pub fn role(&self) -> RuleRole {
        match self {
            Self::File(_) => RuleRole::File,
            Self::ChangeLog(_) => RuleRole::WholeChangeLog,
            Self::ChangeSet(_) => RuleRole::ChangeSet,
        }
    }
}

impl fmt::Debug for ConfiguredRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredRule")
            .field("name", &self.name())
            .field("role", &self.role())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_helpers;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tokens_round_trip_through_from_str() {
        for name in RuleName::all() {
            assert_eq!(parse_rule_name(name.as_str()), Ok(name));
        }
    }

    #[test]
    fn test_tokens_are_unique_kebab_case() {
        let mut seen = HashSet::new();
        for name in RuleName::all() {
            let token = name.as_str();
            assert!(seen.insert(token), "duplicate token {token}");
            assert!(
                token.chars().all(|c| c.is_ascii_lowercase() || c == '-'),
                "{token} is not kebab-case"
            );
        }
    }

    #[test]
    fn test_unknown_token_rejected() {
        assert_eq!(parse_rule_name("tag-must-exists"), Err("tag-must-exists".to_string()));
        assert!(parse_rule_name("").is_err());
    }

    #[test]
    fn test_roles() {
        assert_eq!(RuleName::TagMustExist.role(), RuleRole::WholeChangeLog);
        assert_eq!(RuleName::AttrEndsWith.role(), RuleRole::ChangeSet);
        assert_eq!(RuleName::NoTabs.role(), RuleRole::File);
    }

    #[test]
    fn test_all_rules_have_descriptions_and_explanations() {
        for name in RuleName::all() {
            assert!(name.description().len() > 10, "{name} description too short");
            assert!(name.explain().len() > 40, "{name} explanation too short");
        }
    }
}
