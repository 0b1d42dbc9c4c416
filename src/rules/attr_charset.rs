//! Character-class rules over attribute values
//!
//! Every property of every element strictly below the changeset node is
//! checked. The changeset's own `id` and `author` are not.

use std::collections::BTreeSet;

use crate::config::ConfigError;
use crate::document::Node;
use crate::violation::ValidationError;

use super::{ChangeSetRule, ConfiguredRule, Rule, RuleContext, RuleName, RuleParams};

pub(super) const NO_HYPHENS: &str = "Attribute values must not contain '-'";
pub(super) const NO_UNDERSCORES: &str = "Attribute values must not contain '_'";
pub(super) const NO_UPPERCASE: &str = "Attribute values must not contain uppercase letters";
pub(super) const NO_LOWERCASE: &str = "Attribute values must not contain lowercase letters";
pub(super) const NO_WHITESPACE: &str = "Attribute values must not contain whitespace";

pub(super) const EXPLAIN: &str = "Attribute character-class rules\n\
         \n\
         no-hyphens-in-attributes      '-'\n\
         no-underscores-in-attributes  '_'\n\
         no-uppercase-in-attributes    uppercase letters\n\
         no-lowercase-in-attributes    lowercase letters\n\
         no-whitespace-in-attributes   whitespace\n\
         \n\
         Parameters: excludedAttributes? (comma-separated attribute names)\n\
         \n\
         Every attribute of every element inside a changeSet is scanned; the\n\
         changeSet's own attributes are not. The first offending value in each\n\
         changeSet is reported.\n\
         \n\
         Example:\n\
           <no-uppercase-in-attributes excludedAttributes=\"remarks,defaultValue\"/>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Hyphen,
    Underscore,
    Uppercase,
    Lowercase,
    Whitespace,
}

impl CharClass {
    fn matches(self, c: char) -> bool {
        match self {
            Self::Hyphen => c == '-',
            Self::Underscore => c == '_',
            Self::Uppercase => c.is_uppercase(),
            Self::Lowercase => c.is_lowercase(),
            Self::Whitespace => c.is_whitespace(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Hyphen => "a hyphen",
            Self::Underscore => "an underscore",
            Self::Uppercase => "uppercase characters",
            Self::Lowercase => "lowercase characters",
            Self::Whitespace => "whitespace",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttrCharset {
    rule: RuleName,
    class: CharClass,
    excluded_attributes: BTreeSet<String>,
}

impl Rule for AttrCharset {
    fn name(&self) -> RuleName {
        self.rule
    }
}

impl ChangeSetRule for AttrCharset {
    fn validate_changeset(
        &self,
        changeset: Node<'_>,
        _ctx: &RuleContext<'_>,
    ) -> Result<(), ValidationError> {
        for node in changeset.descendants().into_iter().skip(1) {
            for (key, value) in node.properties() {
                if self.excluded_attributes.contains(key) {
                    continue;
                }
                if value.chars().any(|c| self.class.matches(c)) {
                    return Err(ValidationError::new(format!(
                        "attribute {}='{}' of <{}> contains {}",
                        key,
                        value,
                        node.name(),
                        self.class.label()
                    )));
                }
            }
        }
        Ok(())
    }
}

pub(super) fn build(params: &RuleParams<'_>) -> Result<ConfiguredRule, ConfigError> {
    let rule = params.rule();
    let class = match rule {
        RuleName::NoHyphensInAttributes => CharClass::Hyphen,
        RuleName::NoUnderscoresInAttributes => CharClass::Underscore,
        RuleName::NoUppercaseInAttributes => CharClass::Uppercase,
        RuleName::NoLowercaseInAttributes => CharClass::Lowercase,
        _ => CharClass::Whitespace,
    };
    Ok(ConfiguredRule::ChangeSet(Box::new(AttrCharset {
        rule,
        class,
        excluded_attributes: params.list("excludedAttributes"),
    })))
}
