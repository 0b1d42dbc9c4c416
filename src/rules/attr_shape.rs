//! Attribute prefix/suffix rules
//!
//! Each rule targets one attribute of one tag. Every element with that tag
//! inside the changeset (the changeset element itself included, so
//! `tag="changeSet"` checks changeset ids) is inspected; elements that do not
//! carry the attribute are skipped. The conditioned variants only look at
//! elements whose `conditionAttribute` equals `conditionValue`.

use crate::config::ConfigError;
use crate::document::Node;
use crate::violation::ValidationError;

use super::{ChangeSetRule, ConfiguredRule, Rule, RuleContext, RuleName, RuleParams};

pub(super) const STARTS_WITH: &str = "An attribute value must start with a prefix";
pub(super) const ENDS_WITH: &str = "An attribute value must end with a suffix";
pub(super) const NOT_STARTS_WITH: &str = "An attribute value must not start with a prefix";
pub(super) const NOT_ENDS_WITH: &str = "An attribute value must not end with a suffix";
pub(super) const STARTS_WITH_CONDITIONED: &str =
    "An attribute value must start with a prefix when another attribute has a given value";
pub(super) const ENDS_WITH_CONDITIONED: &str =
    "An attribute value must end with a suffix when another attribute has a given value";

pub(super) const EXPLAIN: &str = "Attribute prefix/suffix rules\n\
         \n\
         attr-starts-with              tag, targetAttribute, requiredPrefix\n\
         attr-ends-with                tag, targetAttribute, requiredSuffix\n\
         attr-not-starts-with          tag, targetAttribute, forbiddenPrefix\n\
         attr-not-ends-with            tag, targetAttribute, forbiddenSuffix\n\
         attr-starts-with-conditioned  + conditionAttribute, conditionValue\n\
         attr-ends-with-conditioned    + conditionAttribute, conditionValue\n\
         \n\
         Elements without the target attribute are not checked; pair with\n\
         attr-must-exist to require it.\n\
         \n\
         Example:\n\
           <attr-ends-with tag=\"addForeignKeyConstraint\"\n\
                           targetAttribute=\"constraintName\"\n\
                           requiredSuffix=\"_fk\"/>\n\
         \n\
         constraintName=\"fk_user_activation\" fails, constraintName=\"user_activation_fk\" passes.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Affix {
    Prefix,
    Suffix,
}

#[derive(Debug, Clone)]
struct Condition {
    attribute: String,
    value: String,
}

#[derive(Debug, Clone)]
pub struct AttrAffix {
    rule: RuleName,
    tag: String,
    attribute: String,
    affix: Affix,
    literal: String,
    required: bool,
    condition: Option<Condition>,
}

impl AttrAffix {
    fn applies_to(&self, node: Node<'_>) -> bool {
        match &self.condition {
            Some(condition) => node.property_value(&condition.attribute) == Some(&condition.value),
            None => true,
        }
    }

    fn has_affix(&self, value: &str) -> bool {
        match self.affix {
            Affix::Prefix => value.starts_with(&self.literal),
            Affix::Suffix => value.ends_with(&self.literal),
        }
    }

    fn failure(&self, value: &str) -> ValidationError {
        let verb = match (self.required, self.affix) {
            (true, Affix::Prefix) => "must start with",
            (true, Affix::Suffix) => "must end with",
            (false, Affix::Prefix) => "must not start with",
            (false, Affix::Suffix) => "must not end with",
        };
        let mut message = format!(
            "attribute {}='{}' of <{}> {} '{}'",
            self.attribute, value, self.tag, verb, self.literal
        );
        if let Some(condition) = &self.condition {
            message.push_str(&format!(
                " when {}='{}'",
                condition.attribute, condition.value
            ));
        }
        ValidationError::new(message)
    }
}

impl Rule for AttrAffix {
    fn name(&self) -> RuleName {
        self.rule
    }
}

impl ChangeSetRule for AttrAffix {
    fn validate_changeset(
        &self,
        changeset: Node<'_>,
        _ctx: &RuleContext<'_>,
    ) -> Result<(), ValidationError> {
        for node in changeset.find_by_name(&self.tag) {
            if !self.applies_to(node) {
                continue;
            }
            let Some(value) = node.property_value(&self.attribute) else {
                continue;
            };
            if self.has_affix(value) != self.required {
                return Err(self.failure(value));
            }
        }
        Ok(())
    }
}

pub(super) fn build(params: &RuleParams<'_>) -> Result<ConfiguredRule, ConfigError> {
    let rule = params.rule();
    let (affix, required, literal_key, conditioned) = match rule {
        RuleName::AttrStartsWith => (Affix::Prefix, true, "requiredPrefix", false),
        RuleName::AttrEndsWith => (Affix::Suffix, true, "requiredSuffix", false),
        RuleName::AttrNotStartsWith => (Affix::Prefix, false, "forbiddenPrefix", false),
        RuleName::AttrNotEndsWith => (Affix::Suffix, false, "forbiddenSuffix", false),
        RuleName::AttrStartsWithConditioned => (Affix::Prefix, true, "requiredPrefix", true),
        _ => (Affix::Suffix, true, "requiredSuffix", true),
    };
    let condition = if conditioned {
        Some(Condition {
            attribute: params.required("conditionAttribute")?.to_string(),
            // May be empty, which matches `attr=""`, but must be given.
            value: params.present("conditionValue")?.to_string(),
        })
    } else {
        None
    };
    Ok(ConfiguredRule::ChangeSet(Box::new(AttrAffix {
        rule,
        tag: params.required("tag")?.to_string(),
        attribute: params.required("targetAttribute")?.to_string(),
        affix,
        literal: params.required(literal_key)?.to_string(),
        required,
        condition,
    })))
}
