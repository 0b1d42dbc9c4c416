//! Tag existence rules
//!
//! `tag-must-exist` / `tag-must-not-exist` look at the whole changelog;
//! the `changeset-` variants look inside each changeset.
//!
//! A match only counts when none of its enclosing elements, from its direct
//! parent up to (but not including) the scope node, is listed in
//! `excludedAncestorTags`. The direct parent is always checked, even when it
//! is the scope node itself, so excluding `databaseChangeLog` rejects a tag
//! placed directly under the changelog root.

use std::collections::BTreeSet;

use crate::config::ConfigError;
use crate::document::{Node, resolve_changeset_identity};
use crate::violation::ValidationError;

use super::{
    ChangeLogRule, ChangeSetRule, ConfiguredRule, Rule, RuleContext, RuleName, RuleParams,
};

pub(super) const TAG_MUST_EXIST: &str = "A tag must appear somewhere in the changelog";
pub(super) const TAG_MUST_NOT_EXIST: &str = "A tag must not appear anywhere in the changelog";
pub(super) const CHANGESET_TAG_MUST_EXIST: &str = "A tag must appear inside every changeSet";
pub(super) const CHANGESET_TAG_MUST_NOT_EXIST: &str = "A tag must not appear inside any changeSet";

pub(super) const EXPLAIN: &str = "Tag existence rules\n\
         \n\
         tag-must-exist             requiredTag, excludedAncestorTags?\n\
         tag-must-not-exist         forbiddenTag, excludedAncestorTags?\n\
         changeset-tag-must-exist     requiredTag, excludedAncestorTags?\n\
         changeset-tag-must-not-exist forbiddenTag, excludedAncestorTags?\n\
         \n\
         The plain variants search the whole changelog and report at most one\n\
         violation per file. The changeset- variants search each changeSet and\n\
         report one violation per offending changeSet.\n\
         \n\
         A match is ignored when its parent, or any element between it and the\n\
         search scope, is named in excludedAncestorTags.\n\
         \n\
         Example:\n\
           <tag-must-exist requiredTag=\"rollback\"\n\
                           excludedAncestorTags=\"databaseChangeLog\"/>\n\
         \n\
         Fix: add the missing tag, or remove the forbidden one.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expectation {
    Present,
    Absent,
}

/// Existence check shared by the four existence rules.
#[derive(Debug, Clone)]
pub struct TagExistence {
    rule: RuleName,
    tag: String,
    excluded_ancestors: BTreeSet<String>,
    expectation: Expectation,
}

impl TagExistence {
    /// Matches of the tag strictly below `scope`, in document order.
    fn matches<'a>(&self, scope: Node<'a>) -> Vec<Node<'a>> {
        scope
            .descendants()
            .into_iter()
            .skip(1)
            .filter(|node| node.name() == self.tag)
            .filter(|node| !self.in_excluded_location(*node, scope))
            .collect()
    }

    fn in_excluded_location(&self, node: Node<'_>, scope: Node<'_>) -> bool {
        let Some(parent) = node.parent() else {
            return false;
        };
        if self.excluded_ancestors.contains(parent.name()) {
            return true;
        }
        if parent == scope {
            return false;
        }
        parent
            .ancestors()
            .take_while(|ancestor| *ancestor != scope)
            .any(|ancestor| self.excluded_ancestors.contains(ancestor.name()))
    }
}

impl Rule for TagExistence {
    fn name(&self) -> RuleName {
        self.rule
    }
}

impl ChangeLogRule for TagExistence {
    fn validate_changelog(
        &self,
        root: Node<'_>,
        ctx: &RuleContext<'_>,
    ) -> Result<(), ValidationError> {
        let matches = self.matches(root);
        match self.expectation {
            Expectation::Present if matches.is_empty() => Err(ValidationError::new(format!(
                "required tag <{}> does not appear in the changelog",
                self.tag
            ))),
            Expectation::Present => Ok(()),
            Expectation::Absent => {
                let offending: Vec<_> = matches
                    .into_iter()
                    .map(resolve_changeset_identity)
                    .filter(|identity| {
                        !ctx.exclusions
                            .is_changeset_excluded(ctx.file_name, identity, self.rule)
                    })
                    .collect();
                match offending.first() {
                    None => Ok(()),
                    Some(first) => Err(ValidationError::new(format!(
                        "tag <{}> must not be used ({} occurrence(s))",
                        self.tag,
                        offending.len()
                    ))
                    .in_changeset(first.clone())),
                }
            }
        }
    }
}

impl ChangeSetRule for TagExistence {
    fn validate_changeset(
        &self,
        changeset: Node<'_>,
        _ctx: &RuleContext<'_>,
    ) -> Result<(), ValidationError> {
        let matches = self.matches(changeset);
        match self.expectation {
            Expectation::Present if matches.is_empty() => Err(ValidationError::new(format!(
                "changeSet must contain a <{}> tag",
                self.tag
            ))),
            Expectation::Absent if !matches.is_empty() => Err(ValidationError::new(format!(
                "tag <{}> must not be used inside a changeSet",
                self.tag
            ))),
            _ => Ok(()),
        }
    }
}

pub(super) fn build(params: &RuleParams<'_>) -> Result<ConfiguredRule, ConfigError> {
    let rule = params.rule();
    let (tag_key, expectation) = match rule {
        RuleName::TagMustExist | RuleName::ChangeSetTagMustExist => {
            ("requiredTag", Expectation::Present)
        }
        _ => ("forbiddenTag", Expectation::Absent),
    };
    let existence = TagExistence {
        rule,
        tag: params.required(tag_key)?.to_string(),
        excluded_ancestors: params.list("excludedAncestorTags"),
        expectation,
    };
    Ok(match rule {
        RuleName::TagMustExist | RuleName::TagMustNotExist => {
            ConfiguredRule::ChangeLog(Box::new(existence))
        }
        _ => ConfiguredRule::ChangeSet(Box::new(existence)),
    })
}
