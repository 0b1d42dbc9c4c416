//! `attr-must-exist`: every element with a given tag carries an attribute.

use crate::config::ConfigError;
use crate::document::Node;
use crate::violation::ValidationError;

use super::{ChangeSetRule, ConfiguredRule, Rule, RuleContext, RuleName, RuleParams};

pub(super) const DESCRIPTION: &str = "Every element with a given tag must carry an attribute";

pub(super) const EXPLAIN: &str = "attr-must-exist\n\
         \n\
         Parameters: tag, requiredAttribute\n\
         \n\
         Every element named `tag` inside a changeSet (the changeSet itself\n\
         included) must carry `requiredAttribute`. An empty value counts as\n\
         present.\n\
         \n\
         Example:\n\
           <attr-must-exist tag=\"createTable\" requiredAttribute=\"remarks\"/>\n\
         \n\
         Fix: add the attribute to the reported element.";

#[derive(Debug, Clone)]
pub struct AttrMustExist {
    tag: String,
    attribute: String,
}

impl Rule for AttrMustExist {
    fn name(&self) -> RuleName {
        RuleName::AttrMustExist
    }
}

impl ChangeSetRule for AttrMustExist {
    fn validate_changeset(
        &self,
        changeset: Node<'_>,
        _ctx: &RuleContext<'_>,
    ) -> Result<(), ValidationError> {
        match changeset
            .find_by_name(&self.tag)
            .into_iter()
            .find(|node| !node.has_property(&self.attribute))
        {
            Some(_) => Err(ValidationError::new(format!(
                "<{}> is missing required attribute '{}'",
                self.tag, self.attribute
            ))),
            None => Ok(()),
        }
    }
}

pub(super) fn build(params: &RuleParams<'_>) -> Result<ConfiguredRule, ConfigError> {
    Ok(ConfiguredRule::ChangeSet(Box::new(AttrMustExist {
        tag: params.required("tag")?.to_string(),
        attribute: params.required("requiredAttribute")?.to_string(),
    })))
}
