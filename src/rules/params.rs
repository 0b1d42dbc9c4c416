//! Declarative rule parameters
//!
//! A rule-definition entry is itself a document node: the node name is the
//! rule token and its properties are the parameters. List parameters may be
//! written as a comma-separated property or, in YAML/JSON, as a list, which
//! the document model lowers into a child node whose value is the
//! comma-joined items.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::document::Node;

use super::RuleName;

/// Typed access to the parameters of one rule-definition entry.
#[derive(Debug, Clone, Copy)]
pub struct RuleParams<'a> {
    rule: RuleName,
    /// `None` for an entry written as a bare token, which has no parameters.
    node: Option<Node<'a>>,
}

impl<'a> RuleParams<'a> {
    pub fn new(rule: RuleName, node: Node<'a>) -> Self {
        Self {
            rule,
            node: Some(node),
        }
    }

    /// Parameters of an entry that carries none.
    pub fn empty(rule: RuleName) -> Self {
        Self { rule, node: None }
    }

    pub fn rule(&self) -> RuleName {
        self.rule
    }

    /// Parameter value, from a property or a same-named child node.
    pub fn optional(&self, key: &str) -> Option<&'a str> {
        let node = self.node?;
        node.property_value(key).or_else(|| {
            node.children()
                .find(|child| child.name() == key)
                .map(|child| child.value())
        })
    }

    /// Non-empty parameter value, or a configuration error.
    pub fn required(&self, key: &str) -> Result<&'a str, ConfigError> {
        match self.optional(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ConfigError::MissingParameter {
                rule: self.rule,
                parameter: key.to_string(),
            }),
        }
    }

    /// Parameter that must be given but may be empty.
    pub fn present(&self, key: &str) -> Result<&'a str, ConfigError> {
        self.optional(key).ok_or_else(|| ConfigError::MissingParameter {
            rule: self.rule,
            parameter: key.to_string(),
        })
    }

    /// Comma-separated list; absent means empty.
    pub fn list(&self, key: &str) -> BTreeSet<String> {
        self.optional(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Required parameter parsed with `FromStr`.
    pub fn parsed<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.required(key)?;
        raw.trim()
            .parse()
            .map_err(|err: T::Err| ConfigError::InvalidParameter {
                rule: self.rule,
                parameter: key.to_string(),
                message: format!("'{raw}': {err}"),
            })
    }
}
