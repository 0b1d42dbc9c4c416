//! Rule registry: rule token to builder
//!
//! The registry is a plain value built once at startup and passed by
//! reference; there is no global table.

use std::collections::HashMap;
use std::path::Path;

use crate::config::ConfigError;
use crate::document::{self, Document, Format, Member, Node};

use super::{
    ConfiguredRule, RuleName, RuleParams, attr_charset, attr_presence, attr_shape, existence,
    file_shape, parse_rule_name,
};

/// Builds a configured rule from its declarative parameters.
pub type Builder = fn(&RuleParams<'_>) -> Result<ConfiguredRule, ConfigError>;

/// Registry of rule builders.
pub struct RuleRegistry {
    builders: HashMap<RuleName, Builder>,
}

impl RuleRegistry {
    /// Create a new empty rule registry.
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Registry with every built-in rule.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// Register all built-in rules.
    pub fn register_defaults(&mut self) {
        for name in RuleName::all() {
            self.register(name, default_builder(name));
        }
    }

    /// Register (or replace) the builder for one rule.
    pub fn register(&mut self, name: RuleName, builder: Builder) {
        self.builders.insert(name, builder);
    }

    pub fn is_registered(&self, name: RuleName) -> bool {
        self.builders.contains_key(&name)
    }

    /// Build one rule from a rule-definition entry.
    ///
    /// The entry's node name is the rule token; its properties and
    /// children are the parameters.
    pub fn instantiate(&self, definition: Node<'_>) -> Result<ConfiguredRule, ConfigError> {
        let (name, builder) = self.lookup(definition.name())?;
        builder(&RuleParams::new(name, definition))
    }

    /// Build every entry under the root of a rule-definition document, in order.
    ///
    /// In YAML and JSON an entry with no parameters (`- no-tabs:`) lowers to
    /// a property of the root rather than a child, so root properties are
    /// entries too. XML root attributes are not.
    pub fn instantiate_all(
        &self,
        definitions: &Document,
    ) -> Result<Vec<ConfiguredRule>, ConfigError> {
        let root = definitions.root();
        if definitions.format() == Format::Xml {
            return root.children().map(|entry| self.instantiate(entry)).collect();
        }
        root.members()
            .map(|member| match member {
                Member::Child(entry) => self.instantiate(entry),
                Member::Property(token, value) => self.instantiate_bare(token, value),
            })
            .collect()
    }

    fn instantiate_bare(&self, token: &str, value: &str) -> Result<ConfiguredRule, ConfigError> {
        let (name, builder) = self.lookup(token)?;
        if !value.is_empty() {
            return Err(ConfigError::Validation(format!(
                "rule '{name}' must be given a mapping of parameters, found '{value}'"
            )));
        }
        builder(&RuleParams::empty(name))
    }

    fn lookup(&self, token: &str) -> Result<(RuleName, Builder), ConfigError> {
        let unknown = || ConfigError::UnknownRule {
            token: token.to_string(),
        };
        let name = parse_rule_name(token).map_err(|_| unknown())?;
        let builder = self.builders.get(&name).ok_or_else(unknown)?;
        Ok((name, *builder))
    }

    /// Parse a rule-definition file (XML, YAML or JSON) and build its rules.
    pub fn load(&self, path: &Path) -> Result<Vec<ConfiguredRule>, ConfigError> {
        let definitions = document::load(path)?;
        let rules = self.instantiate_all(&definitions)?;
        tracing::debug!(path = %path.display(), count = rules.len(), "loaded rule definitions");
        Ok(rules)
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn default_builder(name: RuleName) -> Builder {
    use RuleName::*;
    match name {
        TagMustExist | TagMustNotExist | ChangeSetTagMustExist | ChangeSetTagMustNotExist => {
            existence::build
        }
        AttrStartsWith
        | AttrEndsWith
        | AttrNotStartsWith
        | AttrNotEndsWith
        | AttrStartsWithConditioned
        | AttrEndsWithConditioned => attr_shape::build,
        AttrMustExist => attr_presence::build,
        NoHyphensInAttributes
        | NoUnderscoresInAttributes
        | NoUppercaseInAttributes
        | NoLowercaseInAttributes
        | NoWhitespaceInAttributes => attr_charset::build,
        FileNameMatchesRegexp
        | FileMaxLines
        | NoTabs
        | NoTrailingWhitespace
        | FileEndsWithNewline => file_shape::build,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Format, build};
    use crate::rules::RuleRole;

    #[test]
    fn test_defaults_cover_vocabulary() {
        let registry = RuleRegistry::with_defaults();
        for name in RuleName::all() {
            assert!(registry.is_registered(name), "{name} not registered");
        }
        assert!(!RuleRegistry::new().is_registered(RuleName::NoTabs));
    }

    #[test]
    fn test_instantiate_all_keeps_definition_order() {
        let doc = build(
            r#"<rules>
    <no-tabs/>
    <tag-must-exist requiredTag="rollback"/>
    <attr-must-exist tag="createTable" requiredAttribute="remarks"/>
    <no-tabs/>
</rules>"#,
            Format::Xml,
            "rules.xml",
        )
        .unwrap();
        let rules = RuleRegistry::with_defaults().instantiate_all(&doc).unwrap();
        let names: Vec<_> = rules.iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec![
                RuleName::NoTabs,
                RuleName::TagMustExist,
                RuleName::AttrMustExist,
                RuleName::NoTabs
            ]
        );
        let roles: Vec<_> = rules.iter().map(|r| r.role()).collect();
        assert_eq!(
            roles,
            vec![
                RuleRole::File,
                RuleRole::WholeChangeLog,
                RuleRole::ChangeSet,
                RuleRole::File
            ]
        );
    }

    #[test]
    fn test_unknown_token_is_fatal() {
        let doc = build("<rules><no-tabz/></rules>", Format::Xml, "rules.xml").unwrap();
        let err = RuleRegistry::with_defaults()
            .instantiate_all(&doc)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRule { ref token } if token == "no-tabz"));
    }

    #[test]
    fn test_unregistered_rule_is_unknown() {
        let doc = build("<rules><no-tabs/></rules>", Format::Xml, "rules.xml").unwrap();
        let err = RuleRegistry::new().instantiate_all(&doc).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRule { .. }));
    }

    #[test]
    fn test_yaml_definitions_with_list_parameter() {
        let doc = build(
            "rules:\n  - tag-must-exist:\n      requiredTag: rollback\n      excludedAncestorTags:\n        - databaseChangeLog\n        - include\n  - file-max-lines:\n      maxLines: 300\n",
            Format::Yaml,
            "rules.yaml",
        )
        .unwrap();
        let rules = RuleRegistry::with_defaults().instantiate_all(&doc).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].name(), RuleName::FileMaxLines);
    }

    #[test]
    fn test_yaml_entries_without_parameters() {
        let doc = build(
            "rules:\n  - no-tabs:\n  - file-ends-with-newline:\n  - file-max-lines:\n      maxLines: 3\n",
            Format::Yaml,
            "rules.yaml",
        )
        .unwrap();
        let rules = RuleRegistry::with_defaults().instantiate_all(&doc).unwrap();
        let names: Vec<_> = rules.iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec![
                RuleName::NoTabs,
                RuleName::FileEndsWithNewline,
                RuleName::FileMaxLines
            ]
        );
    }

    #[test]
    fn test_yaml_unknown_token_without_parameters_is_fatal() {
        let doc = build("rules:\n  - no-tabz:\n", Format::Yaml, "rules.yaml").unwrap();
        let err = RuleRegistry::with_defaults()
            .instantiate_all(&doc)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRule { ref token } if token == "no-tabz"));
    }

    #[test]
    fn test_json_entry_with_null_parameters() {
        let doc = build(
            r#"{"rules": [{"no-tabs": null}, {"no-trailing-whitespace": {}}]}"#,
            Format::Json,
            "rules.json",
        )
        .unwrap();
        let rules = RuleRegistry::with_defaults().instantiate_all(&doc).unwrap();
        let names: Vec<_> = rules.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec![RuleName::NoTabs, RuleName::NoTrailingWhitespace]);
    }

    #[test]
    fn test_scalar_rule_entry_is_rejected() {
        let doc = build("rules:\n  - no-tabs: yes\n", Format::Yaml, "rules.yaml").unwrap();
        let err = RuleRegistry::with_defaults()
            .instantiate_all(&doc)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RuleRegistry::with_defaults()
            .load(Path::new("/nonexistent/rules.xml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Definition(_)));
    }
}
