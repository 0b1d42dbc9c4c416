//! Shared test helpers for rule unit tests.

use std::path::Path;

use crate::config::ConfigError;
use crate::document::{CHANGESET_TAG, Document, Format, build, resolve_changeset_identity};
use crate::exclusions::ExclusionIndex;
use crate::rules::{ConfiguredRule, RuleContext, RuleRegistry, SourceFile};
use crate::violation::ValidationError;

/// File name used for every document built by these helpers.
pub const TEST_FILE: &str = "test.xml";

/// Parse an XML changelog, panicking on malformed input.
pub fn xml(source: &str) -> Document {
    build(source, Format::Xml, TEST_FILE).expect("test changelog should parse")
}

/// Build one rule from a single XML rule-definition element.
pub fn try_rule_from(definition: &str) -> Result<ConfiguredRule, ConfigError> {
    let doc = build(
        &format!("<rules>{definition}</rules>"),
        Format::Xml,
        "rules.xml",
    )
    .expect("rule definition should parse");
    let entry = doc.root().children().next().expect("one rule entry");
    RuleRegistry::with_defaults().instantiate(entry)
}

pub fn rule_from(definition: &str) -> ConfiguredRule {
    try_rule_from(definition).expect("rule definition should be valid")
}

/// Run a tree rule the way the engine does, minus exclusion filtering.
///
/// Changeset rules run once per changeset; failures carry the changeset identity.
pub fn run_rule(
    rule: &ConfiguredRule,
    doc: &Document,
    exclusions: &ExclusionIndex,
) -> Vec<ValidationError> {
    let ctx = RuleContext {
        file_name: TEST_FILE,
        format: doc.format(),
        exclusions,
    };
    match rule {
        ConfiguredRule::File(_) => panic!("use run_file_rule for file rules"),
        ConfiguredRule::ChangeLog(rule) => rule
            .validate_changelog(doc.root(), &ctx)
            .err()
            .into_iter()
            .collect(),
        ConfiguredRule::ChangeSet(rule) => doc
            .find_by_name(CHANGESET_TAG)
            .into_iter()
            .filter_map(|changeset| {
                rule.validate_changeset(changeset, &ctx)
                    .err()
                    .map(|err| err.or_changeset(resolve_changeset_identity(changeset)))
            })
            .collect(),
    }
}

/// Run a file rule against in-memory content.
pub fn run_file_rule(
    rule: &ConfiguredRule,
    file_name: &str,
    content: &str,
) -> Result<(), ValidationError> {
    let ConfiguredRule::File(rule) = rule else {
        panic!("not a file rule");
    };
    rule.validate_file(&SourceFile {
        path: Path::new(file_name),
        file_name,
        content,
    })
}
