//! Validation engine
//!
//! Per file: parse, strip structural properties, then run every configured
//! rule in definition order. File-level exclusions are checked once per rule
//! per file; changeset-level exclusions once per changeset. Files are
//! independent, so they are validated in parallel and the per-file results
//! concatenated in input order.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::document::{self, CHANGESET_TAG, Format, ParseError, resolve_changeset_identity};
use crate::exclusions::ExclusionIndex;
use crate::rules::{ConfiguredRule, RuleContext, SourceFile};
use crate::violation::Violation;

/// Configured rules and exclusions, shared read-only by every file.
pub struct Validator {
    rules: Vec<ConfiguredRule>,
    exclusions: ExclusionIndex,
    structural_tags: BTreeSet<String>,
}

/// Ordered violations of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    count: usize,
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self {
            count: violations.len(),
            violations,
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Bare file name used in violations and exclusion lookups.
pub fn bare_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl Validator {
    pub fn new(
        rules: Vec<ConfiguredRule>,
        exclusions: ExclusionIndex,
        structural_tags: BTreeSet<String>,
    ) -> Self {
        Self {
            rules,
            exclusions,
            structural_tags,
        }
    }

    /// Validate every file; violations come back in file order.
    pub fn validate(&self, files: &[PathBuf]) -> ValidationReport {
        let per_file: Vec<Vec<Violation>> = files
            .par_iter()
            .map(|path| self.validate_path(path))
            .collect();
        let report = ValidationReport::new(per_file.into_iter().flatten().collect());
        info!(
            files = files.len(),
            rules = self.rules.len(),
            violations = report.count(),
            "validation finished"
        );
        report
    }

    /// Read and validate one file.
    pub fn validate_path(&self, path: &Path) -> Vec<Violation> {
        let file_name = bare_file_name(path);
        if self.exclusions.is_file_excluded_entirely(&file_name) {
            debug!(file = %file_name, "file excluded for every rule, skipping");
            return Vec::new();
        }
        let Some(format) = Format::from_path(path) else {
            let error = ParseError::UnsupportedFormat {
                file: path.display().to_string(),
            };
            return vec![Violation::parse_failure(&file_name, &error)];
        };
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(source) => {
                let error = ParseError::Io {
                    file: path.display().to_string(),
                    source,
                };
                return vec![Violation::parse_failure(&file_name, &error)];
            }
        };
        self.validate_source(path, format, &content)
    }

    /// Validate in-memory content as if it had been read from `path`.
    pub fn validate_source(&self, path: &Path, format: Format, content: &str) -> Vec<Violation> {
        let file_name = bare_file_name(path);
        if self.exclusions.is_file_excluded_entirely(&file_name) {
            return Vec::new();
        }
        debug!(file = %file_name, %format, "validating");

        let mut doc = match document::build(content, format, &file_name) {
            Ok(doc) => doc,
            Err(error) => {
                debug!(file = %file_name, %error, "parse failed");
                return vec![Violation::parse_failure(&file_name, &error)];
            }
        };
        doc.strip_properties(&self.structural_tags);

        let source = SourceFile {
            path,
            file_name: &file_name,
            content,
        };
        let ctx = RuleContext {
            file_name: &file_name,
            format,
            exclusions: &self.exclusions,
        };
        let changesets = doc.find_by_name(CHANGESET_TAG);

        let mut violations = Vec::new();
        for rule in &self.rules {
            let name = rule.name();
            if self.exclusions.is_file_excluded(&file_name, name) {
                debug!(file = %file_name, rule = %name, "rule excluded for file");
                continue;
            }
            match rule {
                ConfiguredRule::File(rule) => {
                    if let Err(error) = rule.validate_file(&source) {
                        violations.push(Violation::from_error(&file_name, name, &error));
                    }
                }
                ConfiguredRule::ChangeLog(rule) => {
                    if let Err(error) = rule.validate_changelog(doc.root(), &ctx) {
                        violations.push(Violation::from_error(&file_name, name, &error));
                    }
                }
                ConfiguredRule::ChangeSet(rule) => {
                    for changeset in &changesets {
                        let identity = resolve_changeset_identity(*changeset);
                        if self
                            .exclusions
                            .is_changeset_excluded(&file_name, &identity, name)
                        {
                            debug!(
                                file = %file_name,
                                rule = %name,
                                changeset = %identity,
                                "rule excluded for changeset"
                            );
                            continue;
                        }
                        if let Err(error) = rule.validate_changeset(*changeset, &ctx) {
                            let error = error.or_changeset(identity);
                            violations.push(Violation::from_error(&file_name, name, &error));
                        }
                    }
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::document::ChangeSetIdentity;
    use crate::exclusions::{ExclusionEntry, RuleSelector};
    use crate::rules::{RuleName, RuleRegistry};
    use crate::violation::PARSE_ERROR_RULE;

    fn rules(definitions: &str) -> Vec<ConfiguredRule> {
        let doc = document::build(
            &format!("<rules>{definitions}</rules>"),
            Format::Xml,
            "rules.xml",
        )
        .unwrap();
        RuleRegistry::with_defaults().instantiate_all(&doc).unwrap()
    }

    fn validator(definitions: &str, exclusions: ExclusionIndex) -> Validator {
        Validator::new(
            rules(definitions),
            exclusions,
            ModelConfig::default().structural_tags,
        )
    }

    fn check(validator: &Validator, file: &str, content: &str) -> Vec<String> {
        validator
            .validate_source(Path::new(file), Format::Xml, content)
            .into_iter()
            .map(Violation::into_string)
            .collect()
    }

    const TWO_CHANGESETS: &str = r#"<databaseChangeLog xmlns="http://www.liquibase.org/xml/ns/dbchangelog">
    <changeSet id="1" author="alice">
        <addForeignKeyConstraint baseTableName="user_activation" constraintName="fk_user_activation"/>
    </changeSet>
    <changeSet id="2" author="bob">
        <addForeignKeyConstraint baseTableName="orders" constraintName="fk_orders"/>
    </changeSet>
</databaseChangeLog>
"#;

    const FK_SUFFIX: &str = r#"<attr-ends-with tag="addForeignKeyConstraint" targetAttribute="constraintName" requiredSuffix="_fk"/>"#;

    #[test]
    fn test_clean_changelog_has_no_violations() {
        let v = validator(FK_SUFFIX, ExclusionIndex::default());
        let clean = TWO_CHANGESETS
            .replace("fk_user_activation", "user_activation_fk")
            .replace("fk_orders", "orders_fk");
        assert!(check(&v, "a.xml", &clean).is_empty());
    }

    #[test]
    fn test_one_violation_per_failing_changeset() {
        let v = validator(FK_SUFFIX, ExclusionIndex::default());
        let violations = check(&v, "a.xml", TWO_CHANGESETS);
        assert_eq!(violations.len(), 2);
        insta::assert_snapshot!(
            violations[0].as_str(),
            @"a.xml: attr-ends-with: changeSet '1::alice': attribute constraintName='fk_user_activation' of <addForeignKeyConstraint> must end with '_fk'"
        );
        assert!(violations[1].contains("changeSet '2::bob'"));
    }

    #[test]
    fn test_missing_rollback_is_one_violation_per_file() {
        let v = validator(
            r#"<tag-must-exist requiredTag="rollback" excludedAncestorTags="databaseChangeLog"/>"#,
            ExclusionIndex::default(),
        );
        let joined = check(&v, "a.xml", TWO_CHANGESETS).join("\n");
        insta::assert_snapshot!(
            joined.as_str(),
            @"a.xml: tag-must-exist: required tag <rollback> does not appear in the changelog"
        );
    }

    #[test]
    fn test_wildcard_file_exclusion_only_affects_that_file() {
        let exclusions = ExclusionIndex::from_entries([ExclusionEntry {
            file_name: "a.xml".to_string(),
            changeset: None,
            rule: RuleSelector::All,
        }]);
        let v = validator(
            &format!("{FK_SUFFIX}<no-tabs/><file-max-lines maxLines=\"1\"/>"),
            exclusions,
        );
        assert!(check(&v, "a.xml", TWO_CHANGESETS).is_empty());
        assert!(check(&v, "a.xml", "<broken").is_empty());
        assert_eq!(check(&v, "b.xml", TWO_CHANGESETS).len(), 3);
    }

    #[test]
    fn test_file_scoped_rule_exclusion() {
        let exclusions = ExclusionIndex::from_entries([ExclusionEntry {
            file_name: "a.xml".to_string(),
            changeset: None,
            rule: RuleSelector::Rule(RuleName::AttrEndsWith),
        }]);
        let v = validator(&format!("{FK_SUFFIX}<file-max-lines maxLines=\"1\"/>"), exclusions);
        let violations = check(&v, "a.xml", TWO_CHANGESETS);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("file-max-lines"));
    }

    #[test]
    fn test_changeset_exclusion_is_exact() {
        let exclusions = ExclusionIndex::from_entries([ExclusionEntry {
            file_name: "a.xml".to_string(),
            changeset: Some(ChangeSetIdentity::new("1", "alice")),
            rule: RuleSelector::Rule(RuleName::AttrEndsWith),
        }]);
        let v = validator(FK_SUFFIX, exclusions);
        let violations = check(&v, "a.xml", TWO_CHANGESETS);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("'2::bob'"));
        // Other files are unaffected.
        assert_eq!(check(&v, "b.xml", TWO_CHANGESETS).len(), 2);
    }

    #[test]
    fn test_parse_failure_is_single_terminal_violation() {
        let v = validator("<no-tabs/><file-ends-with-newline/>", ExclusionIndex::default());
        let violations = check(&v, "bad.xml", "<databaseChangeLog>\t<changeSet>");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].starts_with(&format!("bad.xml: {PARSE_ERROR_RULE}: ")));
    }

    #[test]
    fn test_structural_properties_are_stripped() {
        let v = validator("<no-uppercase-in-attributes/>", ExclusionIndex::default());
        let content = r#"<databaseChangeLog logicalFilePath="DB/Main.xml">
    <changeSet id="1" author="a">
        <comment>Adds TABLE</comment>
        <include file="Other.xml"/>
        <createTable tableName="t"/>
    </changeSet>
</databaseChangeLog>
"#;
        assert!(check(&v, "a.xml", content).is_empty());
    }

    #[test]
    fn test_violations_follow_rule_order_then_document_order() {
        let v = validator(
            &format!(
                "<file-max-lines maxLines=\"1\"/>{FK_SUFFIX}<tag-must-exist requiredTag=\"rollback\"/>"
            ),
            ExclusionIndex::default(),
        );
        let violations = check(&v, "a.xml", TWO_CHANGESETS);
        let rules: Vec<&str> = violations
            .iter()
            .map(|line| line.split(": ").nth(1).unwrap())
            .collect();
        assert_eq!(
            rules,
            vec!["file-max-lines", "attr-ends-with", "attr-ends-with", "tag-must-exist"]
        );
    }

    #[test]
    fn test_validate_reads_files_in_order_and_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = Vec::new();
        for name in ["c.xml", "a.xml", "b.yaml", "notes.txt"] {
            let path = dir.path().join(name);
            let content = if name.ends_with(".yaml") {
                "databaseChangeLog:\n- changeSet:\n    id: '1'\n    author: y\n    changes:\n    - addForeignKeyConstraint:\n        constraintName: fk_y\n"
            } else {
                TWO_CHANGESETS
            };
            std::fs::write(&path, content).unwrap();
            files.push(path);
        }
        files.push(dir.path().join("missing.xml"));

        let v = validator(FK_SUFFIX, ExclusionIndex::default());
        let first = v.validate(&files);
        let second = v.validate(&files);
        assert_eq!(first, second);

        let prefixes: Vec<&str> = first
            .violations()
            .iter()
            .map(|violation| violation.as_str().split(':').next().unwrap())
            .collect();
        assert_eq!(
            prefixes,
            vec!["c.xml", "c.xml", "a.xml", "a.xml", "b.yaml", "notes.txt", "missing.xml"]
        );
        assert!(first.violations()[5].as_str().contains(PARSE_ERROR_RULE));
        assert!(first.violations()[6].as_str().contains(PARSE_ERROR_RULE));
        assert_eq!(first.count(), 7);
        assert!(!first.is_clean());
    }
}
