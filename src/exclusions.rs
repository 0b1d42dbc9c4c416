//! Exclusion index
//!
//! Exclusions silence a rule, or every rule (`*`), either for a whole file
//! or for a single changeset of that file. The definition file is read with
//! the same document builders as changelogs:
//!
//! ```xml
//! <exclusions>
//!     <exclusion fileName="legacy.xml" rule="*"/>
//!     <exclusion fileName="001_users.xml" rule="no-tabs"/>
//!     <exclusion fileName="002_orders.xml" rule="attr-ends-with"
//!                changeSetId="7" changeSetAuthor="dave"/>
//! </exclusions>
//! ```
//!
//! File names are bare file names (the last path component).

use std::collections::{HashMap, HashSet};
use std::path::Path;

use thiserror::Error;

use crate::document::{self, ChangeSetIdentity, Document, Node, ParseError};
use crate::rules::{RuleName, parse_rule_name};

/// Token that excludes every rule.
pub const ALL_RULES: &str = "*";

const ENTRY_TAG: &str = "exclusion";

#[derive(Debug, Error)]
pub enum ExclusionError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("exclusion #{index}: unknown rule '{token}'")]
    UnknownRule { index: usize, token: String },

    #[error("exclusion #{index}: missing '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("exclusion #{index}: changeSetId and changeSetAuthor must be given together")]
    PartialIdentity { index: usize },

    #[error("exclusion #{index}: unexpected element <{name}>")]
    UnexpectedElement { index: usize, name: String },
}

/// Which rules an exclusion applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleSelector {
    All,
    Rule(RuleName),
}

impl RuleSelector {
    fn parse(token: &str) -> Result<Self, String> {
        if token == ALL_RULES {
            Ok(Self::All)
        } else {
            parse_rule_name(token).map(Self::Rule)
        }
    }
}

/// One exclusion-definition entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionEntry {
    pub file_name: String,
    /// `None` excludes the rule for the whole file.
    pub changeset: Option<ChangeSetIdentity>,
    pub rule: RuleSelector,
}

#[derive(Debug, Default)]
struct FileExclusions {
    file_level: HashSet<RuleSelector>,
    changeset_level: HashMap<ChangeSetIdentity, HashSet<RuleSelector>>,
}

fn selects(selectors: &HashSet<RuleSelector>, rule: RuleName) -> bool {
    selectors.contains(&RuleSelector::All) || selectors.contains(&RuleSelector::Rule(rule))
}

/// Three-tier lookup: file and rule, file and changeset and rule, whole file.
#[derive(Debug, Default)]
pub struct ExclusionIndex {
    files: HashMap<String, FileExclusions>,
    entries: usize,
}

impl ExclusionIndex {
    pub fn from_entries(entries: impl IntoIterator<Item = ExclusionEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    pub fn insert(&mut self, entry: ExclusionEntry) {
        let file = self.files.entry(entry.file_name).or_default();
        match entry.changeset {
            None => file.file_level.insert(entry.rule),
            Some(identity) => file
                .changeset_level
                .entry(identity)
                .or_default()
                .insert(entry.rule),
        };
        self.entries += 1;
    }

    /// Load the exclusion file. No path, or a path that does not exist,
    /// gives the empty index.
    pub fn load(path: Option<&Path>) -> Result<Self, ExclusionError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            tracing::warn!(path = %path.display(), "exclusion file not found, nothing is excluded");
            return Ok(Self::default());
        }
        let index = Self::from_document(&document::load(path)?)?;
        tracing::debug!(path = %path.display(), entries = index.len(), "loaded exclusions");
        Ok(index)
    }

    /// Build the index from every `<exclusion>` child of the root.
    pub fn from_document(doc: &Document) -> Result<Self, ExclusionError> {
        let entries = doc
            .root()
            .children()
            .enumerate()
            .map(|(index, node)| parse_entry(index + 1, node))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_entries(entries))
    }

    /// True when `rule` (or every rule) is excluded for the whole file.
    pub fn is_file_excluded(&self, file_name: &str, rule: RuleName) -> bool {
        self.files
            .get(file_name)
            .is_some_and(|file| selects(&file.file_level, rule))
    }

    /// True when the file carries a file-scoped wildcard exclusion.
    pub fn is_file_excluded_entirely(&self, file_name: &str) -> bool {
        self.files
            .get(file_name)
            .is_some_and(|file| file.file_level.contains(&RuleSelector::All))
    }

    /// True when `rule` is excluded for the changeset, or for its whole file.
    pub fn is_changeset_excluded(
        &self,
        file_name: &str,
        changeset: &ChangeSetIdentity,
        rule: RuleName,
    ) -> bool {
        let Some(file) = self.files.get(file_name) else {
            return false;
        };
        selects(&file.file_level, rule)
            || file
                .changeset_level
                .get(changeset)
                .is_some_and(|selectors| selects(selectors, rule))
    }

    /// Number of entries loaded.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

fn field<'a>(node: Node<'a>, key: &str) -> Option<&'a str> {
    node.property_value(key)
        .or_else(|| {
            node.children()
                .find(|child| child.name() == key)
                .map(|child| child.value())
        })
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_entry(index: usize, node: Node<'_>) -> Result<ExclusionEntry, ExclusionError> {
    if node.name() != ENTRY_TAG {
        return Err(ExclusionError::UnexpectedElement {
            index,
            name: node.name().to_string(),
        });
    }
    let required = |name: &'static str| {
        field(node, name).ok_or(ExclusionError::MissingField { index, field: name })
    };
    let file_name = required("fileName")?.to_string();
    let token = required("rule")?;
    let rule = RuleSelector::parse(token).map_err(|token| ExclusionError::UnknownRule {
        index,
        token,
    })?;
    let changeset = match (field(node, "changeSetId"), field(node, "changeSetAuthor")) {
        (Some(id), Some(author)) => Some(ChangeSetIdentity::new(id, author)),
        (None, None) => None,
        _ => return Err(ExclusionError::PartialIdentity { index }),
    };
    Ok(ExclusionEntry {
        file_name,
        changeset,
        rule,
    })
}
