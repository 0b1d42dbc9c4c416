//! Changeset identity lookup for arbitrary nodes
//!
//! Exclusions are keyed by the `(id, author)` pair of a changeset, but rules
//! report on whatever node they were looking at. Resolution walks the parent
//! index upward until it meets a changeset element.

use std::fmt;

use serde::Serialize;

use super::{CHANGESET_TAG, Node};

/// `(id, author)` of a changeset. Both fields are empty when no changeset encloses the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ChangeSetIdentity {
    pub id: String,
    pub author: String,
}

impl ChangeSetIdentity {
    pub fn new(id: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
        }
    }

    /// True for the identity of a node outside any changeset.
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.author.is_empty()
    }

    fn of(changeset: Node<'_>) -> Self {
        Self::new(
            changeset.property_value("id").unwrap_or_default(),
            changeset.property_value("author").unwrap_or_default(),
        )
    }
}

impl fmt::Display for ChangeSetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.id, self.author)
    }
}

/// The nearest changeset at or above `node`.
pub fn enclosing_changeset(node: Node<'_>) -> Option<Node<'_>> {
    std::iter::once(node)
        .chain(node.ancestors())
        .find(|candidate| candidate.name() == CHANGESET_TAG)
}

/// Identity of the nearest changeset at or above `node`.
///
/// Never fails: a node with no enclosing changeset resolves to the empty
/// identity, so the result can always be used as an exclusion lookup key.
pub fn resolve_changeset_identity(node: Node<'_>) -> ChangeSetIdentity {
    enclosing_changeset(node)
        .map(ChangeSetIdentity::of)
        .unwrap_or_default()
}
