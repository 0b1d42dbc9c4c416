//! Format-agnostic document model for changelog files
//!
//! XML, YAML and JSON changelogs are all lowered into the same [`Document`]
//! tree, so rules never see syntax-specific details. Nodes live in an arena
//! addressed by [`NodeId`]; each node stores the index of its parent, which
//! is what ancestor lookups walk. A document is built once per file and is
//! read-only afterwards, apart from the one-time structural property strip
//! the engine applies before any rule runs.

pub mod ancestry;
mod json;
mod structured;
mod xml;
mod yaml;

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

pub use ancestry::{ChangeSetIdentity, enclosing_changeset, resolve_changeset_identity};
pub use json::JsonParser;
pub use xml::XmlParser;
pub use yaml::YamlParser;

/// Element name that marks a changeset unit in every supported format.
pub const CHANGESET_TAG: &str = "changeSet";

/// Source syntax of a changelog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Xml,
    Yaml,
    Json,
}

impl Format {
    /// Detect the format from a file extension. Case-insensitive.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xml" => Some(Self::Xml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// The builder responsible for this format.
    pub fn parser(&self) -> &'static dyn ChangelogParser {
        match self {
            Self::Xml => &XmlParser,
            Self::Yaml => &YamlParser,
            Self::Json => &JsonParser,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xml => "XML",
            Self::Yaml => "YAML",
            Self::Json => "JSON",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Low-level syntax failure raised by one of the format builders.
#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Structure(String),
}

/// A changelog (or definition file) that could not be turned into a tree.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error reading {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file format for {file} (expected .xml, .yaml, .yml or .json)")]
    UnsupportedFormat { file: String },

    #[error("{format} parse error in {file}: {source}")]
    Syntax {
        file: String,
        format: Format,
        #[source]
        source: SyntaxError,
    },
}

/// Trait for changelog builders. Each source syntax implements this.
pub trait ChangelogParser: Send + Sync {
    /// Build a document tree from source text.
    fn parse(&self, source: &str) -> Result<Document, SyntaxError>;
}

/// Build a document from source text in the given format.
///
/// `file_name` is only used to label the error.
pub fn build(source: &str, format: Format, file_name: &str) -> Result<Document, ParseError> {
    format
        .parser()
        .parse(source)
        .map_err(|source| ParseError::Syntax {
            file: file_name.to_string(),
            format,
            source,
        })
}

/// Read and build a document from disk, detecting the format from the extension.
pub fn load(path: &Path) -> Result<Document, ParseError> {
    let file = path.display().to_string();
    let format = Format::from_path(path).ok_or_else(|| ParseError::UnsupportedFormat {
        file: file.clone(),
    })?;
    let source = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        file: file.clone(),
        source,
    })?;
    build(&source, format, &file)
}

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    properties: Vec<(String, String)>,
    children: Vec<NodeId>,
    /// Properties and children interleaved in source order.
    members: Vec<Slot>,
    value: String,
    parent: Option<NodeId>,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Property(usize),
    Child(NodeId),
}

/// One property or child of a node, see [`Node::members`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member<'a> {
    Property(&'a str, &'a str),
    Child(Node<'a>),
}

/// A parsed changelog: an arena of nodes rooted at index 0.
#[derive(Debug, Clone)]
pub struct Document {
    format: Format,
    nodes: Vec<NodeData>,
}

impl Document {
    pub fn format(&self) -> Format {
        self.format
    }

    pub fn root(&self) -> Node<'_> {
        Node {
            doc: self,
            id: NodeId(0),
        }
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a document has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes named `name`, in document order.
    pub fn find_by_name(&self, name: &str) -> Vec<Node<'_>> {
        self.root().find_by_name(name)
    }

    /// Clear the properties of every node whose name is in `tags`.
    ///
    /// Structural elements (the changelog root, comments, includes) carry
    /// attributes such as schema locations and file paths that must never
    /// feed attribute-naming rules.
    pub fn strip_properties(&mut self, tags: &BTreeSet<String>) {
        for node in &mut self.nodes {
            if tags.contains(&node.name) {
                node.properties.clear();
                node.members.retain(|slot| matches!(slot, Slot::Child(_)));
            }
        }
    }
}

/// Borrowed handle to one node of a [`Document`].
///
/// This is the navigation contract every rule works against, whatever the
/// source syntax was.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> Node<'a> {
    fn data(self) -> &'a NodeData {
        &self.doc.nodes[self.id.0]
    }

    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn name(self) -> &'a str {
        &self.data().name
    }

    pub fn has_property(self, name: &str) -> bool {
        self.property_value(name).is_some()
    }

    pub fn property_value(self, name: &str) -> Option<&'a str> {
        self.data()
            .properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Ordered `(key, value)` pairs.
    pub fn properties(self) -> &'a [(String, String)] {
        &self.data().properties
    }

    /// Text value; empty for structural containers.
    pub fn value(self) -> &'a str {
        &self.data().value
    }

    pub fn children(self) -> impl Iterator<Item = Node<'a>> {
        let doc = self.doc;
        self.data().children.iter().map(move |&id| Node { doc, id })
    }

    /// Properties and children in the order the source declared them.
    pub fn members(self) -> impl Iterator<Item = Member<'a>> {
        let doc = self.doc;
        let data = self.data();
        data.members.iter().map(move |slot| match *slot {
            Slot::Property(index) => {
                let (key, value) = &data.properties[index];
                Member::Property(key, value)
            }
            Slot::Child(id) => Member::Child(Node { doc, id }),
        })
    }

    pub fn parent(self) -> Option<Node<'a>> {
        let doc = self.doc;
        self.data().parent.map(|id| Node { doc, id })
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(self) -> impl Iterator<Item = Node<'a>> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    /// This node and everything below it, pre-order depth-first.
    pub fn descendants(self) -> Vec<Node<'a>> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children = &node.data().children;
            stack.extend(children.iter().rev().map(|&id| Node { doc: self.doc, id }));
        }
        out
    }

    /// Every node named `name` in this subtree (including this node), in document order.
    pub fn find_by_name(self, name: &str) -> Vec<Node<'a>> {
        self.descendants()
            .into_iter()
            .filter(|node| node.name() == name)
            .collect()
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id.0)
            .field("name", &self.name())
            .field("properties", &self.properties())
            .finish()
    }
}

/// Incremental arena construction shared by all format builders.
pub(crate) struct TreeBuilder {
    format: Format,
    nodes: Vec<NodeData>,
}

impl TreeBuilder {
    pub(crate) fn new(format: Format) -> Self {
        Self {
            format,
            nodes: Vec::new(),
        }
    }

    pub(crate) fn has_root(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Append a node. The first node added (with `parent == None`) is the root.
    pub(crate) fn add_node(&mut self, parent: Option<NodeId>, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            name: name.into(),
            properties: Vec::new(),
            children: Vec::new(),
            members: Vec::new(),
            value: String::new(),
            parent,
        });
        if let Some(parent) = parent {
            let parent = &mut self.nodes[parent.0];
            parent.children.push(id);
            parent.members.push(Slot::Child(id));
        }
        id
    }

    /// Insert or overwrite a property; an existing key keeps its position.
    pub(crate) fn set_property(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        let key = key.into();
        let value = value.into();
        let node = &mut self.nodes[id.0];
        match node.properties.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => {
                node.members.push(Slot::Property(node.properties.len()));
                node.properties.push((key, value));
            }
        }
    }

    pub(crate) fn value(&self, id: NodeId) -> &str {
        &self.nodes[id.0].value
    }

    pub(crate) fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        self.nodes[id.0].value = value.into();
    }

    /// Append to the value, comma-separated.
    pub(crate) fn append_value(&mut self, id: NodeId, text: &str) {
        let value = &mut self.nodes[id.0].value;
        if !value.is_empty() {
            value.push(',');
        }
        value.push_str(text);
    }

    pub(crate) fn finish(self) -> Result<Document, SyntaxError> {
        if self.nodes.is_empty() {
            return Err(SyntaxError::Structure(
                "document has no root element".to_string(),
            ));
        }
        Ok(Document {
            format: self.format,
            nodes: self.nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Document {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<databaseChangeLog xmlns="http://www.liquibase.org/xml/ns/dbchangelog">
    <changeSet id="1" author="alice">
        <createTable tableName="person">
            <column name="id" type="int"/>
        </createTable>
    </changeSet>
    <changeSet id="2" author="bob">
        <sql>select 1</sql>
    </changeSet>
</databaseChangeLog>"#;
        build(xml, Format::Xml, "sample.xml").expect("valid xml")
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a/b.xml")), Some(Format::Xml));
        assert_eq!(Format::from_path(Path::new("b.YML")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("b.yaml")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("b.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("b.sql")), None);
        assert_eq!(Format::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_find_by_name_document_order() {
        let doc = sample();
        let sets = doc.find_by_name(CHANGESET_TAG);
        let ids: Vec<_> = sets.iter().map(|n| n.property_value("id")).collect();
        assert_eq!(ids, vec![Some("1"), Some("2")]);
    }

    #[test]
    fn test_navigation() {
        let doc = sample();
        let root = doc.root();
        assert_eq!(root.name(), "databaseChangeLog");
        assert!(root.parent().is_none());

        let column = doc.find_by_name("column")[0];
        assert_eq!(column.property_value("type"), Some("int"));
        assert!(column.has_property("name"));
        assert!(!column.has_property("nullable"));

        let names: Vec<_> = column.ancestors().map(|n| n.name()).collect();
        assert_eq!(names, vec!["createTable", "changeSet", "databaseChangeLog"]);

        let sql = doc.find_by_name("sql")[0];
        assert_eq!(sql.value(), "select 1");
        assert_eq!(sql.children().count(), 0);
    }

    #[test]
    fn test_strip_properties_only_touches_listed_tags() {
        let mut doc = sample();
        assert!(doc.root().has_property("xmlns"));

        let tags: BTreeSet<String> = ["databaseChangeLog".to_string()].into();
        doc.strip_properties(&tags);

        assert!(doc.root().properties().is_empty());
        assert_eq!(doc.find_by_name(CHANGESET_TAG)[0].property_value("id"), Some("1"));
    }

    #[test]
    fn test_members_interleave_properties_and_children_in_source_order() {
        let mut builder = TreeBuilder::new(Format::Yaml);
        let root = builder.add_node(None, "rules");
        builder.set_property(root, "no-tabs", "");
        builder.add_node(Some(root), "file-max-lines");
        builder.set_property(root, "file-ends-with-newline", "");
        builder.set_property(root, "no-tabs", "again");
        let mut doc = builder.finish().expect("has root");

        let names: Vec<&str> = doc
            .root()
            .members()
            .map(|member| match member {
                Member::Property(key, _) => key,
                Member::Child(node) => node.name(),
            })
            .collect();
        assert_eq!(names, vec!["no-tabs", "file-max-lines", "file-ends-with-newline"]);
        assert!(doc.root().members().any(|m| m == Member::Property("no-tabs", "again")));

        doc.strip_properties(&["rules".to_string()].into());
        assert_eq!(doc.root().members().count(), 1);
    }

    #[test]
    fn test_set_property_last_write_wins_keeps_position() {
        let mut builder = TreeBuilder::new(Format::Yaml);
        let root = builder.add_node(None, "root");
        builder.set_property(root, "a", "1");
        builder.set_property(root, "b", "2");
        builder.set_property(root, "a", "3");
        let doc = builder.finish().expect("has root");
        assert_eq!(
            doc.root().properties(),
            &[
                ("a".to_string(), "3".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_empty_builder_is_error() {
        let err = TreeBuilder::new(Format::Xml).finish().unwrap_err();
        assert!(err.to_string().contains("no root"));
    }

    #[test]
    fn test_build_error_names_file() {
        let err = build("<a><b></a>", Format::Xml, "broken.xml").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("broken.xml"), "got: {message}");
        assert!(message.contains("XML"), "got: {message}");
    }

    /// Random tree shapes: each entry picks a parent among the nodes already built.
    pub(crate) fn arb_tree() -> impl Strategy<Value = Document> {
        let names = prop::sample::select(vec!["changeSet", "createTable", "column", "sql", "x"]);
        prop::collection::vec((any::<prop::sample::Index>(), names), 0..40).prop_map(|entries| {
            let mut builder = TreeBuilder::new(Format::Xml);
            builder.add_node(None, "databaseChangeLog");
            let mut count = 1;
            for (parent, name) in entries {
                let parent = NodeId(parent.index(count));
                let id = builder.add_node(Some(parent), name);
                builder.set_property(id, "id", format!("n{}", id.0));
                builder.set_property(id, "author", "prop");
                count += 1;
            }
            builder.finish().expect("root added")
        })
    }

    proptest! {
        #[test]
        fn prop_descendants_visit_every_node_once_in_preorder(doc in arb_tree()) {
            let all = doc.root().descendants();
            prop_assert_eq!(all.len(), doc.len());

            let mut seen = BTreeSet::new();
            for (position, node) in all.iter().enumerate() {
                prop_assert!(seen.insert(node.id()));
                if let Some(parent) = node.parent() {
                    let parent_position = all.iter().position(|n| *n == parent);
                    prop_assert!(parent_position.is_some_and(|p| p < position));
                }
            }
        }

        #[test]
        fn prop_find_by_name_is_ordered_subsequence(doc in arb_tree()) {
            let all = doc.root().descendants();
            let found = doc.find_by_name("column");
            let expected: Vec<_> = all.into_iter().filter(|n| n.name() == "column").collect();
            prop_assert_eq!(found, expected);
        }
    }
}
