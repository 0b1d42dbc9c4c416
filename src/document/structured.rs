//! Tree construction shared by the YAML and JSON builders
//!
//! Both formats are lowered into [`Structured`] first, so the mapping from
//! objects and lists to nodes exists exactly once.
//!
//! List items that are mappings are merged into the list's own node: their
//! scalar members become properties of that node (a repeated key overwrites
//! the earlier one) and their nested members become its children. A list of
//! `- column: {...}` entries therefore yields one node with one `column`
//! child per entry, while a list of flat mappings collapses into a single
//! property bag. Existing rule sets depend on that collapse.

use super::{Document, Format, NodeId, SyntaxError, TreeBuilder};

/// Format-neutral value lowered from `serde_yaml::Value` or `serde_json::Value`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Structured {
    Scalar(String),
    List(Vec<Structured>),
    Map(Vec<(String, Structured)>),
}

/// Build a document from the top-level value of a YAML or JSON file.
///
/// A top-level mapping with a single container member becomes a root named
/// after that member, which makes `databaseChangeLog:` the root just like the
/// XML root element. Any other top-level mapping hangs off an unnamed root.
pub(crate) fn build_document(format: Format, top: Structured) -> Result<Document, SyntaxError> {
    let mut entries = match top {
        Structured::Map(entries) => entries,
        Structured::Scalar(text) if text.is_empty() => {
            return Err(SyntaxError::Structure("document is empty".to_string()));
        }
        _ => {
            return Err(SyntaxError::Structure(
                "expected a mapping at the top level".to_string(),
            ));
        }
    };

    let mut builder = TreeBuilder::new(format);
    let single_container = matches!(
        entries.as_slice(),
        [(_, Structured::Map(_) | Structured::List(_))]
    );
    match entries.pop() {
        Some((key, value)) if single_container => {
            let root = builder.add_node(None, key);
            populate(&mut builder, root, value);
        }
        last => {
            entries.extend(last);
            let root = builder.add_node(None, "");
            populate(&mut builder, root, Structured::Map(entries));
        }
    }
    builder.finish()
}

fn populate(builder: &mut TreeBuilder, node: NodeId, value: Structured) {
    match value {
        Structured::Scalar(text) => builder.append_value(node, &text),
        Structured::Map(entries) => {
            for (key, member) in entries {
                match member {
                    Structured::Scalar(text) => builder.set_property(node, key, text),
                    nested => {
                        let child = builder.add_node(Some(node), key);
                        populate(builder, child, nested);
                    }
                }
            }
        }
        Structured::List(items) => {
            for item in items {
                populate(builder, node, item);
            }
        }
    }
}
