//! XML changelog builder
//!
//! Reads the changelog with `quick-xml` and maps it one-to-one onto the
//! document model: element local name to node name, attributes to
//! properties, child elements to children, and the first non-blank text or
//! CDATA section to the node value. Comments, processing instructions and
//! the XML declaration are dropped.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{ChangelogParser, Document, Format, NodeId, SyntaxError, TreeBuilder};

/// Builds documents from XML changelogs via `quick-xml`.
pub struct XmlParser;

impl ChangelogParser for XmlParser {
    fn parse(&self, source: &str) -> Result<Document, SyntaxError> {
        let mut reader = Reader::from_str(source);
        reader.trim_text(true);

        let mut builder = TreeBuilder::new(Format::Xml);
        let mut open: Vec<NodeId> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Eof => break,
                Event::Start(ref e) => {
                    let id = open_element(&mut builder, &open, e)?;
                    open.push(id);
                }
                Event::Empty(ref e) => {
                    open_element(&mut builder, &open, e)?;
                }
                Event::End(_) => {
                    open.pop();
                }
                Event::Text(ref e) => {
                    let text = e.unescape()?;
                    record_text(&mut builder, &open, &text);
                }
                Event::CData(ref e) => {
                    let text = String::from_utf8_lossy(e.as_ref());
                    record_text(&mut builder, &open, &text);
                }
                // Ignore comments, processing instructions, declarations
                _ => {}
            }
            buf.clear();
        }

        if !open.is_empty() {
            return Err(SyntaxError::Structure(format!(
                "{} element(s) left unclosed at end of file",
                open.len()
            )));
        }

        builder.finish()
    }
}

fn open_element(
    builder: &mut TreeBuilder,
    open: &[NodeId],
    start: &BytesStart<'_>,
) -> Result<NodeId, SyntaxError> {
    let name = local_name(start.name().as_ref());
    let parent = open.last().copied();
    if parent.is_none() && builder.has_root() {
        return Err(SyntaxError::Structure(format!(
            "unexpected second root element <{name}>"
        )));
    }

    let id = builder.add_node(parent, name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        builder.set_property(id, key, value);
    }
    Ok(id)
}

/// Keep the first non-blank text chunk of the innermost open element.
fn record_text(builder: &mut TreeBuilder, open: &[NodeId], text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if let Some(&current) = open.last() {
        if builder.value(current).is_empty() {
            builder.set_value(current, text);
        }
    }
}

/// Get the local name from a potentially namespace-prefixed tag name.
///
/// For example, `dbchangelog:changeSet` becomes `changeSet`.
fn local_name(name: &[u8]) -> String {
    let full = String::from_utf8_lossy(name);
    match full.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => full.to_string(),
    }
}
