//! JSON changelog builder

use serde_json::Value;

use super::structured::{Structured, build_document};
use super::{ChangelogParser, Document, Format, SyntaxError};

/// Builds documents from JSON changelogs via `serde_json`.
///
/// Relies on the `preserve_order` feature so object members keep document order.
pub struct JsonParser;

impl ChangelogParser for JsonParser {
    fn parse(&self, source: &str) -> Result<Document, SyntaxError> {
        let value: Value = serde_json::from_str(source)?;
        build_document(Format::Json, lower(value))
    }
}

fn lower(value: Value) -> Structured {
    match value {
        Value::Null => Structured::Scalar(String::new()),
        Value::Bool(b) => Structured::Scalar(b.to_string()),
        Value::Number(n) => Structured::Scalar(n.to_string()),
        Value::String(s) => Structured::Scalar(s),
        Value::Array(items) => Structured::List(items.into_iter().map(lower).collect()),
        Value::Object(members) => Structured::Map(
            members
                .into_iter()
                .map(|(key, member)| (key, lower(member)))
                .collect(),
        ),
    }
}
