//! YAML changelog builder

use serde_yaml::Value;

use super::structured::{Structured, build_document};
use super::{ChangelogParser, Document, Format, SyntaxError};

/// Builds documents from YAML changelogs via `serde_yaml`.
pub struct YamlParser;

impl ChangelogParser for YamlParser {
    fn parse(&self, source: &str) -> Result<Document, SyntaxError> {
        let value: Value = serde_yaml::from_str(source)?;
        build_document(Format::Yaml, lower(value))
    }
}

fn lower(value: Value) -> Structured {
    match value {
        Value::Sequence(items) => Structured::List(items.into_iter().map(lower).collect()),
        Value::Mapping(mapping) => Structured::Map(
            mapping
                .into_iter()
                .map(|(key, member)| (scalar_text(key), lower(member)))
                .collect(),
        ),
        Value::Tagged(tagged) => lower(tagged.value),
        scalar => Structured::Scalar(scalar_text(scalar)),
    }
}

/// Canonical text of a scalar. Non-scalar keys fall back to their YAML rendering.
fn scalar_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s,
        Value::Tagged(tagged) => scalar_text(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|rendered| rendered.trim_end().to_string())
            .unwrap_or_default(),
    }
}
