//! File-shape rules
//!
//! These see the raw text and bare file name of a changelog, never the tree.

use std::collections::BTreeSet;

use regex::Regex;

use crate::config::ConfigError;
use crate::violation::ValidationError;

use super::{ConfiguredRule, FileRule, Rule, RuleName, RuleParams, SourceFile};

pub(super) const NAME_MATCHES: &str = "The changelog file name must match a regular expression";
pub(super) const MAX_LINES: &str = "A changelog file must not exceed a line count";
pub(super) const NO_TABS: &str = "A changelog file must not contain tab characters";
pub(super) const NO_TRAILING_WHITESPACE: &str = "Lines must not end with spaces or tabs";
pub(super) const ENDS_WITH_NEWLINE: &str = "A non-empty changelog file must end with a newline";

pub(super) const EXPLAIN: &str = "File-shape rules\n\
         \n\
         file-name-matches-regexp  regexp, excludedFileNames?\n\
         file-max-lines            maxLines\n\
         no-tabs                   (none)\n\
         no-trailing-whitespace    (none)\n\
         file-ends-with-newline    (none)\n\
         \n\
         The regular expression is applied to the bare file name; anchor it\n\
         with ^ and $ for a whole-name match. Lines are counted the way an\n\
         editor shows them, a final newline does not start a new line.\n\
         \n\
         Example:\n\
           <file-name-matches-regexp regexp=\"^\\d{8}_[a-z_]+\\.xml$\"\n\
                                     excludedFileNames=\"master.xml\"/>\n\
           <file-max-lines maxLines=\"500\"/>";

#[derive(Debug, Clone)]
enum Shape {
    NameMatches {
        regex: Regex,
        excluded: BTreeSet<String>,
    },
    MaxLines(usize),
    NoTabs,
    NoTrailingWhitespace,
    EndsWithNewline,
}

#[derive(Debug, Clone)]
pub struct FileShape {
    rule: RuleName,
    shape: Shape,
}

impl Rule for FileShape {
    fn name(&self) -> RuleName {
        self.rule
    }
}

impl FileRule for FileShape {
    fn validate_file(&self, file: &SourceFile<'_>) -> Result<(), ValidationError> {
        match &self.shape {
            Shape::NameMatches { regex, excluded } => {
                if excluded.contains(file.file_name) || regex.is_match(file.file_name) {
                    return Ok(());
                }
                Err(ValidationError::new(format!(
                    "file name '{}' does not match '{}'",
                    file.file_name,
                    regex.as_str()
                )))
            }
            Shape::MaxLines(limit) => {
                let lines = file.content.lines().count();
                if lines > *limit {
                    return Err(ValidationError::new(format!(
                        "file has {lines} lines, more than the allowed {limit}"
                    )));
                }
                Ok(())
            }
            Shape::NoTabs => match first_line(file.content, |line| line.contains('\t')) {
                Some(line) => Err(ValidationError::new(format!(
                    "tab character on line {line}"
                ))),
                None => Ok(()),
            },
            Shape::NoTrailingWhitespace => {
                let trailing = |line: &str| line.ends_with(' ') || line.ends_with('\t');
                match first_line(file.content, trailing) {
                    Some(line) => Err(ValidationError::new(format!(
                        "trailing whitespace on line {line}"
                    ))),
                    None => Ok(()),
                }
            }
            Shape::EndsWithNewline => {
                if file.content.is_empty() || file.content.ends_with('\n') {
                    Ok(())
                } else {
                    Err(ValidationError::new("file does not end with a newline"))
                }
            }
        }
    }
}

/// 1-based number of the first line matching `predicate`.
fn first_line(content: &str, predicate: impl Fn(&str) -> bool) -> Option<usize> {
    content
        .lines()
        .position(|line| predicate(line.strip_suffix('\r').unwrap_or(line)))
        .map(|index| index + 1)
}

pub(super) fn build(params: &RuleParams<'_>) -> Result<ConfiguredRule, ConfigError> {
    let rule = params.rule();
    let shape = match rule {
        RuleName::FileNameMatchesRegexp => {
            let pattern = params.required("regexp")?;
            let regex = Regex::new(pattern).map_err(|err| ConfigError::InvalidParameter {
                rule,
                parameter: "regexp".to_string(),
                message: err.to_string(),
            })?;
            Shape::NameMatches {
                regex,
                excluded: params.list("excludedFileNames"),
            }
        }
        RuleName::FileMaxLines => Shape::MaxLines(params.parsed("maxLines")?),
        RuleName::NoTabs => Shape::NoTabs,
        RuleName::NoTrailingWhitespace => Shape::NoTrailingWhitespace,
        _ => Shape::EndsWithNewline,
    };
    Ok(ConfiguredRule::File(Box::new(FileShape { rule, shape })))
}
