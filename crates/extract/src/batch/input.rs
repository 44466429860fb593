use serde_json::Value;

use crate::consts;
use crate::error::{Error, ErrorKind};

/// The two shapes of raw listing the batch parser accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    /// One text blob, split into entries on runs of newlines.
    Text(String),
    /// Entries that were already split, used as-is.
    Lines(Vec<String>),
}
impl RawInput {
    /// Splits into entries. Runs of newlines collapse, so blank lines never
    /// become entries; a leading or trailing newline still yields one empty
    /// entry, which the marker gate then skips.
    pub fn entries(&self) -> Vec<&str> {
        match self {
            Self::Text(text) => consts::NEWLINES_REGEX.split(text).collect(),
            Self::Lines(lines) => lines.iter().map(String::as_str).collect(),
        }
    }
}
impl From<String> for RawInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}
impl From<&str> for RawInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}
impl From<Vec<String>> for RawInput {
    fn from(lines: Vec<String>) -> Self {
        Self::Lines(lines)
    }
}

/// Loosely-typed input, e.g. a JSON document handed over by another tool.
/// Only a string or an array of strings is a valid listing.
impl TryFrom<Value> for RawInput {
    type Error = Error;
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Ok(Self::Text(text)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(line) => Ok(line),
                    other => Err(Error::from(ErrorKind::InvalidInputKind(format!(
                        "array containing {}",
                        kind_of(&other)
                    )))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Lines),
            other => exn::bail!(ErrorKind::InvalidInputKind(kind_of(&other).to_string())),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
