//! JSON writer implementation.

use filer_core::{BoxError, Contents, Encoder, Error, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{json, Value};

use super::JsonTransform;

/// Longest indentation honoured, in spaces or characters.
const MAX_INDENT: usize = 10;

/// Indentation for pretty-printed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Space {
    /// Indent with this many spaces, at most ten.
    Count(usize),
    /// Indent with this text, truncated to ten characters.
    Text(String),
}

impl Space {
    fn indent(&self) -> String {
        match self {
            Self::Count(n) => " ".repeat((*n).min(MAX_INDENT)),
            Self::Text(text) => text.chars().take(MAX_INDENT).collect(),
        }
    }
}

impl From<usize> for Space {
    fn from(n: usize) -> Self {
        Self::Count(n)
    }
}

impl From<&str> for Space {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Space {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Options for [`JsonWriter`].
#[derive(Clone, Default)]
pub struct JsonWriterOptions {
    /// Applied top-down: first to the root under the key `""`, then to the
    /// members of whatever it returns.
    pub replacer: Option<JsonTransform>,
    /// Indentation. Absent, zero or empty means compact output.
    pub space: Option<Space>,
}

impl JsonWriterOptions {
    /// Options for compact output with no replacer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the replacer. It receives the holder's key and the value, and
    /// returns the replacement or `None` to drop the member.
    pub fn replacer<F>(mut self, replacer: F) -> Self
    where
        F: Fn(&str, Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.replacer = Some(std::sync::Arc::new(replacer));
        self
    }

    /// Set the indentation, a space count or an indent string.
    pub fn space(mut self, space: impl Into<Space>) -> Self {
        self.space = Some(space.into());
        self
    }
}

/// Encoder that serializes data as JSON text.
///
/// Structured values serialize as-is, text as a JSON string and raw bytes
/// as `{"type":"Buffer","data":[...]}`.
#[derive(Clone, Default)]
pub struct JsonWriter {
    options: JsonWriterOptions,
}

impl JsonWriter {
    /// Create a new JSON writer.
    pub fn new(options: JsonWriterOptions) -> Self {
        Self { options }
    }

    /// Serialize a value to JSON text.
    pub fn stringify(&self, value: Value) -> Result<String> {
        let value = match &self.options.replacer {
            Some(replacer) => replace(replacer, "", value)
                .ok_or_else(|| Error::InvalidData("replacer dropped the root value".into()))?,
            None => value,
        };

        let indent = self
            .options
            .space
            .as_ref()
            .map(Space::indent)
            .unwrap_or_default();
        if indent.is_empty() {
            return Ok(serde_json::to_string(&value)?);
        }

        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
        value.serialize(&mut serializer)?;
        String::from_utf8(out).map_err(|e| Error::InvalidData(e.to_string()))
    }
}

impl Encoder for JsonWriter {
    fn encode(&self, data: Contents) -> std::result::Result<Contents, BoxError> {
        let value = match data {
            Contents::Value(value) => value,
            Contents::Text(text) => Value::String(text),
            Contents::Bytes(bytes) => json!({ "type": "Buffer", "data": bytes }),
        };
        Ok(Contents::Text(self.stringify(value)?))
    }
}

/// The holder first, then the members of its replacement.
fn replace(replacer: &JsonTransform, key: &str, value: Value) -> Option<Value> {
    let value = replacer(key, value)?;

    Some(match value {
        Value::Object(members) => Value::Object(
            members
                .into_iter()
                .filter_map(|(name, member)| replace(replacer, &name, member).map(|v| (name, v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| replace(replacer, &index.to_string(), item).unwrap_or(Value::Null))
                .collect(),
        ),
        other => other,
    })
}
