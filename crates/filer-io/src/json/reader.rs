//! JSON reader implementation.

use filer_core::{BoxError, Contents, Decoder, Result};
use serde_json::Value;

use super::JsonTransform;

/// Options for [`JsonReader`].
#[derive(Clone, Default)]
pub struct JsonReaderOptions {
    /// Applied bottom-up to every parsed member, then to the root under
    /// the key `""`.
    pub reviver: Option<JsonTransform>,
}

impl JsonReaderOptions {
    /// Options with no reviver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reviver. It receives the holder's key and the parsed
    /// value, and returns the replacement or `None` to drop the member.
    pub fn reviver<F>(mut self, reviver: F) -> Self
    where
        F: Fn(&str, Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.reviver = Some(std::sync::Arc::new(reviver));
        self
    }
}

/// Decoder that parses the bytes of a file as JSON text.
#[derive(Clone, Default)]
pub struct JsonReader {
    options: JsonReaderOptions,
}

impl JsonReader {
    /// Create a new JSON reader.
    pub fn new(options: JsonReaderOptions) -> Self {
        Self { options }
    }

    /// Parse JSON text, invalid UTF-8 sequences replaced.
    ///
    /// A reviver that drops the root yields `null`.
    pub fn parse(&self, bytes: &[u8]) -> Result<Value> {
        let text = String::from_utf8_lossy(bytes);
        let value: Value = serde_json::from_str(&text)?;

        Ok(match &self.options.reviver {
            Some(reviver) => revive(reviver, "", value).unwrap_or(Value::Null),
            None => value,
        })
    }
}

impl Decoder for JsonReader {
    fn decode(&self, bytes: &[u8]) -> std::result::Result<Contents, BoxError> {
        Ok(Contents::Value(self.parse(bytes)?))
    }
}

/// Children first, then the holder itself.
fn revive(reviver: &JsonTransform, key: &str, value: Value) -> Option<Value> {
    let value = match value {
        Value::Object(members) => Value::Object(
            members
                .into_iter()
                .filter_map(|(name, member)| revive(reviver, &name, member).map(|v| (name, v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| revive(reviver, &index.to_string(), item).unwrap_or(Value::Null))
                .collect(),
        ),
        other => other,
    };

    reviver(key, value)
}
