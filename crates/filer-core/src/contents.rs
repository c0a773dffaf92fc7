//! Values flowing through read and write dispatch.

use serde_json::Value;

/// File contents as seen by callers and coercions.
///
/// Reads without an encoding or decoder produce [`Contents::Bytes`]; reads
/// with an encoding produce [`Contents::Text`]; decoders usually produce
/// [`Contents::Value`]. Writes accept any variant, but a `Value` must be
/// turned into bytes or text by a registered encoder before it can reach disk.
#[derive(Debug, Clone, PartialEq)]
pub enum Contents {
    /// Raw byte buffer.
    Bytes(Vec<u8>),
    /// Decoded string.
    Text(String),
    /// Structured value.
    Value(Value),
}

impl Contents {
    /// Borrow the raw bytes, if this is a byte buffer.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Borrow the text, if this is a decoded string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Borrow the structured value, if present.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Take the structured value, if present.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Short variant name, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
            Self::Text(_) => "text",
            Self::Value(_) => "value",
        }
    }
}

impl From<Vec<u8>> for Contents {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Contents {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<String> for Contents {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Contents {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for Contents {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}
