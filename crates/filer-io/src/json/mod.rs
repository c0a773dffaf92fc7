//! JSON reader and writer.
//!
//! Ready-made coercions for registering against `.json`. Nothing is
//! registered automatically; an empty registry applies no coercion.

mod reader;
mod writer;

use std::sync::Arc;

use filer_core::{FormatAttributes, ReaderSpec, WriterSpec};
use serde_json::Value;

pub use reader::{JsonReader, JsonReaderOptions};
pub use writer::{JsonWriter, JsonWriterOptions, Space};

/// Per-key transform called with the member name (or array index, or `""`
/// for the root) and its value. Returning `None` drops the member.
pub type JsonTransform = Arc<dyn Fn(&str, Value) -> Option<Value> + Send + Sync>;

/// Attributes pairing a default [`JsonReader`] and [`JsonWriter`].
pub fn json_attributes() -> FormatAttributes {
    FormatAttributes::new()
        .with_reader(ReaderSpec::new().with_decoder(JsonReader::default()))
        .with_writer(WriterSpec::new().with_encoder(JsonWriter::default()))
}
