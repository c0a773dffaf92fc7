//! filer-io: format-aware file reading and writing.
//!
//! Reads and writes files while applying the coercions registered for the
//! file's extension: parse JSON on read, stringify on write, or anything
//! else a [`Decoder`]/[`Encoder`] pair can express.
//!
//! # Quick Start
//!
//! ```no_run
//! use filer_io::{json_attributes, Filer, ReadOptions, Registry, WriteOptions};
//! use serde_json::json;
//!
//! # fn main() -> filer_io::Result<()> {
//! let registry = Registry::new();
//! registry.register(".json", json_attributes());
//! let filer = Filer::new(registry);
//!
//! filer.write_file_sync("settings.json", json!({"theme": "dark"}), WriteOptions::new())?;
//! let settings = filer.read_file_sync("settings.json", ReadOptions::new())?;
//! assert_eq!(settings.into_value(), Some(json!({"theme": "dark"})));
//! # Ok(())
//! # }
//! ```
//!
//! # Dispatch
//!
//! ```text
//! read:  path ─> extname ─> snapshot.get ─> merge options ─> host read ─> decode
//! write: path ─> extname ─> snapshot.get ─> merge options ─> encode ─> host write
//! ```
//!
//! Unregistered extensions degrade to plain byte passthrough. Filesystem and
//! coercion errors are always returned to the caller.

mod dispatch;
mod host;
pub mod json;
mod path;

pub use dispatch::Filer;
pub use json::{
    json_attributes, JsonReader, JsonReaderOptions, JsonTransform, JsonWriter, JsonWriterOptions,
    Space,
};
pub use path::extname;

pub use filer_core::{
    BoxError, Contents, Decoder, Encoder, Encoding, Error, Extensions, FileMode, FormatAttributes,
    OpenFlag, ReadOptions, ReaderSpec, Registry, Result, Snapshot, WriteOptions, WriterSpec,
};
