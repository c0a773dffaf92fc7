//! filer-core: extension-keyed format registry for filer.
//!
//! A [`Registry`] maps file extensions such as `.json` to
//! [`FormatAttributes`]: default read/write options plus an optional
//! [`Decoder`] applied after reading and an optional [`Encoder`] applied
//! before writing. Dispatch lives in `filer-io`; this crate holds the data
//! model shared by both sides.
//!
//! # Quick Start
//!
//! ```
//! use filer_core::{BoxError, Contents, FormatAttributes, ReaderSpec, Registry};
//!
//! let registry = Registry::new();
//! registry.register(
//!     [".txt", ".md"],
//!     FormatAttributes::new().with_reader(ReaderSpec::new().with_decoder(
//!         |bytes: &[u8]| -> Result<Contents, BoxError> {
//!             Ok(Contents::Text(String::from_utf8(bytes.to_vec())?))
//!         },
//!     )),
//! );
//!
//! assert!(registry.has(".md"));
//! assert!(registry.get(".csv").is_empty());
//! ```
//!
//! # Snapshots
//!
//! Every mutation publishes a new immutable [`Snapshot`]. A snapshot taken
//! before a registration keeps answering lookups exactly as it did when it
//! was taken.

pub mod contents;
pub mod error;
pub mod options;
pub mod registry;

pub use contents::Contents;
pub use error::{BoxError, Error, Result};
pub use options::{Encoding, FileMode, OpenFlag, ReadOptions, WriteOptions};
pub use registry::{
    Decoder, Encoder, Extensions, FormatAttributes, ReaderSpec, Registry, Snapshot, WriterSpec,
};
