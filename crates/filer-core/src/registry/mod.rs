//! Format registry and traits.

mod registry;
mod traits;

pub use registry::{Extensions, Registry, Snapshot};
pub use traits::{Decoder, Encoder, FormatAttributes, ReaderSpec, WriterSpec};
