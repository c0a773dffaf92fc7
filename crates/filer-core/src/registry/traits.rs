//! Coercion traits and format attribute records.

use std::fmt;
use std::sync::Arc;

use crate::contents::Contents;
use crate::error::BoxError;
use crate::options::{ReadOptions, WriteOptions};

/// Trait for read coercions.
///
/// Implement this trait to turn the raw bytes of a file into a higher-level
/// value. Closures of the form `Fn(&[u8]) -> Result<Contents, BoxError>`
/// implement it automatically.
pub trait Decoder: Send + Sync {
    /// Decode the bytes read from disk.
    fn decode(&self, bytes: &[u8]) -> Result<Contents, BoxError>;
}

/// Trait for write coercions.
///
/// Implement this trait to turn a value into the bytes or text stored on
/// disk. Closures of the form `Fn(Contents) -> Result<Contents, BoxError>`
/// implement it automatically.
pub trait Encoder: Send + Sync {
    /// Encode the data about to be written. The result must be
    /// [`Contents::Bytes`] or [`Contents::Text`] to be writable.
    fn encode(&self, data: Contents) -> Result<Contents, BoxError>;
}

impl<F> Decoder for F
where
    F: Fn(&[u8]) -> Result<Contents, BoxError> + Send + Sync,
{
    fn decode(&self, bytes: &[u8]) -> Result<Contents, BoxError> {
        self(bytes)
    }
}

impl<F> Encoder for F
where
    F: Fn(Contents) -> Result<Contents, BoxError> + Send + Sync,
{
    fn encode(&self, data: Contents) -> Result<Contents, BoxError> {
        self(data)
    }
}

/// Reader half of a format: default read options and an optional decoder.
#[derive(Clone, Default)]
pub struct ReaderSpec {
    /// Defaults merged under the caller's options on every read.
    pub options: ReadOptions,
    /// Applied to the raw bytes unless an encoding is in effect.
    pub decoder: Option<Arc<dyn Decoder>>,
}

impl ReaderSpec {
    /// Create a reader with no defaults and no decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default read options.
    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the decoder applied to raw bytes after reading.
    pub fn with_decoder<D: Decoder + 'static>(mut self, decoder: D) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// True when neither defaults nor a decoder are set.
    pub fn is_empty(&self) -> bool {
        self.options == ReadOptions::default() && self.decoder.is_none()
    }
}

impl fmt::Debug for ReaderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderSpec")
            .field("options", &self.options)
            .field("decoder", &self.decoder.is_some())
            .finish()
    }
}

/// Writer half of a format: default write options and an optional encoder.
#[derive(Clone, Default)]
pub struct WriterSpec {
    /// Defaults merged under the caller's options on every write.
    pub options: WriteOptions,
    /// Applied to the data before it reaches the filesystem.
    pub encoder: Option<Arc<dyn Encoder>>,
}

impl WriterSpec {
    /// Create a writer with no defaults and no encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default write options.
    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the encoder applied to data before writing.
    pub fn with_encoder<E: Encoder + 'static>(mut self, encoder: E) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    /// True when neither defaults nor an encoder are set.
    pub fn is_empty(&self) -> bool {
        self.options == WriteOptions::default() && self.encoder.is_none()
    }
}

impl fmt::Debug for WriterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSpec")
            .field("options", &self.options)
            .field("encoder", &self.encoder.is_some())
            .finish()
    }
}

/// The attributes of a file format.
///
/// Once registered, attributes are shared behind an `Arc` and never change;
/// registering again replaces the whole record.
///
/// ```
/// use filer_core::{Encoding, FormatAttributes, ReadOptions, ReaderSpec, WriterSpec};
///
/// let attributes = FormatAttributes::new()
///     .with_reader(ReaderSpec::new().with_options(ReadOptions::new().encoding(Encoding::Utf8)))
///     .with_writer(WriterSpec::new());
///
/// assert_eq!(attributes.reader.options.encoding, Some(Encoding::Utf8));
/// assert!(attributes.reader.decoder.is_none());
/// assert!(attributes.writer.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormatAttributes {
    /// How files with this extension are read.
    pub reader: ReaderSpec,
    /// How files with this extension are written.
    pub writer: WriterSpec,
}

impl FormatAttributes {
    /// Create empty attributes. Dispatch through them is a plain
    /// passthrough.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reader half.
    pub fn with_reader(mut self, reader: ReaderSpec) -> Self {
        self.reader = reader;
        self
    }

    /// Set the writer half.
    pub fn with_writer(mut self, writer: WriterSpec) -> Self {
        self.writer = writer;
        self
    }

    /// True for the record returned for unregistered extensions.
    pub fn is_empty(&self) -> bool {
        self.reader.is_empty() && self.writer.is_empty()
    }
}
