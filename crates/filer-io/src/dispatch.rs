//! Read and write dispatch by file extension.

use std::path::Path;

use filer_core::{
    Contents, Error, ReadOptions, ReaderSpec, Registry, Result, WriteOptions, WriterSpec,
};
use tracing::debug;

use crate::host;
use crate::path::extname;

/// Reads and writes files through the formats registered in a [`Registry`].
///
/// Each call takes one registry snapshot up front, so a registration that
/// lands while a read is in flight never affects that read.
#[derive(Debug, Clone, Default)]
pub struct Filer {
    registry: Registry,
}

impl Filer {
    /// Create a dispatcher over `registry`. The registry is shared, not
    /// copied; later registrations are seen by later calls.
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Read a file, blocking the calling thread.
    pub fn read_file_sync(&self, path: impl AsRef<Path>, options: ReadOptions) -> Result<Contents> {
        let path = path.as_ref();
        let extension = extname(path);
        let format = self.registry.get(extension);
        let options = options.merged_over(&format.reader.options);

        let bytes = host::read_sync(path, options.effective_flag())?;
        decode(path, extension, &format.reader, &options, bytes)
    }

    /// Read a file.
    pub async fn read_file(&self, path: impl AsRef<Path>, options: ReadOptions) -> Result<Contents> {
        let path = path.as_ref();
        let extension = extname(path);
        let format = self.registry.get(extension);
        let options = options.merged_over(&format.reader.options);

        let bytes = host::read(path, options.effective_flag()).await?;
        decode(path, extension, &format.reader, &options, bytes)
    }

    /// Write a file, blocking the calling thread. Replaces the contents
    /// unless the flag says otherwise.
    pub fn write_file_sync(
        &self,
        path: impl AsRef<Path>,
        data: impl Into<Contents>,
        options: WriteOptions,
    ) -> Result<()> {
        let path = path.as_ref();
        let extension = extname(path);
        let format = self.registry.get(extension);
        let options = options.merged_over(&format.writer.options);

        let bytes = encode(path, extension, &format.writer, &options, data.into())?;
        host::write_sync(path, &bytes, &options)
    }

    /// Write a file. Replaces the contents unless the flag says otherwise.
    pub async fn write_file(
        &self,
        path: impl AsRef<Path>,
        data: impl Into<Contents>,
        options: WriteOptions,
    ) -> Result<()> {
        let path = path.as_ref();
        let extension = extname(path);
        let format = self.registry.get(extension);
        let options = options.merged_over(&format.writer.options);

        let bytes = encode(path, extension, &format.writer, &options, data.into())?;
        host::write(path, &bytes, &options).await
    }
}

/// Text when an encoding is set, otherwise the decoder's output or the raw
/// bytes.
fn decode(
    path: &Path,
    extension: &str,
    reader: &ReaderSpec,
    options: &ReadOptions,
    bytes: Vec<u8>,
) -> Result<Contents> {
    if let Some(encoding) = options.encoding {
        debug!(
            path = %path.display(),
            %extension,
            %encoding,
            decoded = false,
            "Read file as text"
        );
        return Ok(Contents::Text(encoding.decode(&bytes)));
    }

    match &reader.decoder {
        Some(decoder) => {
            debug!(
                path = %path.display(),
                %extension,
                len = bytes.len(),
                decoded = true,
                "Read file with decoder"
            );
            decoder.decode(&bytes).map_err(|e| Error::decode(path, e))
        }
        None => {
            debug!(
                path = %path.display(),
                %extension,
                len = bytes.len(),
                decoded = false,
                "Read file as bytes"
            );
            Ok(Contents::Bytes(bytes))
        }
    }
}

/// Apply the encoder, then turn the result into bytes for the host.
fn encode(
    path: &Path,
    extension: &str,
    writer: &WriterSpec,
    options: &WriteOptions,
    data: Contents,
) -> Result<Vec<u8>> {
    let data = match &writer.encoder {
        Some(encoder) => encoder.encode(data).map_err(|e| Error::encode(path, e))?,
        None => data,
    };
    debug!(
        path = %path.display(),
        %extension,
        kind = data.kind(),
        encoded = writer.encoder.is_some(),
        "Write file"
    );

    match data {
        Contents::Bytes(bytes) => Ok(bytes),
        Contents::Text(text) => options.encoding.unwrap_or_default().encode(&text),
        Contents::Value(_) => Err(Error::Unwritable {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::{json_attributes, JsonReader, JsonReaderOptions, JsonWriter, JsonWriterOptions};
    use filer_core::{BoxError, Encoding, FileMode, FormatAttributes, OpenFlag};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::{json, Value};
    use std::io::ErrorKind;
    use tempfile::tempdir;

    fn json_filer() -> Filer {
        let registry = Registry::new();
        registry.register(".json", json_attributes());
        Filer::new(registry)
    }

    #[test]
    fn test_unregistered_extension_is_passthrough() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let filer = Filer::default();

        filer.write_file_sync(&path, &b"{\"a\":1}"[..], WriteOptions::new()).unwrap();
        let actual = filer.read_file_sync(&path, ReadOptions::new()).unwrap();

        assert_eq!(actual, Contents::Bytes(b"{\"a\":1}".to_vec()));
    }

    #[test]
    fn test_read_json_sync() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"{"a":1}"#).unwrap();

        let actual = json_filer().read_file_sync(&path, ReadOptions::new()).unwrap();

        assert_eq!(actual, Contents::Value(json!({"a": 1})));
    }

    #[test]
    fn test_write_json_sync() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        json_filer()
            .write_file_sync(&path, json!({"a": 1}), WriteOptions::new())
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_other_extensions_unaffected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, r#"{"a":1}"#).unwrap();

        let actual = json_filer().read_file_sync(&path, ReadOptions::new()).unwrap();

        assert_eq!(actual, Contents::Bytes(br#"{"a":1}"#.to_vec()));
    }

    #[test]
    fn test_encoding_skips_decoder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"{"a":1}"#).unwrap();

        let actual = json_filer()
            .read_file_sync(&path, ReadOptions::new().encoding(Encoding::Utf8))
            .unwrap();

        assert_eq!(actual, Contents::from(r#"{"a":1}"#));
    }

    #[test]
    fn test_registered_defaults_apply() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blob.hex");
        let registry = Registry::new();
        registry.register(
            ".hex",
            FormatAttributes::new()
                .with_reader(ReaderSpec::new().with_options(ReadOptions::new().encoding(Encoding::Hex)))
                .with_writer(WriterSpec::new().with_options(WriteOptions::new().encoding(Encoding::Hex))),
        );
        let filer = Filer::new(registry);

        filer.write_file_sync(&path, "cafe", WriteOptions::new()).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![0xCA, 0xFE]);
        assert_eq!(
            filer.read_file_sync(&path, ReadOptions::new()).unwrap(),
            Contents::from("cafe")
        );
    }

    #[test]
    fn test_caller_options_override_defaults_per_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.log");
        let registry = Registry::new();
        registry.register(
            ".log",
            FormatAttributes::new().with_writer(
                WriterSpec::new().with_options(
                    WriteOptions::new()
                        .encoding(Encoding::Base64)
                        .flag(OpenFlag::Append),
                ),
            ),
        );
        let filer = Filer::new(registry);

        filer.write_file_sync(&path, "aGkK", WriteOptions::new()).unwrap();
        filer
            .write_file_sync(&path, "bye\n", WriteOptions::new().encoding(Encoding::Utf8))
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hi\nbye\n");
    }

    #[test]
    fn test_structured_value_without_encoder_is_unwritable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.bin");

        let err = Filer::default()
            .write_file_sync(&path, json!([1]), WriteOptions::new())
            .unwrap_err();

        assert!(matches!(err, Error::Unwritable { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_propagates() {
        let dir = tempdir().unwrap();

        let err = json_filer()
            .read_file_sync(dir.path().join("missing.json"), ReadOptions::new())
            .unwrap_err();

        assert_eq!(err.io_kind(), Some(ErrorKind::NotFound));
    }

    #[test]
    fn test_decode_failure_propagates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"a\":").unwrap();

        let err = json_filer().read_file_sync(&path, ReadOptions::new()).unwrap_err();

        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_encode_failure_propagates_and_skips_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.strict");
        let registry = Registry::new();
        registry.register(
            ".strict",
            FormatAttributes::new().with_writer(WriterSpec::new().with_encoder(
                |_: Contents| -> std::result::Result<Contents, BoxError> { Err("rejected".into()) },
            )),
        );

        let err = Filer::new(registry)
            .write_file_sync(&path, "x", WriteOptions::new())
            .unwrap_err();

        assert!(matches!(err, Error::Encode { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_reviver_and_pretty_writer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let registry = Registry::new();
        registry.register(
            ".json",
            FormatAttributes::new()
                .with_reader(ReaderSpec::new().with_decoder(JsonReader::new(
                    JsonReaderOptions::new().reviver(|key, value| (key != "debug").then_some(value)),
                )))
                .with_writer(WriterSpec::new().with_encoder(JsonWriter::new(JsonWriterOptions::new().space(2)))),
        );
        let filer = Filer::new(registry);

        filer
            .write_file_sync(&path, json!({"port": 80, "debug": true}), WriteOptions::new())
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\n  \"port\": 80,\n  \"debug\": true\n}"
        );
        assert_eq!(
            filer.read_file_sync(&path, ReadOptions::new()).unwrap(),
            Contents::Value(json!({"port": 80}))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_registered_mode_applies() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("id.key");
        let registry = Registry::new();
        registry.register(
            ".key",
            FormatAttributes::new()
                .with_writer(WriterSpec::new().with_options(WriteOptions::new().mode(FileMode(0o600)))),
        );

        Filer::new(registry)
            .write_file_sync(&path, "secret", WriteOptions::new())
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_async_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let filer = json_filer();
        let value = json!({"name": "filer", "tags": ["a", "b"], "size": 3});

        filer.write_file(&path, value.clone(), WriteOptions::new()).await.unwrap();
        let actual = filer.read_file(&path, ReadOptions::new()).await.unwrap();

        assert_eq!(actual, Contents::Value(value));
    }

    #[tokio::test]
    async fn test_async_errors_propagate() {
        let dir = tempdir().unwrap();
        let filer = json_filer();

        let missing = filer
            .read_file(dir.path().join("missing.json"), ReadOptions::new())
            .await
            .unwrap_err();
        assert_eq!(missing.io_kind(), Some(ErrorKind::NotFound));

        let path = dir.path().join("existing.json");
        filer.write_file(&path, json!(1), WriteOptions::new()).await.unwrap();
        let exclusive = filer
            .write_file(&path, json!(2), WriteOptions::new().flag(OpenFlag::WriteExclusive))
            .await
            .unwrap_err();
        assert_eq!(exclusive.io_kind(), Some(ErrorKind::AlreadyExists));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reads_see_whole_registrations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"{"a":1}"#).unwrap();
        let filer = Filer::default();

        let reads: Vec<_> = (0..32)
            .map(|_| {
                let filer = filer.clone();
                let path = path.clone();
                tokio::spawn(async move { filer.read_file(&path, ReadOptions::new()).await })
            })
            .collect();

        for _ in 0..16 {
            filer.registry().register(".json", json_attributes());
            filer.registry().unregister(".json");
        }

        for read in reads {
            match read.await.unwrap().unwrap() {
                Contents::Bytes(bytes) => assert_eq!(bytes, br#"{"a":1}"#),
                Contents::Value(value) => assert_eq!(value, json!({"a": 1})),
                other => panic!("unexpected contents: {:?}", other),
            }
        }
    }

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_owned)
                .collect()
        }
    }

    #[test]
    fn test_dispatch_events_carry_extension() {
        let dir = tempdir().unwrap();
        let json = dir.path().join("data.json");
        let text = dir.path().join("notes.txt");
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let filer = json_filer();
            filer.write_file_sync(&json, json!({"a": 1}), WriteOptions::new()).unwrap();
            filer.read_file_sync(&json, ReadOptions::new()).unwrap();
            filer.write_file_sync(&text, "hi", WriteOptions::new()).unwrap();
            filer.read_file_sync(&text, ReadOptions::new()).unwrap();
        });

        let lines = logs.lines();
        let event = |message: &str, extension: &str| {
            lines
                .iter()
                .find(|line| line.contains(message) && line.contains(&format!("extension={extension}")))
                .cloned()
                .unwrap_or_else(|| panic!("no {message:?} event for {extension:?} in {lines:#?}"))
        };

        assert!(event("Write file", ".json").contains("encoded=true"));
        assert!(event("Read file with decoder", ".json").contains("decoded=true"));
        assert!(event("Write file", ".txt").contains("encoded=false"));
        assert!(event("Read file as bytes", ".txt").contains("decoded=false"));
    }

    /// Any JSON document without non-finite numbers, nested a few levels.
    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            any::<f64>()
                .prop_filter("finite", |f| f.is_finite())
                .prop_map(Value::from),
            ".*".prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::vec(("[a-z]{1,6}", inner), 0..6)
                    .prop_map(|entries| Value::Object(entries.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_json_round_trip(value in json_value()) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("value.json");
            let filer = json_filer();

            filer.write_file_sync(&path, value.clone(), WriteOptions::new()).unwrap();
            let actual = filer.read_file_sync(&path, ReadOptions::new()).unwrap();

            prop_assert_eq!(actual, Contents::Value(value));
        }
    }
}
