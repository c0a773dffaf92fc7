//! Host filesystem primitives.
//!
//! Blocking calls go through `std::fs`, non-blocking calls through
//! `tokio::fs`. Every failure is wrapped with the path it happened on.

use std::io::{Read, Write};
use std::path::Path;

use filer_core::{Error, OpenFlag, Result, WriteOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub(crate) fn read_sync(path: &Path, flag: OpenFlag) -> Result<Vec<u8>> {
    let mut file = flag
        .open_options()
        .open(path)
        .map_err(|e| Error::io(path, e))?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| Error::io(path, e))?;
    Ok(bytes)
}

pub(crate) async fn read(path: &Path, flag: OpenFlag) -> Result<Vec<u8>> {
    let mut file = tokio::fs::OpenOptions::from(flag.open_options())
        .open(path)
        .await
        .map_err(|e| Error::io(path, e))?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .await
        .map_err(|e| Error::io(path, e))?;
    Ok(bytes)
}

pub(crate) fn write_sync(path: &Path, bytes: &[u8], options: &WriteOptions) -> Result<()> {
    let mut file = options.open_options().open(path).map_err(|e| Error::io(path, e))?;
    file.write_all(bytes).map_err(|e| Error::io(path, e))
}

pub(crate) async fn write(path: &Path, bytes: &[u8], options: &WriteOptions) -> Result<()> {
    let mut file = tokio::fs::OpenOptions::from(options.open_options())
        .open(path)
        .await
        .map_err(|e| Error::io(path, e))?;

    file.write_all(bytes).await.map_err(|e| Error::io(path, e))?;
    file.flush().await.map_err(|e| Error::io(path, e))
}
