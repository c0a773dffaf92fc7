//! Read and write options passed through to the host filesystem.
//!
//! Option names and values follow the host conventions (`utf8`, `r+`,
//! `0o644`, ...) so defaults can be loaded from configuration files.

use std::fmt;
use std::fs::OpenOptions;
use std::str::FromStr;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Base64 decoding as lenient as the host: padding optional, trailing bits
/// ignored.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Character encoding used to turn bytes into text on read, and text into
/// bytes on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Encoding {
    #[default]
    Utf8,
    /// 7-bit ASCII. Decoding clears the high bit of every byte.
    Ascii,
    /// ISO-8859-1, one byte per character. Also known as `binary`.
    Latin1,
    Base64,
    /// Lowercase hexadecimal, two characters per byte.
    Hex,
    Utf16Le,
}

impl Encoding {
    /// Host name of this encoding.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf8",
            Self::Ascii => "ascii",
            Self::Latin1 => "latin1",
            Self::Base64 => "base64",
            Self::Hex => "hex",
            Self::Utf16Le => "utf16le",
        }
    }

    /// Render bytes read from disk as text. Never fails; invalid sequences
    /// are replaced.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Ascii => bytes.iter().map(|&b| char::from(b & 0x7f)).collect(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Base64 => STANDARD.encode(bytes),
            Self::Hex => bytes.iter().map(|b| format!("{:02x}", b)).collect(),
            Self::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
        }
    }

    /// Convert text into the bytes to store on disk.
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Ascii => narrow(text, 0x7f, "ascii"),
            Self::Latin1 => narrow(text, 0xff, "latin1"),
            Self::Base64 => from_base64(text),
            Self::Hex => from_hex(text),
            Self::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
        }
    }
}

/// One byte per character, rejecting characters above `max`.
fn narrow(text: &str, max: u32, name: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|c| {
            u8::try_from(u32::from(c))
                .ok()
                .filter(|&b| u32::from(b) <= max)
                .ok_or_else(|| Error::InvalidData(format!("{:?} is not representable in {}", c, name)))
        })
        .collect()
}

/// Accepts both the standard and the URL-safe alphabet.
fn from_base64(text: &str) -> Result<Vec<u8>> {
    let standard: String = text
        .trim_end()
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    LENIENT_BASE64
        .decode(standard)
        .map_err(|e| Error::InvalidData(format!("base64: {}", e)))
}

fn from_hex(text: &str) -> Result<Vec<u8>> {
    let text = text.trim_end();
    if text.len() % 2 != 0 {
        return Err(Error::InvalidData("hex: odd number of digits".into()));
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            text.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| Error::InvalidData(format!("hex: invalid digits at offset {}", i)))
        })
        .collect()
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "ascii" => Ok(Self::Ascii),
            "latin1" | "binary" => Ok(Self::Latin1),
            "base64" => Ok(Self::Base64),
            "hex" => Ok(Self::Hex),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Ok(Self::Utf16Le),
            _ => Err(Error::InvalidEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Encoding {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Encoding> for String {
    fn from(encoding: Encoding) -> Self {
        encoding.as_str().to_string()
    }
}

/// How the file is opened, using the host flag names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OpenFlag {
    /// `r`: read; fails if the file does not exist.
    Read,
    /// `r+`: read and write; fails if the file does not exist.
    ReadWrite,
    /// `rs+`: like `r+`. Synchronous mode is left to the host.
    ReadWriteSync,
    /// `w`: write, creating or truncating.
    Write,
    /// `wx`: write, failing if the file exists.
    WriteExclusive,
    /// `w+`: read and write, creating or truncating.
    WriteRead,
    /// `wx+`: read and write, failing if the file exists.
    WriteReadExclusive,
    /// `a`: append, creating if missing.
    Append,
    /// `ax`: append, failing if the file exists.
    AppendExclusive,
    /// `a+`: read and append, creating if missing.
    AppendRead,
    /// `ax+`: read and append, failing if the file exists.
    AppendReadExclusive,
}

impl OpenFlag {
    /// Host name of this flag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "r",
            Self::ReadWrite => "r+",
            Self::ReadWriteSync => "rs+",
            Self::Write => "w",
            Self::WriteExclusive => "wx",
            Self::WriteRead => "w+",
            Self::WriteReadExclusive => "wx+",
            Self::Append => "a",
            Self::AppendExclusive => "ax",
            Self::AppendRead => "a+",
            Self::AppendReadExclusive => "ax+",
        }
    }

    /// Build the host open options for this flag.
    pub fn open_options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            Self::Read => options.read(true),
            Self::ReadWrite | Self::ReadWriteSync => options.read(true).write(true),
            Self::Write => options.write(true).create(true).truncate(true),
            Self::WriteExclusive => options.write(true).create_new(true),
            Self::WriteRead => options.read(true).write(true).create(true).truncate(true),
            Self::WriteReadExclusive => options.read(true).write(true).create_new(true),
            Self::Append => options.append(true).create(true),
            Self::AppendExclusive => options.append(true).create_new(true),
            Self::AppendRead => options.read(true).append(true).create(true),
            Self::AppendReadExclusive => options.read(true).append(true).create_new(true),
        };
        options
    }
}

impl FromStr for OpenFlag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "r" => Ok(Self::Read),
            "r+" => Ok(Self::ReadWrite),
            "rs+" => Ok(Self::ReadWriteSync),
            "w" => Ok(Self::Write),
            "wx" | "xw" => Ok(Self::WriteExclusive),
            "w+" => Ok(Self::WriteRead),
            "wx+" | "xw+" => Ok(Self::WriteReadExclusive),
            "a" => Ok(Self::Append),
            "ax" | "xa" => Ok(Self::AppendExclusive),
            "a+" => Ok(Self::AppendRead),
            "ax+" | "xa+" => Ok(Self::AppendReadExclusive),
            _ => Err(Error::InvalidFlag(s.to_string())),
        }
    }
}

impl fmt::Display for OpenFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for OpenFlag {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<OpenFlag> for String {
    fn from(flag: OpenFlag) -> Self {
        flag.as_str().to_string()
    }
}

/// Highest permission value, including setuid, setgid and sticky bits.
const MAX_MODE: u32 = 0o7777;

/// Permission bits applied when a write creates the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ModeRepr", into = "u32")]
pub struct FileMode(pub u32);

impl FileMode {
    /// Host default for newly created files (before umask).
    pub const DEFAULT: FileMode = FileMode(0o666);

    /// Apply the permission bits to host open options.
    pub fn apply(self, options: &mut OpenOptions) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.0);
        }
        #[cfg(not(unix))]
        let _ = options;
    }
}

impl Default for FileMode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for FileMode {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl From<FileMode> for u32 {
    fn from(mode: FileMode) -> Self {
        mode.0
    }
}

/// Parses octal strings: `644`, `0644` and `0o644`.
impl FromStr for FileMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0o").unwrap_or(s);
        u32::from_str_radix(digits, 8)
            .ok()
            .filter(|bits| *bits <= MAX_MODE)
            .map(Self)
            .ok_or_else(|| Error::InvalidMode(s.to_string()))
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0o{:o}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModeRepr {
    Number(u32),
    Text(String),
}

impl TryFrom<ModeRepr> for FileMode {
    type Error = Error;

    fn try_from(repr: ModeRepr) -> Result<Self> {
        match repr {
            ModeRepr::Number(bits) if bits <= MAX_MODE => Ok(Self(bits)),
            ModeRepr::Number(bits) => Err(Error::InvalidMode(format!("{:o}", bits))),
            ModeRepr::Text(text) => text.parse(),
        }
    }
}

/// Options for reading files.
///
/// Unset fields inherit the registered format's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Setters)]
#[setters(strip_option)]
pub struct ReadOptions {
    /// Decode the bytes as text. Absent means raw bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Encoding>,
    /// Open flag. Defaults to `r`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<OpenFlag>,
}

impl ReadOptions {
    /// Create empty read options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill unset fields from `defaults`; fields set on `self` win.
    pub fn merged_over(&self, defaults: &ReadOptions) -> ReadOptions {
        ReadOptions {
            encoding: self.encoding.or(defaults.encoding),
            flag: self.flag.or(defaults.flag),
        }
    }

    /// The open flag to use, `r` when unset.
    pub fn effective_flag(&self) -> OpenFlag {
        self.flag.unwrap_or(OpenFlag::Read)
    }
}

/// Options for writing files.
///
/// Unset fields inherit the registered format's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Setters)]
#[setters(strip_option)]
pub struct WriteOptions {
    /// Encoding for text data. Defaults to UTF-8.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Encoding>,
    /// Permission bits for newly created files. Defaults to `0o666`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<FileMode>,
    /// Open flag. Defaults to `w`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<OpenFlag>,
}

impl WriteOptions {
    /// Create empty write options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill unset fields from `defaults`; fields set on `self` win.
    pub fn merged_over(&self, defaults: &WriteOptions) -> WriteOptions {
        WriteOptions {
            encoding: self.encoding.or(defaults.encoding),
            mode: self.mode.or(defaults.mode),
            flag: self.flag.or(defaults.flag),
        }
    }

    /// The open flag to use, `w` when unset.
    pub fn effective_flag(&self) -> OpenFlag {
        self.flag.unwrap_or(OpenFlag::Write)
    }

    /// Host open options combining the flag and the file mode.
    pub fn open_options(&self) -> OpenOptions {
        let mut options = self.effective_flag().open_options();
        self.mode.unwrap_or_default().apply(&mut options);
        options
    }
}
