//! Outlook `.msg` extraction
//!
//! An Outlook message is a Compound File Binary container whose root storage
//! holds one stream per variable-length MAPI property, named
//! `__substg1.0_<id><type>`. Fixed-size properties such as the code page live
//! in the `__properties_version1.0` stream.

use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use cfb::CompoundFile;
use encoding_rs::Encoding;
use regex::bytes::Regex;
use tempfile::NamedTempFile;

use super::MessageExtractor;
use super::types::{EmailBody, ParsedMessage, format_sender};
use crate::error::ParseError;
use crate::text::Scrubber;

const PROP_SUBJECT: u16 = 0x0037;
const PROP_BODY: u16 = 0x1000;
const PROP_HTML: u16 = 0x1013;
const PROP_SENDER_NAME: u16 = 0x0C1A;
const PROP_SENDER_EMAIL: u16 = 0x0C1F;
const PROP_SENDER_SMTP: u16 = 0x5D01;
const PROP_INTERNET_CPID: u16 = 0x3FDE;
const PROP_MESSAGE_CODEPAGE: u16 = 0x3FFD;

const TYPE_LONG: u16 = 0x0003;
const TYPE_UNICODE: u16 = 0x001F;
const TYPE_STRING8: u16 = 0x001E;
const TYPE_BINARY: u16 = 0x0102;

const SUBSTORAGE_PREFIX: &str = "__substg1.0_";
const PROPERTIES_STREAM: &str = "__properties_version1.0";

/// Header of the top-level message's properties stream
const PROPERTIES_HEADER_LEN: usize = 32;
/// `tag: u32, flags: u32, value: [u8; 8]`
const PROPERTY_ENTRY_LEN: usize = 16;

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*charset\s*=\s*["']?\s*([a-z0-9_.:\-]+)"#)
        .expect("meta charset pattern is valid")
});

/// Extractor for Outlook compound-document messages
#[derive(Debug, Clone, Default)]
pub struct CompoundDocumentExtractor {
    scrubber: Scrubber,
    /// Where uploads are staged; the system temp directory when unset
    staging_dir: Option<PathBuf>,
}

impl CompoundDocumentExtractor {
    pub fn new(scrubber: Scrubber) -> Self {
        Self {
            scrubber,
            staging_dir: None,
        }
    }
}

impl MessageExtractor for CompoundDocumentExtractor {
    fn extract(&self, raw: &[u8]) -> Result<ParsedMessage, ParseError> {
        // The temp file is removed when `staged` drops, on success or failure.
        let staged = stage_upload(raw, self.staging_dir.as_deref())?;
        let file = staged.reopen()?;

        let mut outlook = OutlookMessage::open(file)?;
        let sender = outlook.sender()?;
        let subject = outlook.string_property(PROP_SUBJECT)?;
        let body = outlook.body()?.clean(&self.scrubber);

        tracing::debug!(
            path = %staged.path().display(),
            has_sender = sender.is_some(),
            body_len = body.len(),
            "Extracted Outlook message"
        );

        Ok(ParsedMessage::new(sender, subject, body))
    }
}

fn stage_upload(raw: &[u8], dir: Option<&Path>) -> Result<NamedTempFile, ParseError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("mailbrief-").suffix(".msg");

    let mut staged = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    staged.write_all(raw)?;
    staged.flush()?;
    Ok(staged)
}

/// Property reader over an opened compound file
struct OutlookMessage<F> {
    compound: CompoundFile<F>,
    /// Raw `__properties_version1.0` stream, empty when absent
    fixed: Vec<u8>,
}

impl<F: Read + Seek> OutlookMessage<F> {
    fn open(inner: F) -> Result<Self, ParseError> {
        let compound = CompoundFile::open(inner)
            .map_err(|e| ParseError::CompoundDocument(format!("not a compound file: {e}")))?;

        let is_message = compound.read_root_storage().any(|entry| {
            let name = entry.name();
            name.starts_with(SUBSTORAGE_PREFIX) || name == PROPERTIES_STREAM
        });
        if !is_message {
            return Err(ParseError::CompoundDocument(
                "compound file has no message properties".to_string(),
            ));
        }

        let mut message = Self {
            compound,
            fixed: Vec::new(),
        };
        message.fixed = message
            .read_path(&format!("/{PROPERTIES_STREAM}"))?
            .unwrap_or_default();
        Ok(message)
    }

    fn sender(&mut self) -> Result<Option<String>, ParseError> {
        let name = self.string_property(PROP_SENDER_NAME)?;
        let address = match self.string_property(PROP_SENDER_SMTP)? {
            Some(smtp) => Some(smtp),
            None => self.string_property(PROP_SENDER_EMAIL)?,
        };

        Ok(format_sender(name.as_deref(), address.as_deref()))
    }

    /// An empty plain body counts as missing so the HTML body is used instead.
    fn body(&mut self) -> Result<EmailBody, ParseError> {
        let text = self
            .string_property(PROP_BODY)?
            .filter(|text| !text.is_empty());
        let html = match self.read_stream(PROP_HTML, TYPE_BINARY)? {
            Some(bytes) => Some(decode_bytes(&bytes, self.html_encoding(&bytes))),
            None => self.string_property(PROP_HTML)?,
        };

        Ok(EmailBody { text, html })
    }

    /// Read a string property, preferring the UTF-16 stream over the 8-bit one.
    fn string_property(&mut self, id: u16) -> Result<Option<String>, ParseError> {
        if let Some(bytes) = self.read_stream(id, TYPE_UNICODE)? {
            return Ok(Some(decode_utf16le(&bytes)));
        }
        if let Some(bytes) = self.read_stream(id, TYPE_STRING8)? {
            return Ok(Some(decode_bytes(&bytes, self.string8_encoding())));
        }
        Ok(None)
    }

    fn long_property(&self, id: u16) -> Option<u32> {
        let tag = (u32::from(id) << 16) | u32::from(TYPE_LONG);
        self.fixed
            .get(PROPERTIES_HEADER_LEN..)?
            .chunks_exact(PROPERTY_ENTRY_LEN)
            .find(|entry| u32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]) == tag)
            .map(|entry| u32::from_le_bytes([entry[8], entry[9], entry[10], entry[11]]))
    }

    fn string8_encoding(&self) -> Option<&'static Encoding> {
        [PROP_MESSAGE_CODEPAGE, PROP_INTERNET_CPID]
            .into_iter()
            .filter_map(|id| self.long_property(id))
            .find_map(encoding_for_codepage)
    }

    fn html_encoding(&self, html: &[u8]) -> Option<&'static Encoding> {
        self.long_property(PROP_INTERNET_CPID)
            .and_then(encoding_for_codepage)
            .or_else(|| meta_charset(html))
    }

    fn read_stream(&mut self, id: u16, kind: u16) -> Result<Option<Vec<u8>>, ParseError> {
        self.read_path(&format!("/{SUBSTORAGE_PREFIX}{id:04X}{kind:04X}"))
    }

    fn read_path(&mut self, path: &str) -> Result<Option<Vec<u8>>, ParseError> {
        if !self.compound.is_stream(path) {
            return Ok(None);
        }

        let mut buf = Vec::new();
        self.compound
            .open_stream(path)
            .and_then(|mut stream| stream.read_to_end(&mut buf))
            .map_err(|e| stream_error(path, e))?;
        Ok(Some(buf))
    }
}

fn stream_error(path: &str, e: io::Error) -> ParseError {
    ParseError::CompoundDocument(format!("failed to read {path}: {e}"))
}

fn meta_charset(html: &[u8]) -> Option<&'static Encoding> {
    let captures = META_CHARSET.captures(html)?;
    Encoding::for_label(captures.get(1)?.as_bytes())
}

/// Map a Windows code page identifier to its encoding.
fn encoding_for_codepage(codepage: u32) -> Option<&'static Encoding> {
    match codepage {
        65001 => Some(encoding_rs::UTF_8),
        1200 => Some(encoding_rs::UTF_16LE),
        1201 => Some(encoding_rs::UTF_16BE),
        20127 | 28591 => Some(encoding_rs::WINDOWS_1252),
        874 => Some(encoding_rs::WINDOWS_874),
        932 => Some(encoding_rs::SHIFT_JIS),
        936 => Some(encoding_rs::GBK),
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),
        20866 => Some(encoding_rs::KOI8_R),
        21866 => Some(encoding_rs::KOI8_U),
        50220..=50222 => Some(encoding_rs::ISO_2022_JP),
        51932 => Some(encoding_rs::EUC_JP),
        54936 => Some(encoding_rs::GB18030),
        1250..=1258 => Encoding::for_label(format!("windows-{codepage}").as_bytes()),
        28592..=28606 => Encoding::for_label(format!("iso-8859-{}", codepage - 28590).as_bytes()),
        _ => None,
    }
}

/// Decode 8-bit text. Without a known encoding, valid UTF-8 is kept and
/// anything else is read as windows-1252.
fn decode_bytes(bytes: &[u8], encoding: Option<&'static Encoding>) -> String {
    let encoding = encoding.unwrap_or_else(|| match std::str::from_utf8(bytes) {
        Ok(_) => encoding_rs::UTF_8,
        Err(_) => encoding_rs::WINDOWS_1252,
    });
    let (text, _, _) = encoding.decode(bytes);
    text.trim_end_matches('\0').to_string()
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}
