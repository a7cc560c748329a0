//! Embedded metadata tag reading
//!
//! Flattens container metadata (PNG text chunks, EXIF fields) into a list of
//! `(directory, name, description)` tags. PNG text chunks are reported with the
//! name `Textual Data` and a `"Key: Value"` description so that downstream
//! matching can treat every container the same way.

use std::io::Cursor;

use thiserror::Error;


/// Tag name used for PNG `tEXt`/`zTXt`/`iTXt` chunks
pub const TEXTUAL_DATA: &str = "Textual Data";

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// EXIF UserComment starts with an 8-byte character code
const USER_COMMENT_PREFIX_LEN: usize = 8;

/// Character code of a UCS-2 UserComment
const UNICODE_PREFIX: &[u8] = b"UNICODE\0";

/// One metadata entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataTag {
    /// Container section the tag came from (e.g. "PNG-tEXt", "Exif IFD0")
    pub directory: String,
    /// Tag name (e.g. "Software", "Textual Data")
    pub name: String,
    /// Tag value rendered as text
    pub description: String,
}

impl MetadataTag {
    fn new(
        directory: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Errors from reading container metadata
#[derive(Debug, Error)]
pub enum MetadataError {
    /// PNG stream could not be parsed
    #[error("PNG decode error: {0}")]
    Png(#[from] png::DecodingError),

    /// No EXIF data could be located or parsed
    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),
}

/// Source of metadata tags for an encoded image
pub trait TagReader: Send + Sync {
    /// Read every tag embedded in `bytes`
    fn read_tags(&self, bytes: &[u8]) -> Result<Vec<MetadataTag>, MetadataError>;
}

/// Default [`TagReader`] for PNG text chunks and EXIF fields
#[derive(Clone, Copy, Debug, Default)]
pub struct ContainerTagReader;

impl TagReader for ContainerTagReader {
    fn read_tags(&self, bytes: &[u8]) -> Result<Vec<MetadataTag>, MetadataError> {
        if bytes.starts_with(PNG_SIGNATURE) {
            let mut tags = read_png_text(bytes)?;
            // eXIf chunks are optional in PNG
            if let Ok(exif_tags) = read_exif(bytes) {
                tags.extend(exif_tags);
            }
            Ok(tags)
        } else {
            read_exif(bytes)
        }
    }
}

fn read_png_text(bytes: &[u8]) -> Result<Vec<MetadataTag>, MetadataError> {
    let decoder = png::Decoder::new(Cursor::new(bytes));
    let reader = decoder.read_info()?;
    let info = reader.info();

    let mut tags = Vec::new();
    for chunk in &info.uncompressed_latin1_text {
        tags.push(MetadataTag::new(
            "PNG-tEXt",
            TEXTUAL_DATA,
            format!("{}: {}", chunk.keyword, chunk.text),
        ));
    }
    for chunk in &info.compressed_latin1_text {
        match chunk.get_text() {
            Ok(text) => tags.push(MetadataTag::new(
                "PNG-zTXt",
                TEXTUAL_DATA,
                format!("{}: {}", chunk.keyword, text),
            )),
            Err(e) => tracing::debug!(keyword = %chunk.keyword, error = %e, "skipping unreadable zTXt chunk"),
        }
    }
    for chunk in &info.utf8_text {
        match chunk.get_text() {
            Ok(text) => tags.push(MetadataTag::new(
                "PNG-iTXt",
                TEXTUAL_DATA,
                format!("{}: {}", chunk.keyword, text),
            )),
            Err(e) => tracing::debug!(keyword = %chunk.keyword, error = %e, "skipping unreadable iTXt chunk"),
        }
    }
    Ok(tags)
}

fn read_exif(bytes: &[u8]) -> Result<Vec<MetadataTag>, MetadataError> {
    let exif = exif::Reader::new().read_from_container(&mut Cursor::new(bytes))?;

    let mut tags = Vec::new();
    for field in exif.fields() {
        let directory = match field.ifd_num {
            exif::In::PRIMARY => "Exif IFD0",
            _ => "Exif Thumbnail",
        };
        match field.tag {
            exif::Tag::Software => {
                if let Some(text) = ascii_value(&field.value) {
                    tags.push(MetadataTag::new(directory, "Software", text));
                }
            }
            exif::Tag::ImageDescription => {
                if let Some(text) = ascii_value(&field.value) {
                    tags.push(MetadataTag::new(directory, "Comment", text));
                }
            }
            exif::Tag::UserComment => {
                if let exif::Value::Undefined(raw, _) = &field.value {
                    if let Some(text) = user_comment_text(raw, exif.little_endian()) {
                        tags.push(MetadataTag::new(directory, "Comment", text));
                    }
                }
            }
            _ => {}
        }
    }
    Ok(tags)
}

fn ascii_value(value: &exif::Value) -> Option<String> {
    match value {
        exif::Value::Ascii(parts) => {
            let text = parts
                .iter()
                .map(|p| String::from_utf8_lossy(p).into_owned())
                .collect::<Vec<_>>()
                .join(" ");
            let text = text.trim().to_string();
            (!text.is_empty()).then_some(text)
        }
        _ => None,
    }
}

/// Decode a UserComment by its character code
///
/// `UNICODE` bodies are UTF-16 in the EXIF byte order. ASCII, undefined and
/// other codes are read as UTF-8.
pub(crate) fn user_comment_text(raw: &[u8], little_endian: bool) -> Option<String> {
    if raw.len() < USER_COMMENT_PREFIX_LEN {
        return None;
    }
    let (code, body) = raw.split_at(USER_COMMENT_PREFIX_LEN);

    let text = if code == UNICODE_PREFIX {
        let units = body.chunks_exact(2).map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        });
        char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect::<String>()
    } else {
        String::from_utf8_lossy(body).into_owned()
    };

    let text = text.trim_end_matches('\0').trim();
    (!text.is_empty()).then(|| text.to_string())
}
