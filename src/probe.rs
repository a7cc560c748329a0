//! Image dimension probing
//!
//! Only the header is inspected; pixel data is never decoded.

use std::io::Cursor;

use thiserror::Error;

/// Width and height of an image in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Errors from dimension probing
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The byte stream could not be read while sniffing the format
    #[error("failed to read image header: {0}")]
    Io(#[from] std::io::Error),

    /// The format is unknown or the header is malformed
    #[error("{0}")]
    Image(#[from] image::ImageError),
}

/// Reads image dimensions from encoded bytes
pub trait ImageProbe: Send + Sync {
    /// Return the pixel dimensions of `bytes`
    fn probe_dimensions(&self, bytes: &[u8]) -> Result<Dimensions, ProbeError>;
}

/// [`ImageProbe`] backed by the `image` crate's format detection
#[derive(Clone, Copy, Debug, Default)]
pub struct CodecProbe;

impl ImageProbe for CodecProbe {
    fn probe_dimensions(&self, bytes: &[u8]) -> Result<Dimensions, ProbeError> {
        let (width, height) = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        Ok(Dimensions { width, height })
    }
}
