//! Decompression support.

use crate::error::ParseErrorKind;

use flate2::read::MultiGzDecoder;
use std::io::{Cursor, Read};
use std::path::Path;
use strum_macros::Display;
use zune_inflate::{DeflateDecoder, DeflateOptions};

/// Compression format of a snapshot file
#[derive(Clone, Copy, Debug, Display, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum Compression {
    /// Gzip
    Gzip,
    /// Zlib
    Zlib,
}

impl Compression {
    /// Determine the compression format from a file extension.
    ///
    /// # Arguments
    ///
    /// * `path`: Path of the snapshot file
    pub fn from_path(path: &Path) -> Result<Self, ParseErrorKind> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "gz" => Ok(Self::Gzip),
            "zz" | "zlib" => Ok(Self::Zlib),
            _ => Err(ParseErrorKind::UnsupportedCompression { extension }),
        }
    }
}

/// Wraps a reader of compressed data in a reader of uncompressed data.
///
/// Gzip is decoded as a stream, so decompression errors surface while reading. Zlib data is
/// inflated up front.
///
/// # Arguments
///
/// * `compression`: Compression algorithm
/// * `reader`: Reader of compressed data
pub fn decoder<'a, R: Read + 'a>(
    compression: Compression,
    reader: R,
) -> Result<Box<dyn Read + 'a>, ParseErrorKind> {
    match compression {
        // Hourly dumps may be concatenated gzip members.
        Compression::Gzip => Ok(Box::new(MultiGzDecoder::new(reader))),
        Compression::Zlib => decompress_zune_zlib(reader).map(|data| {
            let reader: Box<dyn Read + 'a> = Box::new(Cursor::new(data));
            reader
        }),
    }
}

fn decompress_zune_zlib<R: Read>(mut reader: R) -> Result<Vec<u8>, ParseErrorKind> {
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .map_err(ParseErrorKind::DecompressionFlate2)?;
    let options = DeflateOptions::default().set_size_hint(data.len());
    let mut decoder = DeflateDecoder::new_with_options(&data, options);
    decoder
        .decode_zlib()
        .map_err(ParseErrorKind::DecompressionZune)
}
