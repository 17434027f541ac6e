// src/compression/mod.rs
//! Decompression for repodata streams
//!
//! Repositories publish their metadata under several codecs: gzip is the
//! classic default, primary_db is often bzip2, and newer createrepo_c
//! output uses xz or zstd. The codec is picked from the href extension
//! first and from the stream's leading bytes when the extension says
//! nothing.

use std::io::{self, Read};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Failed to set up {codec} decoder: {source}")]
    DecoderCreation {
        codec: &'static str,
        source: io::Error,
    },

    #[error("Corrupt {codec} stream: {source}")]
    Decompression {
        codec: &'static str,
        source: io::Error,
    },
}

/// Codec a repodata stream is stored with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Stored as-is
    Plain,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

/// Href suffixes, checked in order
const SUFFIXES: &[(&str, Codec)] = &[
    (".gz", Codec::Gzip),
    (".tgz", Codec::Gzip),
    (".bz2", Codec::Bzip2),
    (".bzip2", Codec::Bzip2),
    (".xz", Codec::Xz),
    (".zst", Codec::Zstd),
    (".zstd", Codec::Zstd),
];

/// Leading bytes of each compressed format
const SIGNATURES: &[(&[u8], Codec)] = &[
    (&[0x1f, 0x8b], Codec::Gzip),
    (b"BZh", Codec::Bzip2),
    (&[0xfd, b'7', b'z', b'X', b'Z', 0x00], Codec::Xz),
    (&[0x28, 0xb5, 0x2f, 0xfd], Codec::Zstd),
];

impl Codec {
    /// Codec named by an href's suffix; [`Codec::Plain`] when none matches
    ///
    /// ```
    /// use repomd::compression::Codec;
    ///
    /// assert_eq!(Codec::from_href("repodata/abc-primary.xml.gz"), Codec::Gzip);
    /// assert_eq!(Codec::from_href("repodata/abc-primary.sqlite.bz2"), Codec::Bzip2);
    /// assert_eq!(Codec::from_href("repodata/repomd.xml"), Codec::Plain);
    /// ```
    pub fn from_href(href: &str) -> Self {
        SUFFIXES
            .iter()
            .find(|(suffix, _)| href.ends_with(suffix))
            .map_or(Self::Plain, |(_, codec)| *codec)
    }

    /// Codec recognised from leading bytes; [`Codec::Plain`] when none matches
    pub fn sniff(data: &[u8]) -> Self {
        SIGNATURES
            .iter()
            .find(|(magic, _)| data.starts_with(magic))
            .map_or(Self::Plain, |(_, codec)| *codec)
    }

    /// Codec for a fetched stream: the href decides, the bytes break a tie
    pub fn detect(href: &str, data: &[u8]) -> Self {
        match Self::from_href(href) {
            Self::Plain => Self::sniff(data),
            codec => codec,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Wrap a reader in the decoder for `codec`
pub fn decoder<'a, R: Read + 'a>(
    reader: R,
    codec: Codec,
) -> Result<Box<dyn Read + 'a>, CompressionError> {
    let decoder: Box<dyn Read + 'a> = match codec {
        Codec::Plain => Box::new(reader),
        Codec::Gzip => Box::new(flate2::read::MultiGzDecoder::new(reader)),
        Codec::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
        Codec::Xz => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
        Codec::Zstd => Box::new(zstd::Decoder::new(reader).map_err(|source| {
            CompressionError::DecoderCreation {
                codec: codec.name(),
                source,
            }
        })?),
    };
    Ok(decoder)
}

/// Decode a whole stream held in memory
pub fn decompress(data: &[u8], codec: Codec) -> Result<Vec<u8>, CompressionError> {
    if codec == Codec::Plain {
        return Ok(data.to_vec());
    }

    let mut output = Vec::with_capacity(data.len().saturating_mul(4));
    decoder(data, codec)?
        .read_to_end(&mut output)
        .map_err(|source| CompressionError::Decompression {
            codec: codec.name(),
            source,
        })?;
    Ok(output)
}
