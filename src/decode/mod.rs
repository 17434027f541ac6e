// src/decode/mod.rs

//! Metadata decoders
//!
//! Turn the raw bytes of a repodata stream into something the repository
//! facade can query:
//! - [`primary`]: primary.xml into an in-memory package list
//! - [`sqlite`]: primary.sqlite into a read-only SQLite store
//! - [`filelists`]: filelists.xml into a pkgid → paths map

pub mod filelists;
pub mod primary;
pub mod sqlite;

use crate::compression::{self, Codec};
use crate::error::{Error, Result};
use tracing::debug;

pub use filelists::{FileLists, parse_filelists};
pub use primary::{PrimaryXml, parse_primary};
pub use sqlite::PrimaryDb;

/// Decompress a fetched stream, choosing the codec from its href and
/// falling back to its leading bytes
pub fn decompress_stream(href: &str, data: &[u8]) -> Result<Vec<u8>> {
    let codec = Codec::detect(href, data);
    debug!("Decompressing {} ({} bytes, {})", href, data.len(), codec);

    let raw = compression::decompress(data, codec).map_err(|e| Error::decode(href, e))?;

    debug!("Decompressed {} bytes -> {} bytes", data.len(), raw.len());
    Ok(raw)
}
