// src/resolver.rs

//! Index discovery and stream fetching
//!
//! A repository location is either a repository root (it has
//! `repodata/repomd.xml`) or a mirror list (a text document of repository
//! roots, one per line). The root interpretation is tried first; only a
//! not-found answer for the index switches to the mirror-list
//! interpretation. Mirrors are tried in listed order and the first one that
//! serves a parseable index wins.

use crate::error::{Error, Result};
use crate::hash::{self, HashAlgorithm, HashError, VerifyError};
use crate::location::{RepositoryLocation, parse_mirror_list};
use crate::repomd::{RepoData, RepoIndex, StreamChecksum};
use crate::transport::Fetcher;
use tracing::{debug, info, warn};

/// A parsed index together with the root it was served from
#[derive(Debug, Clone)]
pub struct ResolvedIndex {
    /// Root that all hrefs in `index` are relative to; the winning mirror
    /// after fallback
    pub base: RepositoryLocation,
    pub index: RepoIndex,
}

/// Fetch and parse repomd.xml for a location, falling back to the
/// mirror-list interpretation on not-found when allowed
pub fn fetch_index(
    fetcher: &dyn Fetcher,
    location: &RepositoryLocation,
    mirror_fallback: bool,
) -> Result<ResolvedIndex> {
    let index_url = location.index_url();
    debug!("Fetching {} via {}", index_url, fetcher.name());

    match fetcher.fetch(&index_url) {
        Ok(bytes) => Ok(ResolvedIndex {
            base: location.clone(),
            index: RepoIndex::parse(&bytes)?,
        }),
        Err(e) if e.is_not_found() && mirror_fallback => {
            info!("No repomd.xml under {}, reading it as a mirror list", location);
            from_mirror_list(fetcher, location)
        }
        Err(e) => Err(e),
    }
}

fn from_mirror_list(fetcher: &dyn Fetcher, location: &RepositoryLocation) -> Result<ResolvedIndex> {
    let not_a_repository = || Error::NotARepository {
        url: location.to_string(),
    };

    let body = match fetcher.fetch(location.url()) {
        Ok(body) => body,
        Err(e) => {
            debug!("Mirror list {} unavailable: {}", location, e);
            return Err(not_a_repository());
        }
    };

    let mirrors = parse_mirror_list(&String::from_utf8_lossy(&body));
    if mirrors.is_empty() {
        debug!("Mirror list {} has no usable entries", location);
        return Err(not_a_repository());
    }
    debug!("Mirror list {} has {} entries", location, mirrors.len());

    for mirror in mirrors {
        let index_url = mirror.index_url();
        let result = fetcher
            .fetch(&index_url)
            .and_then(|bytes| RepoIndex::parse(&bytes));

        match result {
            Ok(index) => {
                info!("Using mirror {}", mirror);
                return Ok(ResolvedIndex {
                    base: mirror,
                    index,
                });
            }
            Err(e) => warn!("Mirror {} failed: {}", mirror, e),
        }
    }

    Err(not_a_repository())
}

/// Fetch the artifact a `<data>` descriptor points at, verifying its
/// checksum when asked
///
/// A descriptor with `xml:base` is fetched relative to that base instead of
/// the repository root.
pub fn fetch_stream(
    fetcher: &dyn Fetcher,
    base: &RepositoryLocation,
    data: &RepoData,
    verify: bool,
) -> Result<Vec<u8>> {
    let root = match data.location_base.as_deref() {
        Some(alt) => RepositoryLocation::parse(alt)?,
        None => base.clone(),
    };
    let url = root.join(&data.location);
    debug!("Fetching {} stream from {}", data.kind, url);

    let bytes = fetcher.fetch(&url)?;
    if verify {
        verify_checksum(&data.location, &bytes, data.checksum.as_ref())?;
    }
    Ok(bytes)
}

/// Check bytes against a listed checksum
///
/// Missing checksums and legacy algorithms pass without verification.
pub fn verify_checksum(what: &str, bytes: &[u8], checksum: Option<&StreamChecksum>) -> Result<()> {
    let Some(checksum) = checksum else {
        debug!("No checksum listed for {}", what);
        return Ok(());
    };

    let algorithm = match checksum.kind.parse::<HashAlgorithm>() {
        Ok(algorithm) => algorithm,
        Err(HashError::Unsupported(kind)) => {
            debug!("Not verifying {} checksum of {}", kind, what);
            return Ok(());
        }
        Err(e) => {
            warn!("Not verifying {}: {}", what, e);
            return Ok(());
        }
    };

    hash::verify_bytes(bytes, &checksum.value, algorithm).map_err(|e| match e {
        VerifyError::Mismatch {
            expected, actual, ..
        } => Error::ChecksumMismatch {
            what: what.to_string(),
            expected,
            actual,
        },
        malformed @ VerifyError::Malformed { .. } => Error::decode("repomd.xml", malformed),
    })?;

    debug!("Verified {} checksum of {}", algorithm, what);
    Ok(())
}
