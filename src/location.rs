// src/location.rs

//! Repository locations and href re-basing
//!
//! Every href in repomd.xml is relative to the repository root, not to
//! repomd.xml itself. Re-basing joins the href onto the path of the base
//! URL and leaves scheme, host, port, query and fragment untouched, so a
//! signed or tokenised base URL keeps working for every stream.

use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;
use tracing::debug;
use url::Url;

/// Relative path of the index document under a repository root
pub const REPOMD_PATH: &str = "repodata/repomd.xml";

/// A repository base location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocation {
    url: Url,
}

impl RepositoryLocation {
    /// Parse a base location
    ///
    /// Accepts absolute URLs and absolute filesystem paths; the latter are
    /// turned into `file://` URLs.
    pub fn parse(location: &str) -> Result<Self> {
        match Url::parse(location) {
            Ok(url) => Ok(Self { url }),
            Err(url::ParseError::RelativeUrlWithoutBase) if Path::new(location).is_absolute() => {
                let url = Url::from_file_path(location).map_err(|()| {
                    Error::InvalidLocation(format!("not a usable path: {location}"))
                })?;
                Ok(Self { url })
            }
            Err(e) => Err(Error::InvalidLocation(format!("{location}: {e}"))),
        }
    }

    pub fn from_url(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Resolve a repository-relative href against this location
    ///
    /// Only the path component changes.
    pub fn join(&self, href: &str) -> Url {
        let mut url = self.url.clone();
        let path = join_path(self.url.path(), href);
        url.set_path(&path);
        url
    }

    /// URL of `repodata/repomd.xml` under this location
    pub fn index_url(&self) -> Url {
        self.join(REPOMD_PATH)
    }
}

impl fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Join a relative POSIX path onto a base path
///
/// An absolute `rel` replaces the base. Empty and `.` segments are
/// collapsed; `..` is kept as-is.
pub fn join_path(base: &str, rel: &str) -> String {
    let joined = if rel.starts_with('/') {
        rel.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), rel)
    };

    let segments: Vec<&str> = joined
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    format!("/{}", segments.join("/"))
}

/// True when a URL has both a scheme and a network location
fn is_well_formed(url: &Url) -> bool {
    !url.scheme().is_empty() && url.host_str().is_some_and(|h| !h.is_empty())
}

/// Parse a mirror-list document into candidate base locations
///
/// One URL per line. Lines that are not absolute URLs with a host are
/// dropped without error.
pub fn parse_mirror_list(text: &str) -> Vec<RepositoryLocation> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match Url::parse(line) {
            Ok(url) if is_well_formed(&url) => Some(RepositoryLocation::from_url(url)),
            _ => {
                debug!("Dropping malformed mirror list line: {:?}", line);
                None
            }
        })
        .collect()
}
