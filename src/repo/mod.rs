// src/repo/mod.rs

//! Loaded repositories
//!
//! [`Repository::load`] runs the whole pipeline once: resolve the index
//! (with mirror fallback), pick the primary stream, fetch and decode it,
//! and optionally join the file lists. The result answers queries until it
//! is dropped; nothing is refreshed.
//!
//! A `Repository` is `Send + Sync`. The primary.xml backing is plain data;
//! the primary_db backing serialises queries on its SQLite connection.

mod store;

pub use store::{PackageStore, Packages, StoreKind};

use crate::config::{Config, LoadOptions};
use crate::decode::{self, PrimaryDb, parse_filelists, parse_primary};
use crate::error::{Error, Result};
use crate::location::RepositoryLocation;
use crate::package::Package;
use crate::repomd::{PrimaryStream, RepoIndex};
use crate::resolver::{self, ResolvedIndex};
use crate::transport::{Fetcher, HttpFetcher};
use std::fmt;
use tracing::{debug, info, warn};

/// A loaded repository
pub struct Repository {
    url: String,
    base: RepositoryLocation,
    index: RepoIndex,
    store: Box<dyn PackageStore>,
}

impl Repository {
    /// Load a repository over HTTP (or from disk) with default settings
    pub fn load(url: &str) -> Result<Self> {
        let config = Config::default();
        let fetcher = HttpFetcher::with_config(&config.http)?;
        Self::load_with(url, &fetcher, &config.load)
    }

    /// Load a repository through any fetcher
    pub fn load_with(url: &str, fetcher: &dyn Fetcher, options: &LoadOptions) -> Result<Self> {
        let location = RepositoryLocation::parse(url)?;
        info!("Loading repository {}", location);

        let ResolvedIndex { base, index } =
            resolver::fetch_index(fetcher, &location, options.mirror_fallback)?;

        let primary = index.primary().ok_or_else(|| Error::MissingPrimaryMetadata {
            url: url.to_string(),
        })?;
        let data = primary.data();
        debug!("Selected {} stream {}", data.kind, data.location);

        let raw = resolver::fetch_stream(fetcher, &base, data, options.verify_checksums)?;
        let bytes = decode::decompress_stream(&data.location, &raw)?;

        let mut store: Box<dyn PackageStore> = match primary {
            PrimaryStream::Xml(_) => Box::new(parse_primary(&bytes)?),
            PrimaryStream::Sqlite(_) => Box::new(PrimaryDb::open(&bytes)?),
        };

        if options.filelists {
            match index.filelists() {
                Some(filelists) => {
                    let raw =
                        resolver::fetch_stream(fetcher, &base, filelists, options.verify_checksums)?;
                    let bytes = decode::decompress_stream(&filelists.location, &raw)?;
                    store.attach_filelists(parse_filelists(&bytes)?);
                }
                None => warn!("File lists requested but {} lists none", base),
            }
        }

        let repository = Self {
            url: url.to_string(),
            base,
            index,
            store,
        };
        info!(
            "Loaded {} from {} ({} packages)",
            repository.store.kind(),
            repository.base,
            repository.count()?
        );
        Ok(repository)
    }

    /// The location this repository was loaded from, as given
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The root streams were fetched from; a mirror after fallback
    pub fn base(&self) -> &RepositoryLocation {
        &self.base
    }

    pub fn revision(&self) -> Option<&str> {
        self.index.revision.as_deref()
    }

    pub fn index(&self) -> &RepoIndex {
        &self.index
    }

    /// Which primary encoding backs this repository
    pub fn store_kind(&self) -> StoreKind {
        self.store.kind()
    }

    /// Number of packages
    pub fn count(&self) -> Result<usize> {
        self.store.count()
    }

    /// Walk every package in storage order
    pub fn iter(&self) -> Packages<'_> {
        self.store.iter()
    }

    /// Collect every package in storage order
    pub fn packages(&self) -> Result<Vec<Package>> {
        self.iter().collect()
    }

    /// The last package with this name, if any
    pub fn find(&self, name: &str) -> Result<Option<Package>> {
        self.store.find(name)
    }

    /// Every package with this name, in storage order
    pub fn find_all(&self, name: &str) -> Result<Vec<Package>> {
        self.store.find_all(name)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("url", &self.url)
            .field("base", &self.base.as_str())
            .field("revision", &self.index.revision)
            .field("store", &self.store.kind())
            .finish()
    }
}
