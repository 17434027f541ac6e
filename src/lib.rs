// src/lib.rs

//! Read-only access to dnf/yum repository metadata
//!
//! Loads a repository's `repodata/repomd.xml`, follows it to the primary
//! package stream (primary.xml or the primary_db SQLite form) and answers
//! queries about the packages it lists.
//!
//! ```no_run
//! let repo = repomd::Repository::load("https://example.com/fedora/27/x86_64")?;
//! if let Some(pkg) = repo.find("chicken")? {
//!     println!("{}", pkg.nevra()?);
//! }
//! # Ok::<(), repomd::Error>(())
//! ```
//!
//! # Architecture
//!
//! - Resolution: direct index first, mirror list on not-found
//! - Decoding: one decoder per stream form, no shared tree
//! - Querying: [`PackageStore`] over either backing, wrapped by [`Repository`]
//! - Transport: anything implementing [`Fetcher`]

pub mod compression;
pub mod config;
pub mod decode;
mod error;
pub mod hash;
pub mod identity;
pub mod location;
pub mod package;
pub mod repo;
pub mod repomd;
pub mod resolver;
pub mod transport;
mod xml;

pub use config::{Config, HttpConfig, LoadOptions};
pub use error::{Error, Result, TransportError};
pub use identity::{Evr, Nevra, rpmvercmp};
pub use location::RepositoryLocation;
pub use package::{Checksum, DependencyEntry, DependencyFlag, DependencyKind, Package};
pub use repo::{PackageStore, Packages, Repository, StoreKind};
pub use repomd::{RepoData, RepoIndex};
pub use transport::{Fetcher, HttpFetcher, MemoryFetcher};
