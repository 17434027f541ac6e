// src/repo/store.rs

//! Common query surface of the two primary backings

use crate::decode::{FileLists, PrimaryDb, PrimaryXml};
use crate::error::Result;
use crate::package::Package;
use std::fmt;
use std::vec;

/// Lazy, restartable sequence of packages in storage order
pub type Packages<'a> = Box<dyn Iterator<Item = Result<Package>> + 'a>;

/// Rows fetched per query when walking a primary_db
const PAGE_SIZE: usize = 256;

/// Which encoding a store was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Xml,
    Sqlite,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml => write!(f, "primary.xml"),
            Self::Sqlite => write!(f, "primary_db"),
        }
    }
}

/// A decoded primary stream that packages can be queried from
///
/// Every call starts from scratch: iterating twice walks the store twice,
/// and no operation changes what later ones see. Packages are returned as
/// owned copies. Stores are shared between threads as-is.
pub trait PackageStore: Send + Sync {
    fn kind(&self) -> StoreKind;

    /// Number of packages
    fn count(&self) -> Result<usize>;

    /// All packages in storage order
    fn iter(&self) -> Packages<'_>;

    /// The last package named `name` in storage order
    fn find(&self, name: &str) -> Result<Option<Package>>;

    /// Every package named `name`, in storage order
    fn find_all(&self, name: &str) -> Result<Vec<Package>>;

    /// Join file lists onto packages by pkgid
    fn attach_filelists(&mut self, filelists: FileLists);
}

impl PackageStore for PrimaryXml {
    fn kind(&self) -> StoreKind {
        StoreKind::Xml
    }

    /// The document's declared count when it has one
    fn count(&self) -> Result<usize> {
        Ok(self.declared.unwrap_or(self.packages.len()))
    }

    fn iter(&self) -> Packages<'_> {
        Box::new(self.packages.iter().cloned().map(Ok))
    }

    fn find(&self, name: &str) -> Result<Option<Package>> {
        Ok(self.packages.iter().rev().find(|p| p.name == name).cloned())
    }

    fn find_all(&self, name: &str) -> Result<Vec<Package>> {
        Ok(self
            .packages
            .iter()
            .filter(|p| p.name == name)
            .cloned()
            .collect())
    }

    fn attach_filelists(&mut self, filelists: FileLists) {
        self.join_filelists(&filelists);
    }
}

impl PackageStore for PrimaryDb {
    fn kind(&self) -> StoreKind {
        StoreKind::Sqlite
    }

    fn count(&self) -> Result<usize> {
        self.row_count()
    }

    fn iter(&self) -> Packages<'_> {
        Box::new(DbPages {
            db: self,
            after: 0,
            page: Vec::new().into_iter(),
            done: false,
        })
    }

    fn find(&self, name: &str) -> Result<Option<Package>> {
        self.last_named(name)
    }

    fn find_all(&self, name: &str) -> Result<Vec<Package>> {
        self.packages_named(name)
    }

    fn attach_filelists(&mut self, filelists: FileLists) {
        self.set_filelists(filelists);
    }
}

/// Keyset-paged walk over a primary_db
struct DbPages<'a> {
    db: &'a PrimaryDb,
    after: i64,
    page: vec::IntoIter<(i64, Package)>,
    done: bool,
}

impl Iterator for DbPages<'_> {
    type Item = Result<Package>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((rowid, package)) = self.page.next() {
                self.after = rowid;
                return Some(Ok(package));
            }
            if self.done {
                return None;
            }

            match self.db.packages_after(self.after, PAGE_SIZE) {
                Ok(page) => {
                    if page.len() < PAGE_SIZE {
                        self.done = true;
                    }
                    self.page = page.into_iter();
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
