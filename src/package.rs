// src/package.rs

//! Package records
//!
//! A [`Package`] is a self-contained copy of one `<package>` element or one
//! `packages` row: it owns all of its data and outlives the repository it
//! came from. Equality and hashing use only the NEVRA tuple, so two records
//! describing the same build are interchangeable as set members or map
//! keys regardless of which backing store produced them.

use crate::error::Result;
use crate::identity::{self, Nevra};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Comparison operator of a dependency entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyFlag {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl DependencyFlag {
    /// Parse the repodata flag vocabulary (`EQ`, `GE`, ...)
    pub fn parse(flags: &str) -> Option<Self> {
        match flags {
            "EQ" => Some(Self::Eq),
            "NE" => Some(Self::Ne),
            "GT" => Some(Self::Gt),
            "LT" => Some(Self::Lt),
            "GE" => Some(Self::Ge),
            "LE" => Some(Self::Le),
            _ => None,
        }
    }

    /// The flag as written in repodata
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Gt => "GT",
            Self::Lt => "LT",
            Self::Ge => "GE",
            Self::Le => "LE",
        }
    }

    /// The flag as a comparison operator
    pub fn operator(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }
}

impl fmt::Display for DependencyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operator())
    }
}

/// Relationship sections of a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DependencyKind {
    Provides,
    Requires,
    Conflicts,
    Obsoletes,
    Recommends,
    Suggests,
    Supplements,
    Enhances,
}

impl DependencyKind {
    pub const ALL: [DependencyKind; 8] = [
        Self::Provides,
        Self::Requires,
        Self::Conflicts,
        Self::Obsoletes,
        Self::Recommends,
        Self::Suggests,
        Self::Supplements,
        Self::Enhances,
    ];

    /// Element name in primary.xml, also the table name in primary_db
    pub fn name(&self) -> &'static str {
        match self {
            Self::Provides => "provides",
            Self::Requires => "requires",
            Self::Conflicts => "conflicts",
            Self::Obsoletes => "obsoletes",
            Self::Recommends => "recommends",
            Self::Suggests => "suggests",
            Self::Supplements => "supplements",
            Self::Enhances => "enhances",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// One relationship entry, e.g. `Requires: libfoo >= 1.2`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyEntry {
    pub name: String,
    pub flags: Option<DependencyFlag>,
    pub epoch: Option<String>,
    pub version: Option<String>,
    pub release: Option<String>,
    /// Needed before the package's scriptlets run (requires only)
    pub pre: bool,
}

impl DependencyEntry {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// The version constraint: `"-"` when unconstrained, otherwise
    /// `"<op> <evr>"` with a zero epoch omitted
    pub fn condition(&self) -> Result<String> {
        let Some(flags) = self.flags else {
            return Ok("-".to_string());
        };

        let epoch = identity::normalize_epoch(self.epoch.as_deref());
        let mut evr = String::new();
        if identity::parse_epoch(&epoch)? != 0 {
            evr.push_str(&epoch);
            evr.push(':');
        }
        evr.push_str(self.version.as_deref().unwrap_or_default());
        if let Some(release) = self.release.as_deref().filter(|r| !r.is_empty()) {
            evr.push('-');
            evr.push_str(release);
        }

        Ok(format!("{} {}", flags.operator(), evr))
    }

    /// `(name, condition)` pair
    pub fn pair(&self) -> Result<(String, String)> {
        Ok((self.name.clone(), self.condition()?))
    }
}

/// All relationship sections of one package, each in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    pub provides: Vec<DependencyEntry>,
    pub requires: Vec<DependencyEntry>,
    pub conflicts: Vec<DependencyEntry>,
    pub obsoletes: Vec<DependencyEntry>,
    pub recommends: Vec<DependencyEntry>,
    pub suggests: Vec<DependencyEntry>,
    pub supplements: Vec<DependencyEntry>,
    pub enhances: Vec<DependencyEntry>,
}

impl Dependencies {
    pub fn get(&self, kind: DependencyKind) -> &[DependencyEntry] {
        match kind {
            DependencyKind::Provides => &self.provides,
            DependencyKind::Requires => &self.requires,
            DependencyKind::Conflicts => &self.conflicts,
            DependencyKind::Obsoletes => &self.obsoletes,
            DependencyKind::Recommends => &self.recommends,
            DependencyKind::Suggests => &self.suggests,
            DependencyKind::Supplements => &self.supplements,
            DependencyKind::Enhances => &self.enhances,
        }
    }

    pub fn get_mut(&mut self, kind: DependencyKind) -> &mut Vec<DependencyEntry> {
        match kind {
            DependencyKind::Provides => &mut self.provides,
            DependencyKind::Requires => &mut self.requires,
            DependencyKind::Conflicts => &mut self.conflicts,
            DependencyKind::Obsoletes => &mut self.obsoletes,
            DependencyKind::Recommends => &mut self.recommends,
            DependencyKind::Suggests => &mut self.suggests,
            DependencyKind::Supplements => &mut self.supplements,
            DependencyKind::Enhances => &mut self.enhances,
        }
    }

    pub fn is_empty(&self) -> bool {
        DependencyKind::ALL.iter().all(|kind| self.get(*kind).is_empty())
    }
}

/// Package checksum; when `pkgid` is set the value is the package's
/// identity in the filelists and other streams
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checksum {
    pub kind: String,
    pub value: String,
    pub pkgid: bool,
}

/// One package from a repository
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub name: String,
    pub arch: String,
    /// Always set; `"0"` when the metadata has no epoch
    pub epoch: String,
    pub version: String,
    pub release: String,
    pub summary: String,
    pub description: String,
    pub packager: String,
    pub url: String,
    pub license: String,
    pub vendor: String,
    pub group: String,
    pub buildhost: String,
    pub sourcerpm: String,
    pub checksum: Checksum,
    /// Download location relative to the repository root
    pub location: String,
    /// Alternate base URL for `location`, if the repository set one
    pub location_base: Option<String>,
    /// Build time, seconds since the epoch
    pub time_build: i64,
    /// File mtime when the repository was generated
    pub time_file: i64,
    pub size_package: u64,
    pub size_installed: u64,
    pub size_archive: u64,
    pub header_start: u64,
    pub header_end: u64,
    pub dependencies: Dependencies,
    /// Installed paths, only when the filelists stream was loaded
    pub files: Vec<String>,
    /// Columns of a primary_db row that have no dedicated field
    pub extra: BTreeMap<String, String>,
}

impl Package {
    pub fn vr(&self) -> String {
        identity::vr(&self.version, &self.release)
    }

    pub fn nvr(&self) -> String {
        identity::nvr(&self.name, &self.version, &self.release)
    }

    pub fn evr(&self) -> Result<String> {
        identity::evr(&self.epoch, &self.version, &self.release)
    }

    pub fn nevr(&self) -> Result<String> {
        identity::nevr(&self.name, &self.epoch, &self.version, &self.release)
    }

    pub fn nevra(&self) -> Result<String> {
        identity::nevra(&self.name, &self.epoch, &self.version, &self.release, &self.arch)
    }

    /// The identity tuple (name, epoch, version, release, arch)
    pub fn nevra_tuple(&self) -> (&str, &str, &str, &str, &str) {
        (&self.name, &self.epoch, &self.version, &self.release, &self.arch)
    }

    /// Owned identity, orderable by EVR
    pub fn identity(&self) -> Nevra {
        Nevra::new(
            &self.name,
            Some(&self.epoch),
            &self.version,
            &self.release,
            &self.arch,
        )
    }

    /// Build time as a calendar timestamp
    pub fn build_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time_build, 0)
    }

    /// Relationship entries of one kind
    pub fn dependencies(&self, kind: DependencyKind) -> &[DependencyEntry] {
        self.dependencies.get(kind)
    }

    pub fn provides(&self) -> &[DependencyEntry] {
        &self.dependencies.provides
    }

    pub fn requires(&self) -> &[DependencyEntry] {
        &self.dependencies.requires
    }

    pub fn conflicts(&self) -> &[DependencyEntry] {
        &self.dependencies.conflicts
    }

    pub fn obsoletes(&self) -> &[DependencyEntry] {
        &self.dependencies.obsoletes
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.nevra_tuple() == other.nevra_tuple()
    }
}

impl Eq for Package {}

impl Hash for Package {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nevra_tuple().hash(state);
    }
}
