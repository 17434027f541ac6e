// src/identity.rs

//! Package identity: name-epoch-version-release-architecture
//!
//! Display strings follow RPM convention: an epoch of zero is never shown,
//! so `0:1.0-1` and `1.0-1` format identically. The epoch still takes part
//! in identity; it is normalised to `"0"` once, at decode time, via
//! [`normalize_epoch`] so that an absent epoch and an explicit zero compare
//! equal.

use crate::error::{Error, Result};
use std::cmp::Ordering;

/// Normalise an epoch read from metadata: absent or blank becomes `"0"`
pub fn normalize_epoch(epoch: Option<&str>) -> String {
    match epoch.map(str::trim) {
        Some(e) if !e.is_empty() => e.to_string(),
        _ => "0".to_string(),
    }
}

/// Parse an epoch as an unsigned integer, failing with [`Error::Format`]
///
/// Surrounding whitespace is ignored. Digit strings too long for `u64`
/// saturate rather than fail.
pub fn parse_epoch(epoch: &str) -> Result<u64> {
    let digits = epoch.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Format {
            epoch: epoch.to_string(),
        });
    }
    Ok(digits.parse().unwrap_or(u64::MAX))
}

/// `"{version}-{release}"`
pub fn vr(version: &str, release: &str) -> String {
    format!("{version}-{release}")
}

/// `"{name}-{version}-{release}"`
pub fn nvr(name: &str, version: &str, release: &str) -> String {
    format!("{name}-{}", vr(version, release))
}

/// `"{epoch}:{version}-{release}"`, or `"{version}-{release}"` when the
/// epoch is zero
pub fn evr(epoch: &str, version: &str, release: &str) -> Result<String> {
    if parse_epoch(epoch)? != 0 {
        Ok(format!("{}:{}", epoch.trim(), vr(version, release)))
    } else {
        Ok(vr(version, release))
    }
}

/// `"{name}-{evr}"`
pub fn nevr(name: &str, epoch: &str, version: &str, release: &str) -> Result<String> {
    Ok(format!("{name}-{}", evr(epoch, version, release)?))
}

/// `"{nevr}.{arch}"`
pub fn nevra(name: &str, epoch: &str, version: &str, release: &str, arch: &str) -> Result<String> {
    Ok(format!("{}.{arch}", nevr(name, epoch, version, release)?))
}

/// The identity tuple of a package
///
/// Equality and hashing cover all five fields. Ordering compares name,
/// then EVR (see [`Evr`]), then arch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nevra {
    pub name: String,
    pub epoch: String,
    pub version: String,
    pub release: String,
    pub arch: String,
}

impl Nevra {
    /// Build an identity, normalising an empty epoch to `"0"`
    pub fn new(name: &str, epoch: Option<&str>, version: &str, release: &str, arch: &str) -> Self {
        Self {
            name: name.to_string(),
            epoch: normalize_epoch(epoch),
            version: version.to_string(),
            release: release.to_string(),
            arch: arch.to_string(),
        }
    }

    pub fn vr(&self) -> String {
        vr(&self.version, &self.release)
    }

    pub fn nvr(&self) -> String {
        nvr(&self.name, &self.version, &self.release)
    }

    pub fn evr(&self) -> Result<String> {
        evr(&self.epoch, &self.version, &self.release)
    }

    pub fn nevr(&self) -> Result<String> {
        nevr(&self.name, &self.epoch, &self.version, &self.release)
    }

    pub fn nevra(&self) -> Result<String> {
        nevra(&self.name, &self.epoch, &self.version, &self.release, &self.arch)
    }

    /// The epoch-version-release part, for ordering
    pub fn to_evr(&self) -> Evr {
        Evr {
            epoch: self.epoch.clone(),
            version: self.version.clone(),
            release: self.release.clone(),
        }
    }
}

impl Ord for Nevra {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.to_evr().cmp(&other.to_evr()))
            .then_with(|| self.arch.cmp(&other.arch))
    }
}

impl PartialOrd for Nevra {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Epoch, version and release, ordered the way RPM orders them
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Evr {
    pub epoch: String,
    pub version: String,
    pub release: String,
}

impl Evr {
    pub fn new(epoch: Option<&str>, version: &str, release: &str) -> Self {
        Self {
            epoch: normalize_epoch(epoch),
            version: version.to_string(),
            release: release.to_string(),
        }
    }

    /// Formatted with the epoch-omission rule
    pub fn format(&self) -> Result<String> {
        evr(&self.epoch, &self.version, &self.release)
    }
}

impl Ord for Evr {
    fn cmp(&self, other: &Self) -> Ordering {
        rpmvercmp(&self.epoch, &other.epoch)
            .then_with(|| rpmvercmp(&self.version, &other.version))
            .then_with(|| rpmvercmp(&self.release, &other.release))
    }
}

impl PartialOrd for Evr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two version strings segment by segment, RPM style
///
/// Strings are split into runs of digits and runs of letters; everything
/// else separates segments. Numeric runs compare numerically and beat
/// alphabetic runs. `~` sorts before anything (pre-releases), `^` sorts
/// after the base version but before any further segment (snapshots).
pub fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let one = a.as_bytes();
    let two = b.as_bytes();
    let (mut i, mut j) = (0, 0);

    let is_sep = |c: u8| !c.is_ascii_alphanumeric() && c != b'~' && c != b'^';

    loop {
        while i < one.len() && is_sep(one[i]) {
            i += 1;
        }
        while j < two.len() && is_sep(two[j]) {
            j += 1;
        }

        let c1 = one.get(i).copied();
        let c2 = two.get(j).copied();

        if c1 == Some(b'~') || c2 == Some(b'~') {
            if c1 != Some(b'~') {
                return Ordering::Greater;
            }
            if c2 != Some(b'~') {
                return Ordering::Less;
            }
            i += 1;
            j += 1;
            continue;
        }

        if c1 == Some(b'^') || c2 == Some(b'^') {
            if c1.is_none() {
                return Ordering::Less;
            }
            if c2.is_none() {
                return Ordering::Greater;
            }
            if c1 != Some(b'^') {
                return Ordering::Greater;
            }
            if c2 != Some(b'^') {
                return Ordering::Less;
            }
            i += 1;
            j += 1;
            continue;
        }

        let (Some(first), Some(_)) = (c1, c2) else {
            break;
        };

        let numeric = first.is_ascii_digit();
        let take = |s: &[u8], mut k: usize| {
            let start = k;
            while k < s.len()
                && (if numeric {
                    s[k].is_ascii_digit()
                } else {
                    s[k].is_ascii_alphabetic()
                })
            {
                k += 1;
            }
            (start, k)
        };

        let (s1, e1) = take(one, i);
        let (s2, e2) = take(two, j);
        i = e1;
        j = e2;

        // Segment types differ: numeric beats alpha
        if s2 == e2 {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let mut seg1 = &one[s1..e1];
        let mut seg2 = &two[s2..e2];

        let ord = if numeric {
            while seg1.len() > 1 && seg1[0] == b'0' {
                seg1 = &seg1[1..];
            }
            while seg2.len() > 1 && seg2[0] == b'0' {
                seg2 = &seg2[1..];
            }
            seg1.len().cmp(&seg2.len()).then_with(|| seg1.cmp(seg2))
        } else {
            seg1.cmp(seg2)
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }

    match (i < one.len(), j < two.len()) {
        (false, false) => Ordering::Equal,
        (true, _) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}
