// src/decode/primary.rs

//! primary.xml decoding
//!
//! Streams through the document once and builds one [`Package`] per
//! `<package>` element, in document order. The root's `packages` attribute
//! is kept as the declared count; it is reported as-is even when it
//! disagrees with the number of elements actually present.

use crate::decode::FileLists;
use crate::error::{Error, Result};
use crate::identity::normalize_epoch;
use crate::package::{DependencyEntry, DependencyFlag, DependencyKind, Package};
use crate::xml::{Attrs, Node, Ns, XmlReader};
use tracing::{debug, warn};

const WHAT: &str = "primary.xml";

/// Decoded primary.xml
#[derive(Debug, Clone, Default)]
pub struct PrimaryXml {
    /// The root's `packages` attribute
    pub declared: Option<usize>,
    /// Packages in document order
    pub packages: Vec<Package>,
}

impl PrimaryXml {
    /// Attach file lists by matching package checksum against pkgid
    pub fn join_filelists(&mut self, filelists: &FileLists) {
        let mut matched = 0;
        for package in &mut self.packages {
            if let Some(files) = filelists.get(&package.checksum.value) {
                package.files = files.to_vec();
                matched += 1;
            }
        }
        debug!("Attached file lists to {}/{} packages", matched, self.packages.len());
    }
}

/// Leaf elements whose text we keep
#[derive(Debug, Clone, Copy)]
enum Field {
    Name,
    Arch,
    Summary,
    Description,
    Packager,
    Url,
    Checksum,
    License,
    Vendor,
    Group,
    Buildhost,
    Sourcerpm,
}

impl Field {
    fn common(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "arch" => Some(Self::Arch),
            "summary" => Some(Self::Summary),
            "description" => Some(Self::Description),
            "packager" => Some(Self::Packager),
            "url" => Some(Self::Url),
            "checksum" => Some(Self::Checksum),
            _ => None,
        }
    }

    fn rpm(name: &str) -> Option<Self> {
        match name {
            "license" => Some(Self::License),
            "vendor" => Some(Self::Vendor),
            "group" => Some(Self::Group),
            "buildhost" => Some(Self::Buildhost),
            "sourcerpm" => Some(Self::Sourcerpm),
            _ => None,
        }
    }

    fn apply(self, package: &mut Package, text: String) {
        let slot = match self {
            Self::Name => &mut package.name,
            Self::Arch => &mut package.arch,
            Self::Summary => &mut package.summary,
            Self::Description => &mut package.description,
            Self::Packager => &mut package.packager,
            Self::Url => &mut package.url,
            Self::Checksum => &mut package.checksum.value,
            Self::License => &mut package.license,
            Self::Vendor => &mut package.vendor,
            Self::Group => &mut package.group,
            Self::Buildhost => &mut package.buildhost,
            Self::Sourcerpm => &mut package.sourcerpm,
        };
        *slot = text;
    }
}

/// Parse decompressed primary.xml
pub fn parse_primary(xml: &[u8]) -> Result<PrimaryXml> {
    let mut reader = XmlReader::new(xml, WHAT);
    let mut primary = PrimaryXml::default();
    let mut root_seen = false;

    let mut current: Option<Package> = None;
    let mut in_format = false;
    let mut section: Option<DependencyKind> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.next_node()? {
            Node::Start { ns, name, attrs } => {
                if !root_seen {
                    root_seen = true;
                    primary.declared = attrs.number("packages", WHAT)?;
                    continue;
                }

                if current.is_none() {
                    if ns == Ns::Common && name == "package" {
                        current = Some(Package::default());
                    }
                    continue;
                }
                let Some(package) = current.as_mut() else {
                    continue;
                };

                match (ns, name.as_str()) {
                    (Ns::Common, "format") => in_format = true,
                    (Ns::Common, "version") if !in_format => read_version(package, &attrs),
                    (Ns::Common, "time") if !in_format => {
                        package.time_file = attrs.number("file", WHAT)?.unwrap_or_default();
                        package.time_build = attrs.number("build", WHAT)?.unwrap_or_default();
                    }
                    (Ns::Common, "size") if !in_format => {
                        package.size_package = attrs.number("package", WHAT)?.unwrap_or_default();
                        package.size_installed =
                            attrs.number("installed", WHAT)?.unwrap_or_default();
                        package.size_archive = attrs.number("archive", WHAT)?.unwrap_or_default();
                    }
                    (Ns::Common, "location") if !in_format => {
                        package.location = attrs.string("href").unwrap_or_default();
                        package.location_base = attrs.string("xml:base");
                    }
                    (Ns::Common, "checksum") if !in_format => {
                        package.checksum.kind = attrs.string("type").unwrap_or_default();
                        package.checksum.pkgid =
                            attrs.get("pkgid").is_some_and(|v| v.eq_ignore_ascii_case("YES"));
                        field = Some(Field::Checksum);
                        text.clear();
                    }
                    (Ns::Common, leaf) if !in_format => {
                        field = Field::common(leaf);
                        text.clear();
                    }
                    (Ns::Rpm, "header-range") => {
                        package.header_start = attrs.number("start", WHAT)?.unwrap_or_default();
                        package.header_end = attrs.number("end", WHAT)?.unwrap_or_default();
                    }
                    (Ns::Rpm, "entry") => {
                        if let Some(kind) = section {
                            let entry = read_entry(&attrs)?;
                            package.dependencies.get_mut(kind).push(entry);
                        }
                    }
                    (Ns::Rpm, other) if in_format => {
                        if let Some(kind) = DependencyKind::from_name(other) {
                            section = Some(kind);
                        } else {
                            field = Field::rpm(other);
                            text.clear();
                        }
                    }
                    _ => {}
                }
            }
            Node::Text(t) => {
                if field.is_some() {
                    text.push_str(&t);
                }
            }
            Node::End { ns, name } => {
                if let Some(f) = field.take() {
                    if let Some(package) = current.as_mut() {
                        f.apply(package, std::mem::take(&mut text));
                    }
                    continue;
                }

                match (ns, name.as_str()) {
                    (Ns::Common, "package") => {
                        if let Some(mut package) = current.take() {
                            package.epoch = normalize_epoch(Some(&package.epoch));
                            primary.packages.push(package);
                        }
                        in_format = false;
                        section = None;
                    }
                    (Ns::Common, "format") => in_format = false,
                    (Ns::Rpm, other) if DependencyKind::from_name(other).is_some() => {
                        section = None;
                    }
                    _ => {}
                }
            }
            Node::Eof => break,
        }
    }

    if !root_seen {
        return Err(Error::decode(WHAT, "empty document"));
    }

    if let Some(declared) = primary.declared {
        if declared != primary.packages.len() {
            warn!(
                "primary.xml declares {} packages but contains {}",
                declared,
                primary.packages.len()
            );
        }
    }

    debug!("Decoded {} packages from primary.xml", primary.packages.len());
    Ok(primary)
}

fn read_version(package: &mut Package, attrs: &Attrs) {
    package.epoch = normalize_epoch(attrs.get("epoch"));
    package.version = attrs.string("ver").unwrap_or_default();
    package.release = attrs.string("rel").unwrap_or_default();
}

fn read_entry(attrs: &Attrs) -> Result<DependencyEntry> {
    let flags = match attrs.get("flags") {
        None | Some("") => None,
        Some(raw) => Some(DependencyFlag::parse(raw).ok_or_else(|| {
            Error::decode(WHAT, format!("unknown dependency flags {raw:?}"))
        })?),
    };

    Ok(DependencyEntry {
        name: attrs.string("name").unwrap_or_default(),
        flags,
        epoch: attrs.string("epoch"),
        version: attrs.string("ver"),
        release: attrs.string("rel"),
        pre: attrs
            .get("pre")
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
    })
}
