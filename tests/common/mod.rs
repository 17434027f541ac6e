// tests/common/mod.rs

//! Shared fixtures for integration tests.
//!
//! Builds a small repository ("BBQ": five packages, chicken listed twice)
//! in every form the loader understands and serves it from memory.

#![allow(dead_code)]

use bzip2::write::BzEncoder;
use flate2::Compression;
use flate2::write::GzEncoder;
use repomd::MemoryFetcher;
use repomd::hash::{HashAlgorithm, hash_bytes};
use rusqlite::{Connection, params};
use std::io::Write;

/// Root of the served repository
pub const BASE: &str = "https://example.com/bbq";

pub const BUILD_TIME: i64 = 1525208602;

/// One fixture package
#[derive(Debug, Clone)]
pub struct Fixture {
    pub name: &'static str,
    pub epoch: Option<&'static str>,
    pub version: &'static str,
    pub release: &'static str,
    pub summary: &'static str,
    /// (name, optional (flags, version))
    pub requires: Vec<(&'static str, Option<(&'static str, &'static str)>)>,
    pub files: Vec<&'static str>,
}

impl Fixture {
    /// Stable pkgid derived from the package identity
    pub fn pkgid(&self) -> String {
        let key = format!(
            "{}-{}:{}-{}.noarch",
            self.name,
            self.epoch.unwrap_or("0"),
            self.version,
            self.release
        );
        hash_bytes(HashAlgorithm::Sha256, key.as_bytes())
    }

    pub fn href(&self) -> String {
        format!("{}-{}-{}.noarch.rpm", self.name, self.version, self.release)
    }
}

/// The BBQ repository, in storage order
pub fn bbq() -> Vec<Fixture> {
    vec![
        Fixture {
            name: "chicken",
            epoch: Some("0"),
            version: "2.2.9",
            release: "1.fc27",
            summary: "Chicken",
            requires: vec![("smoker", None)],
            files: vec!["/usr/share/chicken", "/usr/share/chicken/thigh"],
        },
        Fixture {
            name: "brisket",
            epoch: Some("1"),
            version: "5.1.1",
            release: "1.fc27",
            summary: "Brisket",
            requires: vec![("smoker", None), ("charcoal", Some(("GE", "1.0")))],
            files: vec!["/usr/share/brisket"],
        },
        Fixture {
            name: "chicken",
            epoch: Some("0"),
            version: "2.2.10",
            release: "1.fc27",
            summary: "Chicken",
            requires: vec![("smoker", None)],
            files: vec!["/usr/share/chicken", "/usr/share/chicken/wings"],
        },
        Fixture {
            name: "pork-ribs",
            epoch: None,
            version: "3.2.0",
            release: "1.fc27",
            summary: "Pork ribs",
            requires: vec![],
            files: vec![],
        },
        Fixture {
            name: "beef-ribs",
            epoch: Some("0"),
            version: "1.1.0",
            release: "1.fc27",
            summary: "Beef ribs",
            requires: vec![("brisket", Some(("EQ", "5.1.1")))],
            files: vec!["/usr/share/beef-ribs"],
        },
    ]
}

fn entry_xml(name: &str, constraint: Option<(&str, &str)>) -> String {
    match constraint {
        Some((flags, version)) => {
            format!(r#"<rpm:entry name="{name}" flags="{flags}" epoch="0" ver="{version}"/>"#)
        }
        None => format!(r#"<rpm:entry name="{name}"/>"#),
    }
}

/// primary.xml for a package list
pub fn primary_xml(packages: &[Fixture]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata xmlns="http://linux.duke.edu/metadata/common" xmlns:rpm="http://linux.duke.edu/metadata/rpm" packages="{}">
"#,
        packages.len()
    );

    for p in packages {
        let epoch_attr = p
            .epoch
            .map(|e| format!(r#" epoch="{e}""#))
            .unwrap_or_default();
        let requires: String = p
            .requires
            .iter()
            .map(|(name, constraint)| entry_xml(name, *constraint))
            .collect();

        xml.push_str(&format!(
            r#"<package type="rpm">
  <name>{name}</name>
  <arch>noarch</arch>
  <version{epoch_attr} ver="{version}" rel="{release}"/>
  <checksum type="sha256" pkgid="YES">{pkgid}</checksum>
  <summary>{summary}</summary>
  <description>{summary}, slow smoked.</description>
  <packager>Pitmaster</packager>
  <url>https://example.com/{name}</url>
  <time file="1525208650" build="{build}"/>
  <size package="6164" installed="11" archive="368"/>
  <location href="{href}"/>
  <format>
    <rpm:license>BBQ</rpm:license>
    <rpm:vendor>Example BBQ</rpm:vendor>
    <rpm:group>Unspecified</rpm:group>
    <rpm:buildhost>smoker.example.com</rpm:buildhost>
    <rpm:sourcerpm>{name}-{version}-{release}.src.rpm</rpm:sourcerpm>
    <rpm:header-range start="4504" end="5873"/>
    <rpm:provides>
      <rpm:entry name="{name}" flags="EQ" epoch="{epoch}" ver="{version}" rel="{release}"/>
    </rpm:provides>
    <rpm:requires>{requires}</rpm:requires>
  </format>
</package>
"#,
            name = p.name,
            version = p.version,
            release = p.release,
            epoch = p.epoch.unwrap_or("0"),
            pkgid = p.pkgid(),
            summary = p.summary,
            build = BUILD_TIME,
            href = p.href(),
        ));
    }

    xml.push_str("</metadata>\n");
    xml
}

/// filelists.xml for a package list
pub fn filelists_xml(packages: &[Fixture]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<filelists xmlns="http://linux.duke.edu/metadata/filelists" packages="{}">
"#,
        packages.len()
    );
    for p in packages {
        xml.push_str(&format!(
            r#"<package pkgid="{}" name="{}" arch="noarch">
  <version epoch="{}" ver="{}" rel="{}"/>
"#,
            p.pkgid(),
            p.name,
            p.epoch.unwrap_or("0"),
            p.version,
            p.release
        ));
        for file in &p.files {
            xml.push_str(&format!("  <file>{file}</file>\n"));
        }
        xml.push_str("</package>\n");
    }
    xml.push_str("</filelists>\n");
    xml
}

/// primary.sqlite bytes for a package list
pub fn primary_db(packages: &[Fixture]) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("primary.sqlite");
    let conn = Connection::open(&path).unwrap();

    conn.execute_batch(
        "CREATE TABLE db_info (dbversion INTEGER, checksum TEXT);
         CREATE TABLE packages (
            pkgKey INTEGER PRIMARY KEY, pkgId TEXT, name TEXT, arch TEXT,
            version TEXT, epoch TEXT, release TEXT, summary TEXT,
            description TEXT, url TEXT, time_file INTEGER, time_build INTEGER,
            rpm_license TEXT, rpm_vendor TEXT, rpm_group TEXT, rpm_buildhost TEXT,
            rpm_sourcerpm TEXT, rpm_header_start INTEGER, rpm_header_end INTEGER,
            rpm_packager TEXT, size_package INTEGER, size_installed INTEGER,
            size_archive INTEGER, location_href TEXT, location_base TEXT,
            checksum_type TEXT);
         CREATE TABLE provides (name TEXT, flags TEXT, epoch TEXT, version TEXT,
            release TEXT, pkgKey INTEGER);
         CREATE TABLE requires (name TEXT, flags TEXT, epoch TEXT, version TEXT,
            release TEXT, pkgKey INTEGER, pre BOOLEAN DEFAULT FALSE);
         CREATE TABLE conflicts (name TEXT, flags TEXT, epoch TEXT, version TEXT,
            release TEXT, pkgKey INTEGER);
         CREATE TABLE obsoletes (name TEXT, flags TEXT, epoch TEXT, version TEXT,
            release TEXT, pkgKey INTEGER);
         INSERT INTO db_info VALUES (10, 'fixture');",
    )
    .unwrap();

    for p in packages {
        conn.execute(
            "INSERT INTO packages (pkgId, name, arch, version, epoch, release,
                summary, description, url, time_file, time_build, rpm_license,
                rpm_vendor, rpm_group, rpm_buildhost, rpm_sourcerpm,
                rpm_header_start, rpm_header_end, rpm_packager, size_package,
                size_installed, size_archive, location_href, checksum_type)
             VALUES (?1, ?2, 'noarch', ?3, ?4, ?5, ?6, ?7, ?8, 1525208650, ?9,
                'BBQ', 'Example BBQ', 'Unspecified', 'smoker.example.com', ?10,
                4504, 5873, 'Pitmaster', 6164, 11, 368, ?11, 'sha256')",
            params![
                p.pkgid(),
                p.name,
                p.version,
                p.epoch,
                p.release,
                p.summary,
                format!("{}, slow smoked.", p.summary),
                format!("https://example.com/{}", p.name),
                BUILD_TIME,
                format!("{}-{}-{}.src.rpm", p.name, p.version, p.release),
                p.href(),
            ],
        )
        .unwrap();
        let pkg_key = conn.last_insert_rowid();

        conn.execute(
            "INSERT INTO provides VALUES (?1, 'EQ', ?2, ?3, ?4, ?5)",
            params![p.name, p.epoch.unwrap_or("0"), p.version, p.release, pkg_key],
        )
        .unwrap();
        for (name, constraint) in &p.requires {
            let (flags, version) = match constraint {
                Some((flags, version)) => (Some(*flags), Some(*version)),
                None => (None, None),
            };
            let epoch = constraint.map(|_| "0");
            conn.execute(
                "INSERT INTO requires VALUES (?1, ?2, ?3, ?4, NULL, ?5, 'FALSE')",
                params![name, flags, epoch, version, pkg_key],
            )
            .unwrap();
        }
    }

    drop(conn);
    std::fs::read(&path).unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn bz2(data: &[u8]) -> Vec<u8> {
    let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// One stream listed in repomd.xml
pub struct Stream {
    pub kind: &'static str,
    pub href: String,
    pub bytes: Vec<u8>,
}

impl Stream {
    pub fn new(kind: &'static str, href: &str, bytes: Vec<u8>) -> Self {
        Self {
            kind,
            href: href.to_string(),
            bytes,
        }
    }
}

/// repomd.xml listing the given streams with correct sha256 checksums
pub fn repomd_xml(streams: &[Stream]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo" xmlns:rpm="http://linux.duke.edu/metadata/rpm">
  <revision>1525208700</revision>
"#,
    );
    for stream in streams {
        xml.push_str(&format!(
            r#"  <data type="{}">
    <checksum type="sha256">{}</checksum>
    <location href="{}"/>
    <timestamp>1525208700</timestamp>
    <size>{}</size>
  </data>
"#,
            stream.kind,
            hash_bytes(HashAlgorithm::Sha256, &stream.bytes),
            stream.href,
            stream.bytes.len()
        ));
    }
    xml.push_str("</repomd>\n");
    xml
}

/// Serve a repository made of `streams` under `base`
pub fn serve(fetcher: &mut MemoryFetcher, base: &str, streams: Vec<Stream>) {
    fetcher.insert(&format!("{base}/repodata/repomd.xml"), repomd_xml(&streams));
    for stream in streams {
        fetcher.insert(&format!("{base}/{}", stream.href), stream.bytes);
    }
}

pub fn primary_xml_stream(packages: &[Fixture]) -> Stream {
    Stream::new(
        "primary",
        "repodata/0001-primary.xml.gz",
        gzip(primary_xml(packages).as_bytes()),
    )
}

pub fn filelists_stream(packages: &[Fixture]) -> Stream {
    Stream::new(
        "filelists",
        "repodata/0002-filelists.xml.gz",
        gzip(filelists_xml(packages).as_bytes()),
    )
}

pub fn primary_db_stream(packages: &[Fixture]) -> Stream {
    Stream::new(
        "primary_db",
        "repodata/0003-primary.sqlite.bz2",
        bz2(&primary_db(packages)),
    )
}

/// BBQ served as primary.xml + filelists.xml at [`BASE`]
pub fn xml_repo() -> MemoryFetcher {
    let packages = bbq();
    let mut fetcher = MemoryFetcher::new();
    serve(
        &mut fetcher,
        BASE,
        vec![primary_xml_stream(&packages), filelists_stream(&packages)],
    );
    fetcher
}

/// BBQ served as primary_db (bzip2) + filelists.xml at [`BASE`]
pub fn sqlite_repo() -> MemoryFetcher {
    let packages = bbq();
    let mut fetcher = MemoryFetcher::new();
    serve(
        &mut fetcher,
        BASE,
        vec![primary_db_stream(&packages), filelists_stream(&packages)],
    );
    fetcher
}

/// A repository with no packages at [`BASE`]
pub fn empty_repo() -> MemoryFetcher {
    let mut fetcher = MemoryFetcher::new();
    serve(&mut fetcher, BASE, vec![primary_xml_stream(&[])]);
    fetcher
}
