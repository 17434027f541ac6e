// src/repomd.rs

//! The repository index document, `repodata/repomd.xml`
//!
//! ```xml
//! <repomd xmlns="http://linux.duke.edu/metadata/repo">
//!   <revision>1525208700</revision>
//!   <data type="primary">
//!     <checksum type="sha256">...</checksum>
//!     <location href="repodata/...-primary.xml.gz"/>
//!     <timestamp>1525208700</timestamp>
//!     <size>1234</size>
//!   </data>
//! </repomd>
//! ```

use crate::error::{Error, Result};
use crate::xml::{Node, Ns, XmlReader};
use tracing::debug;

/// `type` of the structured primary stream
pub const DATA_PRIMARY: &str = "primary";
/// `type` of the relational primary stream
pub const DATA_PRIMARY_DB: &str = "primary_db";
/// `type` of the file-list stream
pub const DATA_FILELISTS: &str = "filelists";

/// A checksum as listed in repomd.xml
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChecksum {
    pub kind: String,
    pub value: String,
}

/// One `<data>` descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoData {
    /// The `type` attribute, e.g. `primary`
    pub kind: String,
    /// Repository-relative href of the artifact
    pub location: String,
    pub location_base: Option<String>,
    /// Checksum of the artifact as stored (compressed)
    pub checksum: Option<StreamChecksum>,
    /// Checksum of the decompressed content
    pub open_checksum: Option<StreamChecksum>,
    pub timestamp: Option<i64>,
    pub size: Option<u64>,
    pub open_size: Option<u64>,
    /// Schema version of `*_db` streams
    pub database_version: Option<u32>,
}

/// Which primary encoding a repository offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryStream<'a> {
    /// primary.xml
    Xml(&'a RepoData),
    /// primary.sqlite
    Sqlite(&'a RepoData),
}

impl<'a> PrimaryStream<'a> {
    pub fn data(&self) -> &'a RepoData {
        match self {
            Self::Xml(data) | Self::Sqlite(data) => data,
        }
    }
}

/// Parsed repomd.xml
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoIndex {
    pub revision: Option<String>,
    pub data: Vec<RepoData>,
}

/// Text-carrying children of `<data>` and `<repomd>`
#[derive(Debug, Clone, Copy)]
enum Field {
    Revision,
    Checksum,
    OpenChecksum,
    Timestamp,
    Size,
    OpenSize,
    DatabaseVersion,
}

impl RepoIndex {
    /// Parse repomd.xml
    pub fn parse(xml: &[u8]) -> Result<Self> {
        const WHAT: &str = "repomd.xml";

        let mut reader = XmlReader::new(xml, WHAT);
        let mut index = RepoIndex::default();
        let mut current: Option<RepoData> = None;
        let mut field: Option<(Field, Option<String>)> = None;
        let mut text = String::new();
        let mut saw_root = false;

        loop {
            match reader.next_node()? {
                Node::Start { ns: Ns::Repo, name, attrs } => match name.as_str() {
                    "repomd" => saw_root = true,
                    "revision" if current.is_none() => {
                        field = Some((Field::Revision, None));
                        text.clear();
                    }
                    "data" => {
                        current = Some(RepoData {
                            kind: attrs.string("type").unwrap_or_default(),
                            ..RepoData::default()
                        });
                    }
                    "location" => {
                        if let Some(data) = current.as_mut() {
                            data.location = attrs.string("href").unwrap_or_default();
                            data.location_base = attrs.string("xml:base");
                        }
                    }
                    other if current.is_some() => {
                        let f = match other {
                            "checksum" => Some(Field::Checksum),
                            "open-checksum" => Some(Field::OpenChecksum),
                            "timestamp" => Some(Field::Timestamp),
                            "size" => Some(Field::Size),
                            "open-size" => Some(Field::OpenSize),
                            "database_version" => Some(Field::DatabaseVersion),
                            _ => None,
                        };
                        if let Some(f) = f {
                            field = Some((f, attrs.string("type")));
                            text.clear();
                        }
                    }
                    _ => {}
                },
                Node::Text(t) => {
                    if field.is_some() {
                        text.push_str(&t);
                    }
                }
                Node::End { ns: Ns::Repo, name } => {
                    if name == "data" {
                        if let Some(data) = current.take() {
                            index.data.push(data);
                        }
                    } else if let Some((f, kind)) = field.take() {
                        apply_field(&mut index, current.as_mut(), f, kind, text.trim(), WHAT)?;
                    }
                }
                Node::Eof => break,
                _ => {}
            }
        }

        if !saw_root {
            return Err(Error::decode(WHAT, "no <repomd> root element"));
        }

        debug!(
            "Parsed repomd.xml: {} data streams ({})",
            index.data.len(),
            index
                .data
                .iter()
                .map(|d| d.kind.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(index)
    }

    /// First descriptor of the given type
    pub fn get(&self, kind: &str) -> Option<&RepoData> {
        self.data.iter().find(|d| d.kind == kind)
    }

    /// The primary stream: structured form first, relational form second
    pub fn primary(&self) -> Option<PrimaryStream<'_>> {
        self.get(DATA_PRIMARY)
            .map(PrimaryStream::Xml)
            .or_else(|| self.get(DATA_PRIMARY_DB).map(PrimaryStream::Sqlite))
    }

    pub fn filelists(&self) -> Option<&RepoData> {
        self.get(DATA_FILELISTS)
    }
}

fn apply_field(
    index: &mut RepoIndex,
    data: Option<&mut RepoData>,
    field: Field,
    kind: Option<String>,
    text: &str,
    what: &str,
) -> Result<()> {
    let number_err = |name: &str| Error::decode(what, format!("<{name}> is not a number: {text:?}"));

    if let Field::Revision = field {
        index.revision = Some(text.to_string());
        return Ok(());
    }

    let Some(data) = data else {
        return Ok(());
    };

    match field {
        Field::Revision => {}
        Field::Checksum => {
            data.checksum = Some(StreamChecksum {
                kind: kind.unwrap_or_default(),
                value: text.to_string(),
            });
        }
        Field::OpenChecksum => {
            data.open_checksum = Some(StreamChecksum {
                kind: kind.unwrap_or_default(),
                value: text.to_string(),
            });
        }
        Field::Timestamp => {
            // Some generators write fractional timestamps
            let secs = text.split('.').next().unwrap_or_default();
            data.timestamp = Some(secs.parse().map_err(|_| number_err("timestamp"))?);
        }
        Field::Size => data.size = Some(text.parse().map_err(|_| number_err("size"))?),
        Field::OpenSize => {
            data.open_size = Some(text.parse().map_err(|_| number_err("open-size"))?);
        }
        Field::DatabaseVersion => {
            data.database_version =
                Some(text.parse().map_err(|_| number_err("database_version"))?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPOMD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo" xmlns:rpm="http://linux.duke.edu/metadata/rpm">
  <revision>1525208700</revision>
  <data type="primary">
    <checksum type="sha256">aaaa</checksum>
    <open-checksum type="sha256">bbbb</open-checksum>
    <location href="repodata/aaaa-primary.xml.gz"/>
    <timestamp>1525208700</timestamp>
    <size>1024</size>
    <open-size>4096</open-size>
  </data>
  <data type="filelists">
    <checksum type="sha256">cccc</checksum>
    <location href="repodata/cccc-filelists.xml.gz"/>
    <timestamp>1525208700.25</timestamp>
  </data>
  <data type="primary_db">
    <checksum type="sha256">dddd</checksum>
    <location xml:base="https://cdn.example.com/" href="repodata/dddd-primary.sqlite.bz2"/>
    <database_version>10</database_version>
  </data>
</repomd>
"#;

    #[test]
    fn test_parse_repomd() {
        let index = RepoIndex::parse(REPOMD.as_bytes()).unwrap();
        assert_eq!(index.revision.as_deref(), Some("1525208700"));
        assert_eq!(index.data.len(), 3);

        let primary = index.get(DATA_PRIMARY).unwrap();
        assert_eq!(primary.location, "repodata/aaaa-primary.xml.gz");
        assert_eq!(
            primary.checksum,
            Some(StreamChecksum {
                kind: "sha256".to_string(),
                value: "aaaa".to_string()
            })
        );
        assert_eq!(primary.open_checksum.as_ref().unwrap().value, "bbbb");
        assert_eq!(primary.timestamp, Some(1525208700));
        assert_eq!(primary.size, Some(1024));
        assert_eq!(primary.open_size, Some(4096));

        let filelists = index.filelists().unwrap();
        assert_eq!(filelists.timestamp, Some(1525208700));

        let db = index.get(DATA_PRIMARY_DB).unwrap();
        assert_eq!(db.database_version, Some(10));
        assert_eq!(db.location_base.as_deref(), Some("https://cdn.example.com/"));
    }

    #[test]
    fn test_primary_prefers_xml() {
        let index = RepoIndex::parse(REPOMD.as_bytes()).unwrap();
        match index.primary() {
            Some(PrimaryStream::Xml(data)) => assert_eq!(data.kind, DATA_PRIMARY),
            other => panic!("expected xml primary, got {other:?}"),
        }
    }

    #[test]
    fn test_primary_falls_back_to_db() {
        let xml = r#"<repomd xmlns="http://linux.duke.edu/metadata/repo">
  <data type="primary_db"><location href="repodata/primary.sqlite.bz2"/></data>
</repomd>"#;
        let index = RepoIndex::parse(xml.as_bytes()).unwrap();
        let primary = index.primary().unwrap();
        assert!(matches!(primary, PrimaryStream::Sqlite(_)));
        assert_eq!(primary.data().location, "repodata/primary.sqlite.bz2");
    }

    #[test]
    fn test_no_primary() {
        let xml = r#"<repomd xmlns="http://linux.duke.edu/metadata/repo">
  <data type="other"><location href="repodata/other.xml.gz"/></data>
</repomd>"#;
        let index = RepoIndex::parse(xml.as_bytes()).unwrap();
        assert!(index.primary().is_none());
    }

    #[test]
    fn test_not_repomd() {
        let result = RepoIndex::parse(b"<html><body>Not here</body></html>");
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_bad_size() {
        let xml = r#"<repomd xmlns="http://linux.duke.edu/metadata/repo">
  <data type="primary"><size>big</size></data>
</repomd>"#;
        assert!(RepoIndex::parse(xml.as_bytes()).is_err());
    }
}
