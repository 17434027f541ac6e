// src/xml.rs

//! Namespace-aware XML reading shared by the repodata parsers
//!
//! Wraps quick-xml's `NsReader` and hands out owned nodes so each parser
//! can be a plain state machine. Empty elements are expanded into a start
//! and an end node.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::str::FromStr;

/// repomd.xml
pub const NS_REPO: &[u8] = b"http://linux.duke.edu/metadata/repo";
/// primary.xml package elements
pub const NS_COMMON: &[u8] = b"http://linux.duke.edu/metadata/common";
/// primary.xml `format` section
pub const NS_RPM: &[u8] = b"http://linux.duke.edu/metadata/rpm";
/// filelists.xml
pub const NS_FILELISTS: &[u8] = b"http://linux.duke.edu/metadata/filelists";

/// The namespaces repodata uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ns {
    Repo,
    Common,
    Rpm,
    Filelists,
    Other,
}

impl Ns {
    fn resolve(result: &ResolveResult<'_>) -> Self {
        let ResolveResult::Bound(Namespace(uri)) = result else {
            return Self::Other;
        };

        if *uri == NS_REPO {
            Self::Repo
        } else if *uri == NS_COMMON {
            Self::Common
        } else if *uri == NS_RPM {
            Self::Rpm
        } else if *uri == NS_FILELISTS {
            Self::Filelists
        } else {
            Self::Other
        }
    }
}

/// Attributes of an element, keyed by their qualified name
#[derive(Debug, Default)]
pub(crate) struct Attrs(Vec<(String, String)>);

impl Attrs {
    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn string(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    /// Parse a numeric attribute; a present but malformed value is an error
    pub(crate) fn number<T: FromStr>(&self, name: &str, what: &str) -> Result<Option<T>> {
        match self.get(name).map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                Error::decode(what, format!("attribute {name}={raw:?} is not a number"))
            }),
        }
    }
}

/// One parsed XML node
#[derive(Debug)]
pub(crate) enum Node {
    Start { ns: Ns, name: String, attrs: Attrs },
    End { ns: Ns, name: String },
    Text(String),
    Eof,
}

/// Pull reader producing [`Node`]s
pub(crate) struct XmlReader<'a> {
    reader: NsReader<&'a [u8]>,
    buf: Vec<u8>,
    what: &'static str,
}

impl<'a> XmlReader<'a> {
    /// `what` names the document in error messages
    pub(crate) fn new(data: &'a [u8], what: &'static str) -> Self {
        let mut reader = NsReader::from_reader(data);
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::new(),
            what,
        }
    }

    pub(crate) fn next_node(&mut self) -> Result<Node> {
        let what = self.what;
        loop {
            self.buf.clear();
            let (result, event) = self
                .reader
                .read_resolved_event_into(&mut self.buf)
                .map_err(|e| Error::decode(what, e))?;
            let ns = Ns::resolve(&result);

            match event {
                Event::Start(e) => {
                    return Ok(Node::Start {
                        ns,
                        name: local_name(&e),
                        attrs: attributes(&e, what)?,
                    });
                }
                Event::End(e) => {
                    return Ok(Node::End {
                        ns,
                        name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                    });
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| Error::decode(what, e))?;
                    return Ok(Node::Text(text.into_owned()));
                }
                Event::CData(c) => {
                    return Ok(Node::Text(String::from_utf8_lossy(c.as_ref()).into_owned()));
                }
                Event::Eof => return Ok(Node::Eof),
                // Declarations, comments, processing instructions, doctype
                _ => continue,
            }
        }
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart<'_>, what: &str) -> Result<Attrs> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::decode(what, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| Error::decode(what, err))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(Attrs(attrs))
}
