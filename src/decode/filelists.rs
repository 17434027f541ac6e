// src/decode/filelists.rs

//! filelists.xml decoding

use crate::error::{Error, Result};
use crate::xml::{Node, Ns, XmlReader};
use std::collections::HashMap;
use tracing::debug;

const WHAT: &str = "filelists.xml";

/// Installed paths keyed by package pkgid
pub type FileLists = HashMap<String, Vec<String>>;

/// Parse decompressed filelists.xml
pub fn parse_filelists(xml: &[u8]) -> Result<FileLists> {
    let mut reader = XmlReader::new(xml, WHAT);
    let mut filelists = FileLists::new();
    let mut root_seen = false;

    let mut current: Option<(String, Vec<String>)> = None;
    let mut in_file = false;
    let mut text = String::new();

    loop {
        match reader.next_node()? {
            Node::Start { ns, name, attrs } => {
                root_seen = true;
                match (ns, name.as_str()) {
                    (Ns::Filelists, "package") => {
                        let pkgid = attrs
                            .string("pkgid")
                            .ok_or_else(|| Error::decode(WHAT, "<package> without pkgid"))?;
                        current = Some((pkgid, Vec::new()));
                    }
                    (Ns::Filelists, "file") if current.is_some() => {
                        in_file = true;
                        text.clear();
                    }
                    _ => {}
                }
            }
            Node::Text(t) => {
                if in_file {
                    text.push_str(&t);
                }
            }
            Node::End { ns: Ns::Filelists, name } => match name.as_str() {
                "file" if in_file => {
                    in_file = false;
                    if let Some((_, files)) = current.as_mut() {
                        files.push(std::mem::take(&mut text));
                    }
                }
                "package" => {
                    if let Some((pkgid, files)) = current.take() {
                        filelists.entry(pkgid).or_default().extend(files);
                    }
                }
                _ => {}
            },
            Node::End { .. } => {}
            Node::Eof => break,
        }
    }

    if !root_seen {
        return Err(Error::decode(WHAT, "empty document"));
    }

    debug!("Decoded file lists for {} packages", filelists.len());
    Ok(filelists)
}
