// src/decode/sqlite.rs

//! primary.sqlite decoding
//!
//! The decompressed database is written to a temporary file and opened
//! read-only. Packages are materialised row by row on demand; nothing is
//! loaded up front beyond a sanity check that the `packages` table exists.
//!
//! The connection sits behind a mutex so a loaded database can be queried
//! from several threads; each query holds the lock only while it runs.

use crate::decode::FileLists;
use crate::error::{Error, Result};
use crate::identity::normalize_epoch;
use crate::package::{DependencyEntry, DependencyFlag, DependencyKind, Package};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, Statement, params};
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const WHAT: &str = "primary_db";

/// Selects every packages column plus a stable row key for paging
const SELECT_PACKAGES: &str = "SELECT rowid AS repomd_rowid, * FROM packages";

/// A read-only primary.sqlite
///
/// The connection is declared before the file so that it closes before the
/// file is removed.
pub struct PrimaryDb {
    conn: Mutex<Connection>,
    dependency_tables: Vec<DependencyKind>,
    filelists: Option<FileLists>,
    file: NamedTempFile,
}

impl std::fmt::Debug for PrimaryDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimaryDb")
            .field("path", &self.file.path())
            .field("dependency_tables", &self.dependency_tables)
            .field("filelists", &self.filelists.as_ref().map(|f| f.len()))
            .finish()
    }
}

impl PrimaryDb {
    /// Materialise decompressed database bytes and open them
    pub fn open(data: &[u8]) -> Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(data)?;
        file.flush()?;

        let conn = Connection::open_with_flags(
            file.path(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| Error::decode(WHAT, e))?;

        // Opening is lazy; the first query is what notices a non-database
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM packages", [], |row| row.get(0))
            .map_err(|e| Error::decode(WHAT, e))?;

        let dependency_tables = existing_dependency_tables(&conn)?;
        debug!(
            "Opened primary_db at {} ({} packages, dependency tables: {:?})",
            file.path().display(),
            rows,
            dependency_tables
        );

        Ok(Self {
            conn: Mutex::new(conn),
            dependency_tables,
            filelists: None,
            file,
        })
    }

    /// Attach file lists, joined on `pkgId`
    pub fn set_filelists(&mut self, filelists: FileLists) {
        self.filelists = Some(filelists);
    }

    /// The connection; the database is read-only, so one left behind by a
    /// panicking query is still usable
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of rows in `packages`
    pub fn row_count(&self) -> Result<usize> {
        let rows: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM packages", [], |row| row.get(0))?;
        Ok(usize::try_from(rows).unwrap_or_default())
    }

    /// Up to `limit` packages with a row key greater than `after`, in
    /// storage order, each with its row key
    pub fn packages_after(&self, after: i64, limit: usize) -> Result<Vec<(i64, Package)>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(&format!(
            "{SELECT_PACKAGES} WHERE rowid > ?1 ORDER BY rowid LIMIT ?2"
        ))?;
        let rows = query_packages(&mut stmt, params![after, limit])?;
        rows.into_iter()
            .map(|row| Ok((row.rowid, self.complete(&conn, row)?)))
            .collect()
    }

    /// All packages with this exact name, in storage order
    pub fn packages_named(&self, name: &str) -> Result<Vec<Package>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare_cached(&format!("{SELECT_PACKAGES} WHERE name = ?1 ORDER BY rowid"))?;
        let rows = query_packages(&mut stmt, params![name])?;
        rows.into_iter().map(|row| self.complete(&conn, row)).collect()
    }

    /// The last package with this exact name in storage order
    pub fn last_named(&self, name: &str) -> Result<Option<Package>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(&format!(
            "{SELECT_PACKAGES} WHERE name = ?1 ORDER BY rowid DESC LIMIT 1"
        ))?;
        let columns = column_names(&stmt);
        let found = stmt
            .query_row(params![name], |row| package_from_row(&columns, row))
            .optional()?;

        match found {
            Some(row) => Ok(Some(self.complete(&conn, row)?)),
            None => Ok(None),
        }
    }

    /// Fill in what lives outside the `packages` row
    fn complete(&self, conn: &Connection, row: PackageRow) -> Result<Package> {
        let PackageRow {
            pkg_key,
            mut package,
            ..
        } = row;

        if let Some(pkg_key) = pkg_key {
            for kind in &self.dependency_tables {
                *package.dependencies.get_mut(*kind) = dependency_rows(conn, *kind, pkg_key)?;
            }
        }
        if let Some(files) = self
            .filelists
            .as_ref()
            .and_then(|f| f.get(&package.checksum.value))
        {
            package.files = files.clone();
        }
        Ok(package)
    }
}

fn dependency_rows(
    conn: &Connection,
    kind: DependencyKind,
    pkg_key: i64,
) -> Result<Vec<DependencyEntry>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT * FROM {} WHERE pkgKey = ?1 ORDER BY rowid",
        kind.name()
    ))?;
    let columns = column_names(&stmt);
    let entries = stmt
        .query_map(params![pkg_key], |row| entry_from_row(&columns, row))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

fn existing_dependency_tables(conn: &Connection) -> Result<Vec<DependencyKind>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(DependencyKind::ALL
        .into_iter()
        .filter(|kind| names.iter().any(|n| n == kind.name()))
        .collect())
}

fn column_names(stmt: &Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

/// One `packages` row before its dependencies are joined
struct PackageRow {
    rowid: i64,
    /// Key the dependency tables refer to; absent in stripped-down schemas
    pkg_key: Option<i64>,
    package: Package,
}

fn query_packages(
    stmt: &mut Statement<'_>,
    params: impl rusqlite::Params,
) -> Result<Vec<PackageRow>> {
    let columns = column_names(stmt);
    let rows = stmt
        .query_map(params, |row| package_from_row(&columns, row))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Any column as text; NULL is `None`
fn value_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}

/// Any column as an integer; NULL and non-numeric text become 0
fn value_int(value: ValueRef<'_>) -> i64 {
    match value {
        ValueRef::Integer(i) => i,
        ValueRef::Real(f) => f as i64,
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or_default(),
        ValueRef::Null | ValueRef::Blob(_) => 0,
    }
}

fn value_uint(value: ValueRef<'_>) -> u64 {
    u64::try_from(value_int(value)).unwrap_or_default()
}

fn package_from_row(columns: &[String], row: &Row<'_>) -> rusqlite::Result<PackageRow> {
    let mut rowid = 0;
    let mut pkg_key = None;
    let mut package = Package::default();
    package.checksum.pkgid = true;

    for (i, column) in columns.iter().enumerate() {
        let value = row.get_ref(i)?;
        let text = || value_text(value).unwrap_or_default();

        match column.as_str() {
            "repomd_rowid" => rowid = value_int(value),
            "pkgKey" => {
                if !matches!(value, ValueRef::Null) {
                    pkg_key = Some(value_int(value));
                }
            }
            "pkgId" => package.checksum.value = text(),
            "checksum_type" => package.checksum.kind = text(),
            "name" => package.name = text(),
            "arch" => package.arch = text(),
            "epoch" => package.epoch = normalize_epoch(value_text(value).as_deref()),
            "version" => package.version = text(),
            "release" => package.release = text(),
            "summary" => package.summary = text(),
            "description" => package.description = text(),
            "url" => package.url = text(),
            "time_file" => package.time_file = value_int(value),
            "time_build" => package.time_build = value_int(value),
            "rpm_license" => package.license = text(),
            "rpm_vendor" => package.vendor = text(),
            "rpm_group" => package.group = text(),
            "rpm_buildhost" => package.buildhost = text(),
            "rpm_sourcerpm" => package.sourcerpm = text(),
            "rpm_header_start" => package.header_start = value_uint(value),
            "rpm_header_end" => package.header_end = value_uint(value),
            "rpm_packager" => package.packager = text(),
            "size_package" => package.size_package = value_uint(value),
            "size_installed" => package.size_installed = value_uint(value),
            "size_archive" => package.size_archive = value_uint(value),
            "location_href" => package.location = text(),
            "location_base" => package.location_base = value_text(value),
            other => {
                if let Some(v) = value_text(value) {
                    let key = other.strip_prefix("rpm_").unwrap_or(other);
                    package.extra.insert(key.to_string(), v);
                }
            }
        }
    }

    // Rows without an epoch column at all still get one
    if package.epoch.is_empty() {
        package.epoch = normalize_epoch(None);
    }

    Ok(PackageRow {
        rowid,
        pkg_key,
        package,
    })
}

fn entry_from_row(columns: &[String], row: &Row<'_>) -> rusqlite::Result<DependencyEntry> {
    let mut entry = DependencyEntry::default();

    for (i, column) in columns.iter().enumerate() {
        let value = row.get_ref(i)?;
        match column.as_str() {
            "name" => entry.name = value_text(value).unwrap_or_default(),
            "flags" => {
                entry.flags = value_text(value).as_deref().and_then(|raw| {
                    let flag = DependencyFlag::parse(raw);
                    if flag.is_none() && !raw.is_empty() {
                        warn!("Ignoring unknown dependency flags {:?}", raw);
                    }
                    flag
                });
            }
            "epoch" => entry.epoch = value_text(value),
            "version" => entry.version = value_text(value),
            "release" => entry.release = value_text(value),
            "pre" => {
                entry.pre = match value {
                    ValueRef::Text(t) => {
                        let t = String::from_utf8_lossy(t);
                        t.eq_ignore_ascii_case("true") || t == "1"
                    }
                    other => value_int(other) != 0,
                };
            }
            _ => {}
        }
    }

    Ok(entry)
}
