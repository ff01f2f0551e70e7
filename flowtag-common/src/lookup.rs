//! Lookup table loading.
//!
//! The lookup table is a delimited file with a header row naming at least the
//! `dstport`, `protocol` and `tag` columns, in any order:
//!
//! ```text
//! dstport,protocol,tag
//! 25,tcp,sv_P1
//! 68,udp,sv_P2
//! ```

use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};
use std::{
    collections::HashMap,
    fs::File,
    io::Read,
    path::Path,
};

use crate::{types::LookupKey, Error, Result};

pub const DSTPORT_COLUMN: &str = "dstport";
pub const PROTOCOL_COLUMN: &str = "protocol";
pub const TAG_COLUMN: &str = "tag";

/// Default field delimiter of the lookup file.
pub const DEFAULT_DELIMITER: u8 = b',';

/// Exact-match mapping from (destination port, protocol) to a tag.
///
/// Built once by the loader and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    entries: HashMap<LookupKey, String>,
}

/// Positions of the required columns in the header row.
struct Columns {
    dstport: usize,
    protocol: usize,
    tag: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| Error::Schema(format!("header is missing the '{}' column", name)))
        };

        Ok(Self {
            dstport: find(DSTPORT_COLUMN)?,
            protocol: find(PROTOCOL_COLUMN)?,
            tag: find(TAG_COLUMN)?,
        })
    }
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a comma-delimited lookup table from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(path, DEFAULT_DELIMITER)
    }

    /// Load a lookup table from a file using the given field delimiter.
    pub fn load(path: impl AsRef<Path>, delimiter: u8) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::file_access(path, e))?;
        let table = Self::read_from(file, delimiter, path)?;
        debug!("Loaded {} lookup entries from {}", table.len(), path.display());
        Ok(table)
    }

    /// Load a lookup table from any reader.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        Self::read_from(reader, delimiter, Path::new("<lookup source>"))
    }

    fn read_from<R: Read>(reader: R, delimiter: u8, origin: &Path) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers().map_err(|e| csv_error(e, origin))?;
        let columns = Columns::locate(headers)?;

        let mut table = Self::new();
        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(e, origin))?;
            let field = |idx: usize, name: &str| {
                record.get(idx).ok_or_else(|| {
                    let line = record.position().map_or(0, |p| p.line());
                    Error::Schema(format!("line {} has no value for '{}'", line, name))
                })
            };

            let dstport = field(columns.dstport, DSTPORT_COLUMN)?;
            let protocol = field(columns.protocol, PROTOCOL_COLUMN)?;
            let tag = field(columns.tag, TAG_COLUMN)?;

            if let Some(previous) = table.insert(LookupKey::new(dstport, protocol), tag) {
                warn!(
                    "Lookup entry {}/{} redefined: '{}' replaces '{}'",
                    dstport,
                    protocol.to_lowercase(),
                    tag,
                    previous
                );
            }
        }

        Ok(table)
    }

    /// Insert a mapping, returning the tag it replaced, if any.
    pub fn insert(&mut self, key: LookupKey, tag: impl Into<String>) -> Option<String> {
        self.entries.insert(key, tag.into())
    }

    /// Tag assigned to a key, if the table has one.
    pub fn get(&self, key: &LookupKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&LookupKey, &str)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(k, v)| (k, v.as_str()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }
}

fn csv_error(err: csv::Error, origin: &Path) -> Error {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => Error::file_access(origin, io),
        _ => Error::Schema(format!("{}: {}", origin.display(), message)),
    }
}
