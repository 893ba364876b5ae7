//! Snapshot persistence with checksummed data files.
//!
//! Layout of a data directory:
//!
//! ```text
//! <data_dir>/manifest.json           format version, generation, checksum and row count per table
//! <data_dir>/data.<gen>/<table>.json rows of one table, in insertion order
//! ```
//!
//! Every save writes its tables into a fresh generation directory. The
//! manifest rename is the commit point: until it lands, the manifest
//! still names the previous generation, whose files are left untouched.

pub mod io_utils;
mod persistence_manager;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use persistence_manager::PersistenceManager;

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Manifest written after every data file of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Format version
    pub version: u32,
    /// Database version the snapshot was taken at
    #[serde(default)]
    pub db_version: u64,
    /// Generation directory holding the data files
    #[serde(default)]
    pub generation: u64,
    /// Per-table entries, keyed by table name
    pub tables: BTreeMap<String, TableEntry>,
}

/// Manifest entry for one data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableEntry {
    /// CRC32 of the data file contents
    pub checksum: u32,
    /// Number of rows in the file
    pub rows: usize,
}
