use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crc32fast::Hasher;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::io_utils::{classify_io_error, retry_io_operation, write_atomically};
use super::{Manifest, TableEntry, MANIFEST_VERSION};
use crate::config::DbConfig;
use crate::database::{Database, Tables};
use crate::error::DbError;

const MANIFEST_FILE: &str = "manifest.json";
const GENERATION_PREFIX: &str = "data.";

/// Saves and loads snapshots of the database tables.
#[derive(Debug)]
pub struct PersistenceManager {
    /// Data directory path
    data_dir: PathBuf,
    /// Database version of the last successful flush
    flushed_version: AtomicU64,
    /// Maximum retry attempts for transient I/O errors
    max_retries: u32,
    /// Delay between retry attempts in milliseconds
    retry_delay_ms: u64,
}

/// One encoded table, ready to be written.
struct EncodedTable {
    name: &'static str,
    bytes: Vec<u8>,
    rows: usize,
}

impl PersistenceManager {
    /// Creates a persistence manager storing snapshots under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>, config: &DbConfig) -> Self {
        Self {
            data_dir: data_dir.into(),
            flushed_version: AtomicU64::new(0),
            max_retries: config.persistence_max_retries,
            retry_delay_ms: config.persistence_retry_delay_ms,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding the data files of snapshot `generation`.
    pub fn generation_dir(&self, generation: u64) -> PathBuf {
        self.data_dir.join(format!("{}{}", GENERATION_PREFIX, generation))
    }

    /// Writes a snapshot of `tables` to disk.
    ///
    /// Data files go to a new generation directory and the manifest is
    /// replaced last, so a crash mid-save leaves the previous snapshot
    /// loadable.
    pub fn save(&self, tables: &Tables) -> Result<(), DbError> {
        self.save_at(tables, 0)
    }

    fn save_at(&self, tables: &Tables, db_version: u64) -> Result<(), DbError> {
        let encoded = encode_tables(tables)?;
        let generation = self.committed_generation()? + 1;
        retry_io_operation(
            || self.save_internal(&encoded, db_version, generation),
            self.max_retries,
            self.retry_delay_ms,
            "save snapshot",
        )?;
        self.remove_stale_generations(generation);
        Ok(())
    }

    fn save_internal(
        &self,
        encoded: &[EncodedTable],
        db_version: u64,
        generation: u64,
    ) -> Result<(), DbError> {
        let data_dir = self.generation_dir(generation);
        fs::create_dir_all(&data_dir)
            .map_err(|e| classify_io_error(e, "Failed to create data directory"))?;

        let mut entries = BTreeMap::new();
        for table in encoded {
            write_atomically(&data_dir.join(format!("{}.json", table.name)), &table.bytes)?;
            entries.insert(
                table.name.to_string(),
                TableEntry {
                    checksum: checksum(&table.bytes),
                    rows: table.rows,
                },
            );
        }

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            db_version,
            generation,
            tables: entries,
        };
        let manifest_json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| DbError::SerializationError(e.to_string()))?;
        write_atomically(&self.data_dir.join(MANIFEST_FILE), &manifest_json)
    }

    /// Reads the committed manifest, if any.
    fn read_manifest(&self) -> Result<Option<Manifest>, DbError> {
        let manifest_path = self.data_dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Ok(None);
        }

        let contents = fs::read(&manifest_path)
            .map_err(|e| classify_io_error(e, "Failed to read manifest"))?;
        let manifest: Manifest = serde_json::from_slice(&contents)
            .map_err(|e| DbError::SerializationError(format!("Failed to parse manifest: {}", e)))?;

        if manifest.version != MANIFEST_VERSION {
            return Err(DbError::SerializationError(format!(
                "Unsupported manifest version: {}",
                manifest.version
            )));
        }
        Ok(Some(manifest))
    }

    fn committed_generation(&self) -> Result<u64, DbError> {
        Ok(self.read_manifest()?.map_or(0, |m| m.generation))
    }

    /// Deletes generation directories other than `current`.
    ///
    /// Failures only leave disk space behind, so they are logged.
    fn remove_stale_generations(&self, current: u64) {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to list {}: {}", self.data_dir.display(), e);
                return;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let stale = name
                .to_str()
                .and_then(|n| n.strip_prefix(GENERATION_PREFIX))
                .and_then(|g| g.parse::<u64>().ok())
                .is_some_and(|g| g != current);
            if stale {
                if let Err(e) = fs::remove_dir_all(entry.path()) {
                    tracing::warn!("Failed to remove {}: {}", entry.path().display(), e);
                }
            }
        }
    }

    /// Loads the last saved snapshot.
    ///
    /// Returns empty tables if nothing was saved yet.
    pub fn load(&self) -> Result<Tables, DbError> {
        let Some(manifest) = self.read_manifest()? else {
            tracing::info!("No snapshot in {}, starting empty", self.data_dir.display());
            return Ok(Tables::default());
        };

        let tables = Tables {
            users: self.load_table(&manifest, "users")?,
            assets: self.load_table(&manifest, "assets")?,
            products: self.load_table(&manifest, "products")?,
            projects: self.load_table(&manifest, "projects")?,
            product_users: self.load_table(&manifest, "product_users")?,
            project_users: self.load_table(&manifest, "project_users")?,
            project_viewers: self.load_table(&manifest, "project_viewers")?,
            privileges: self.load_table(&manifest, "privileges")?,
        };
        tracing::info!(
            "Loaded snapshot: {} users, {} products, {} projects",
            tables.users.len(),
            tables.products.len(),
            tables.projects.len()
        );
        Ok(tables)
    }

    fn load_table<T: DeserializeOwned>(&self, manifest: &Manifest, name: &str) -> Result<T, DbError> {
        let entry = manifest.tables.get(name).ok_or_else(|| {
            DbError::DataCorruption(format!("Manifest has no entry for table '{}'", name))
        })?;

        let path = self
            .generation_dir(manifest.generation)
            .join(format!("{}.json", name));
        let data = fs::read(&path)
            .map_err(|e| classify_io_error(e, &format!("Failed to read table '{}'", name)))?;

        let actual = checksum(&data);
        if actual != entry.checksum {
            return Err(DbError::DataCorruption(format!(
                "Checksum mismatch for table '{}': expected {:08x}, got {:08x}",
                name, entry.checksum, actual
            )));
        }

        serde_json::from_slice(&data)
            .map_err(|e| DbError::SerializationError(format!("Failed to parse table '{}': {}", name, e)))
    }

    /// Saves a snapshot if the database changed since the last flush.
    ///
    /// Returns whether a snapshot was written.
    pub fn flush_if_changed(&self, db: &Database) -> Result<bool, DbError> {
        let version = db.version();
        if version == self.flushed_version.load(Ordering::Acquire) {
            return Ok(false);
        }

        let tables = db.snapshot();
        self.save_at(&tables, version)?;
        self.flushed_version.store(version, Ordering::Release);
        tracing::debug!("Flushed snapshot at version {}", version);
        Ok(true)
    }
}

fn checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn encode<T: Serialize + ?Sized>(
    name: &'static str,
    value: &T,
    rows: usize,
) -> Result<EncodedTable, DbError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| DbError::SerializationError(format!("Failed to encode table '{}': {}", name, e)))?;
    Ok(EncodedTable { name, bytes, rows })
}

fn encode_tables(tables: &Tables) -> Result<Vec<EncodedTable>, DbError> {
    Ok(vec![
        encode("users", &tables.users, tables.users.len())?,
        encode("assets", &tables.assets, tables.assets.len())?,
        encode("products", &tables.products, tables.products.len())?,
        encode("projects", &tables.projects, tables.projects.len())?,
        encode("product_users", &tables.product_users, tables.product_users.len())?,
        encode("project_users", &tables.project_users, tables.project_users.len())?,
        encode("project_viewers", &tables.project_viewers, tables.project_viewers.len())?,
        encode("privileges", &tables.privileges, tables.privileges.iter().count())?,
    ])
}
