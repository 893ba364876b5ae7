//! The in-memory store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::config::DbConfig;
use crate::error::DbError;
use crate::models::{
    Asset, Privileges, Product, ProductUser, Project, ProjectUser, ProjectViewer, User,
};
use crate::table::Table;
use crate::transaction::TransactionHandle;

/// Every table of the store.
///
/// Keyed records live in ordered [`Table`]s; membership relations are
/// plain row lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tables {
    pub users: Table<User>,
    pub assets: Table<Asset>,
    pub products: Table<Product>,
    pub projects: Table<Project>,
    pub product_users: Vec<ProductUser>,
    pub project_users: Vec<ProjectUser>,
    pub project_viewers: Vec<ProjectViewer>,
    pub privileges: Privileges,
}

/// Main database struct.
///
/// Readers take a snapshot of the current tables without blocking.
/// Writers are serialised by a single writer lock and publish a new
/// version of the tables on commit.
#[derive(Debug)]
pub struct Database {
    /// Currently published tables
    tables: ArcSwap<Tables>,
    /// Serialises writers
    writer: Mutex<()>,
    /// Number of commits since startup
    version: AtomicU64,
    /// Database configuration
    config: DbConfig,
}

impl Database {
    /// Creates an empty database.
    pub fn new(config: DbConfig) -> Self {
        Self::with_tables(config, Tables::default())
    }

    /// Creates a database serving the given tables, e.g. a loaded snapshot.
    pub fn with_tables(config: DbConfig, tables: Tables) -> Self {
        Self {
            tables: ArcSwap::from_pointee(tables),
            writer: Mutex::new(()),
            version: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Returns the currently published tables.
    pub fn snapshot(&self) -> Arc<Tables> {
        self.tables.load_full()
    }

    /// Returns the number of commits published so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Begins a write transaction on a private copy of the current tables.
    ///
    /// Blocks while another transaction is open.
    pub fn begin(&self) -> Result<TransactionHandle<'_>, DbError> {
        let guard = self.writer.lock().map_err(|_| DbError::LockPoisoned)?;
        let staged = Tables::clone(&self.tables.load());
        Ok(TransactionHandle::new(self, guard, staged))
    }

    /// Runs `f` inside a transaction, committing only if it succeeds.
    pub fn write<T, F>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&mut Tables) -> Result<T, DbError>,
    {
        let mut tx = self.begin()?;
        let result = f(tx.tables_mut())?;
        tx.commit();
        Ok(result)
    }

    pub(crate) fn publish(&self, tables: Tables) -> u64 {
        self.tables.store(Arc::new(tables));
        self.version.fetch_add(1, Ordering::AcqRel) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataMap;

    #[test]
    fn test_commit_publishes_and_bumps_version() {
        let db = Database::new(DbConfig::default());
        assert_eq!(db.version(), 0);

        let before = db.snapshot();
        let asset = Asset::new(DataMap::new());
        let id = asset.id;

        let mut tx = db.begin().unwrap();
        tx.tables_mut().assets.insert(asset);
        assert!(!db.snapshot().assets.contains(&id));
        tx.commit();

        assert_eq!(db.version(), 1);
        assert!(db.snapshot().assets.contains(&id));
        // Old snapshots are unaffected
        assert!(!before.assets.contains(&id));
    }

    #[test]
    fn test_failed_write_leaves_no_trace() {
        let db = Database::new(DbConfig::default());

        let result: Result<(), DbError> = db.write(|tables| {
            tables.assets.insert(Asset::new(DataMap::new()));
            Err(DbError::UserNotFound)
        });

        assert_eq!(result, Err(DbError::UserNotFound));
        assert!(db.snapshot().assets.is_empty());
        assert_eq!(db.version(), 0);
    }
}
