//! Write transactions.

use std::mem;
use std::sync::MutexGuard;

use crate::database::{Database, Tables};

/// RAII guard for a write transaction with auto-abort on drop.
///
/// Holds the writer lock and a private copy of the tables. If the
/// transaction is not explicitly committed, the staged copy is discarded
/// when the handle is dropped.
pub struct TransactionHandle<'a> {
    db: &'a Database,
    /// Private copy of the tables being modified
    staged: Tables,
    /// Whether the staged tables were published
    committed: bool,
    _guard: MutexGuard<'a, ()>,
}

impl<'a> TransactionHandle<'a> {
    pub(crate) fn new(db: &'a Database, guard: MutexGuard<'a, ()>, staged: Tables) -> Self {
        tracing::trace!("Transaction started at version {}", db.version());
        Self {
            db,
            staged,
            committed: false,
            _guard: guard,
        }
    }

    /// Returns the staged tables for reading.
    pub fn tables(&self) -> &Tables {
        &self.staged
    }

    /// Returns the staged tables for modification.
    pub fn tables_mut(&mut self) -> &mut Tables {
        &mut self.staged
    }

    /// Publishes the staged tables and returns the new database version.
    pub fn commit(mut self) -> u64 {
        self.committed = true;
        let version = self.db.publish(mem::take(&mut self.staged));
        tracing::trace!("Transaction committed at version {}", version);
        version
    }

    /// Discards the staged tables.
    pub fn abort(self) {
        // Drop does the work
    }

    /// Returns whether the transaction has been committed.
    pub fn is_committed(&self) -> bool {
        self.committed
    }
}

impl Drop for TransactionHandle<'_> {
    fn drop(&mut self) {
        if !self.committed {
            tracing::trace!("Transaction aborted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::models::{Asset, DataMap};

    #[test]
    fn test_drop_aborts() {
        let db = Database::new(DbConfig::default());
        {
            let mut tx = db.begin().unwrap();
            tx.tables_mut().assets.insert(Asset::new(DataMap::new()));
            assert!(!tx.is_committed());
        }
        assert!(db.snapshot().assets.is_empty());
        assert_eq!(db.version(), 0);

        // Writer lock was released
        let tx = db.begin().unwrap();
        tx.abort();
        assert_eq!(db.version(), 0);
    }

    #[test]
    fn test_staged_changes_visible_inside_transaction() {
        let db = Database::new(DbConfig::default());
        let asset = Asset::new(DataMap::new());
        let id = asset.id;

        let mut tx = db.begin().unwrap();
        tx.tables_mut().assets.insert(asset);
        assert!(tx.tables().assets.contains(&id));
        assert_eq!(tx.commit(), 1);
        assert!(db.snapshot().assets.contains(&id));
    }
}
