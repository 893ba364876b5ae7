//! Ordered record table indexed by id.

use std::collections::{BTreeMap, HashMap};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// A row that can be stored in a [`Table`].
pub trait Record: Clone {
    /// Primary key of the row.
    fn key(&self) -> Uuid;
}

/// Table of records kept in insertion order with O(log n) id lookup.
///
/// Serializes as a JSON array in insertion order.
#[derive(Debug, Clone)]
pub struct Table<T> {
    /// Rows keyed by insertion sequence number
    rows: BTreeMap<u64, T>,
    /// Primary key to sequence number
    index: HashMap<Uuid, u64>,
    /// Next sequence number to assign
    next_seq: u64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            index: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<T: Record> Table<T> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record. A record with the same key is replaced in place
    /// and returned.
    pub fn insert(&mut self, record: T) -> Option<T> {
        let key = record.key();
        if let Some(seq) = self.index.get(&key) {
            return self.rows.insert(*seq, record);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(key, seq);
        self.rows.insert(seq, record);
        None
    }

    pub fn get(&self, id: &Uuid) -> Option<&T> {
        self.index.get(id).and_then(|seq| self.rows.get(seq))
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut T> {
        match self.index.get(id) {
            Some(seq) => self.rows.get_mut(seq),
            None => None,
        }
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.index.contains_key(id)
    }

    /// Removes a record by id.
    pub fn remove(&mut self, id: &Uuid) -> Option<T> {
        let seq = self.index.remove(id)?;
        self.rows.remove(&seq)
    }

    /// Iterates records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    /// Returns the first record matching the predicate.
    pub fn find<P>(&self, mut predicate: P) -> Option<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.rows.values().find(|record| predicate(record))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T: Serialize> Serialize for Table<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows.values())
    }
}

impl<'de, T> Deserialize<'de> for Table<T>
where
    T: Deserialize<'de> + Record,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<T>::deserialize(deserializer)?;
        let mut table = Table::new();
        for record in records {
            let key = record.key();
            if table.insert(record).is_some() {
                return Err(D::Error::custom(format!("duplicate record id {}", key)));
            }
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: Uuid,
        value: u32,
    }

    impl Record for Row {
        fn key(&self) -> Uuid {
            self.id
        }
    }

    fn row(value: u32) -> Row {
        Row {
            id: Uuid::new_v4(),
            value,
        }
    }

    #[test]
    fn test_insertion_order_survives_removal() {
        let mut table = Table::new();
        let rows: Vec<Row> = (0..5).map(row).collect();
        for r in &rows {
            table.insert(r.clone());
        }

        table.remove(&rows[1].id);
        table.remove(&rows[3].id);

        let values: Vec<u32> = table.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![0, 2, 4]);
        assert_eq!(table.len(), 3);
        assert!(!table.contains(&rows[1].id));
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut table = Table::new();
        let first = row(1);
        let second = row(2);
        table.insert(first.clone());
        table.insert(second.clone());

        let replaced = table.insert(Row {
            id: first.id,
            value: 10,
        });

        assert_eq!(replaced, Some(first.clone()));
        let values: Vec<u32> = table.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![10, 2]);
    }

    #[test]
    fn test_serde_preserves_order() {
        let mut table = Table::new();
        for value in [3, 1, 2] {
            table.insert(row(value));
        }

        let json = serde_json::to_string(&table).unwrap();
        let restored: Table<Row> = serde_json::from_str(&json).unwrap();

        let values: Vec<u32> = restored.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![3, 1, 2]);
    }

    #[test]
    fn test_deserialize_rejects_duplicate_ids() {
        let duplicate = row(1);
        let json = serde_json::to_string(&vec![duplicate.clone(), duplicate]).unwrap();
        let result: Result<Table<Row>, _> = serde_json::from_str(&json);
        assert!(result.is_err());
    }
}
