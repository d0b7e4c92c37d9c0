//! Per-stream identity tables.
//!
//! The write side maps object identity to a dense id; the read side maps ids
//! back to the handles built for them. A shared object is written in full
//! once and referenced by id afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use crate::util::{Error, Result};

/// Write-side table for one category.
///
/// Keyed by `Arc` address. The table holds a clone of every handle it has
/// seen so an address cannot be reused by another object while it is alive.
#[derive(Debug)]
pub struct WriteTable<T> {
    ids: HashMap<usize, i32>,
    pinned: Vec<Arc<T>>,
}

impl<T> Default for WriteTable<T> {
    fn default() -> Self {
        Self { ids: HashMap::new(), pinned: Vec::new() }
    }
}

impl<T> WriteTable<T> {
    /// Return the id for `obj` and whether it was just assigned.
    pub fn get_or_assign(&mut self, obj: &Arc<T>) -> (i32, bool) {
        let key = Arc::as_ptr(obj) as *const () as usize;
        if let Some(&id) = self.ids.get(&key) {
            return (id, false);
        }
        let id = self.pinned.len() as i32;
        self.ids.insert(key, id);
        self.pinned.push(Arc::clone(obj));
        (id, true)
    }
}

/// Read-side table for one category.
#[derive(Debug)]
pub struct ReadTable<T> {
    category: &'static str,
    objects: HashMap<i32, Arc<T>>,
    next_id: i32,
}

impl<T> ReadTable<T> {
    pub fn new(category: &'static str) -> Self {
        Self { category, objects: HashMap::new(), next_id: 0 }
    }

    /// Look up an id that was read before.
    pub fn get(&self, id: i32) -> Option<Arc<T>> {
        self.objects.get(&id).cloned()
    }

    /// Claim an unseen id before its body is read.
    ///
    /// Ids are handed out in traversal order, so a new id must be the next
    /// one; anything else means the stream is out of step.
    pub fn claim(&mut self, id: i32) -> Result<()> {
        if id != self.next_id {
            return Err(Error::InvalidId {
                category: self.category,
                id,
                expected: self.next_id,
            });
        }
        self.next_id += 1;
        Ok(())
    }

    /// Record the handle built for a claimed id.
    pub fn insert(&mut self, id: i32, obj: Arc<T>) {
        self.objects.insert(id, obj);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_table_dense_ids() {
        let mut table = WriteTable::default();
        let a = Arc::new(1u32);
        let b = Arc::new(1u32);
        assert_eq!(table.get_or_assign(&a), (0, true));
        assert_eq!(table.get_or_assign(&b), (1, true));
        assert_eq!(table.get_or_assign(&a.clone()), (0, false));
        assert_eq!(table.get_or_assign(&Arc::new(1u32)), (2, true));
    }

    #[test]
    fn test_write_table_pins_handles() {
        let mut table = WriteTable::default();
        let first = Arc::new(String::from("a"));
        table.get_or_assign(&first);
        drop(first);
        // The pinned clone keeps the address occupied.
        let second = Arc::new(String::from("b"));
        assert_eq!(table.get_or_assign(&second), (1, true));
    }

    #[test]
    fn test_read_table_order() {
        let mut table = ReadTable::new("Node");
        table.claim(0).unwrap();
        table.insert(0, Arc::new(5));
        assert_eq!(*table.get(0).unwrap(), 5);
        assert!(table.get(1).is_none());

        let err = table.claim(3).unwrap_err();
        assert!(matches!(err, Error::InvalidId { id: 3, expected: 1, .. }));
        table.claim(1).unwrap();
    }
}
