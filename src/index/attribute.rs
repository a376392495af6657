use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::debug;
use crate::core::types::AccountId;
use crate::index::posting::{PostingList, Postings};
use crate::query::iterators::{BoxCursor, EmptyCursor, PostingCursor};

/// Value → posting list, guarded by a single lock.
/// Readers copy out an `Arc` snapshot and release the lock immediately.
pub struct AttributeIndex<K> {
    name: &'static str,
    lists: RwLock<HashMap<K, PostingList>>,
}

impl<K> AttributeIndex<K>
where
    K: Eq + Hash + Copy + Send + Sync,
{
    pub fn new(name: &'static str) -> Self {
        AttributeIndex {
            name,
            lists: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn add(&self, key: K, id: AccountId) {
        self.lists.write().entry(key).or_default().insert(id);
    }

    pub fn append(&self, key: K, id: AccountId) {
        self.lists.write().entry(key).or_default().append(id);
    }

    pub fn remove(&self, key: K, id: AccountId) {
        let mut lists = self.lists.write();
        if let Some(list) = lists.get_mut(&key) {
            list.remove(id);
            if list.is_empty() {
                lists.remove(&key);
            }
        }
    }

    /// Move `id` from one key to another; `None` on either side skips that half.
    pub fn replace(&self, from: Option<K>, to: Option<K>, id: AccountId) {
        if from == to {
            return;
        }
        if let Some(key) = from {
            self.remove(key, id);
        }
        if let Some(key) = to {
            self.add(key, id);
        }
    }

    /// Snapshot of the list for `key`; empty if the key was never seen.
    pub fn find(&self, key: K) -> Postings {
        self.lists
            .read()
            .get(&key)
            .map(PostingList::snapshot)
            .unwrap_or_else(|| Arc::new(Vec::new()))
    }

    pub fn cursor(&self, key: K) -> BoxCursor {
        match self.lists.read().get(&key) {
            Some(list) => PostingCursor::descending(list.snapshot()).boxed(),
            None => Box::new(EmptyCursor),
        }
    }

    pub fn len(&self, key: K) -> usize {
        self.lists.read().get(&key).map_or(0, PostingList::len)
    }

    pub fn contains(&self, key: K, id: AccountId) -> bool {
        self.lists.read().get(&key).map_or(false, |list| list.contains(id))
    }

    pub fn key_count(&self) -> usize {
        self.lists.read().len()
    }

    pub fn posting_count(&self) -> usize {
        self.lists.read().values().map(PostingList::len).sum()
    }

    /// One sort pass over every list after bulk load.
    pub fn update_all(&self) {
        let mut lists = self.lists.write();
        lists.par_iter_mut().for_each(|(_, list)| list.sort());
        debug!(index = self.name, keys = lists.len(), "sorted");
    }

    pub fn is_sorted(&self) -> bool {
        self.lists.read().values().all(PostingList::is_sorted)
    }
}

/// Every known account id, one list.
pub struct IdIndex {
    list: RwLock<PostingList>,
}

impl IdIndex {
    pub fn new() -> Self {
        IdIndex {
            list: RwLock::new(PostingList::new()),
        }
    }

    pub fn add(&self, id: AccountId) {
        self.list.write().insert(id);
    }

    pub fn append(&self, id: AccountId) {
        self.list.write().append(id);
    }

    pub fn remove(&self, id: AccountId) {
        self.list.write().remove(id);
    }

    pub fn find_all(&self) -> Postings {
        self.list.read().snapshot()
    }

    pub fn cursor(&self) -> BoxCursor {
        PostingCursor::descending(self.find_all()).boxed()
    }

    pub fn contains(&self, id: AccountId) -> bool {
        self.list.read().contains(id)
    }

    pub fn len(&self) -> usize {
        self.list.read().len()
    }

    pub fn update_all(&self) {
        self.list.write().sort();
    }
}

impl Default for IdIndex {
    fn default() -> Self {
        IdIndex::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::iterators::CursorIter;

    #[test]
    fn missing_key_is_empty() {
        let index: AttributeIndex<u32> = AttributeIndex::new("city");
        assert!(index.find(42).is_empty());
        assert_eq!(CursorIter::new(index.cursor(42)).count(), 0);
        assert_eq!(index.len(42), 0);
    }

    #[test]
    fn add_remove_replace() {
        let index: AttributeIndex<u8> = AttributeIndex::new("status");
        index.add(1, 10);
        index.add(1, 30);
        index.add(1, 20);
        assert_eq!(index.find(1).as_slice(), &[30, 20, 10]);

        index.replace(Some(1), Some(2), 20);
        assert_eq!(index.find(1).as_slice(), &[30, 10]);
        assert_eq!(index.find(2).as_slice(), &[20]);

        index.remove(2, 20);
        assert_eq!(index.key_count(), 1);
    }

    #[test]
    fn bulk_append_sorts_once() {
        let index: AttributeIndex<u16> = AttributeIndex::new("birth_year");
        for id in [3, 9, 1, 7] {
            index.append(1990, id);
        }
        index.append(1991, 2);
        assert!(!index.is_sorted());
        index.update_all();
        assert!(index.is_sorted());
        assert_eq!(index.find(1990).as_slice(), &[9, 7, 3, 1]);
        assert_eq!(index.posting_count(), 5);
    }
}
