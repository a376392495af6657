use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use rayon::prelude::*;
use crate::core::types::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeEntry {
    pub target: AccountId,
    pub ts: u32,
}

pub type LikeList = Arc<Vec<LikeEntry>>;

/// Liker → liked targets, sorted descending by target.
/// Repeated likes of the same target are kept; their timestamps are averaged by suggest.
pub struct LikerIndex {
    lists: RwLock<HashMap<AccountId, LikeList>>,
}

impl LikerIndex {
    pub fn new() -> Self {
        LikerIndex {
            lists: RwLock::new(HashMap::new()),
        }
    }

    pub fn add(&self, liker: AccountId, target: AccountId, ts: u32) {
        let mut lists = self.lists.write();
        let list = Arc::make_mut(lists.entry(liker).or_default());
        let pos = list.partition_point(|entry| entry.target >= target);
        list.insert(pos, LikeEntry { target, ts });
    }

    pub fn append(&self, liker: AccountId, target: AccountId, ts: u32) {
        let mut lists = self.lists.write();
        Arc::make_mut(lists.entry(liker).or_default()).push(LikeEntry { target, ts });
    }

    pub fn find(&self, liker: AccountId) -> LikeList {
        self.lists.read().get(&liker).cloned().unwrap_or_default()
    }

    pub fn likes(&self, liker: AccountId, target: AccountId) -> bool {
        self.lists.read().get(&liker).map_or(false, |list| {
            list.binary_search_by(|entry| target.cmp(&entry.target)).is_ok()
        })
    }

    pub fn liker_count(&self) -> usize {
        self.lists.read().len()
    }

    pub fn like_count(&self) -> usize {
        self.lists.read().values().map(|list| list.len()).sum()
    }

    pub fn update_all(&self) {
        self.lists.write().par_iter_mut().for_each(|(_, list)| {
            if list.windows(2).any(|pair| pair[0].target < pair[1].target) {
                Arc::make_mut(list).sort_by(|a, b| b.target.cmp(&a.target));
            }
        });
    }
}

impl Default for LikerIndex {
    fn default() -> Self {
        LikerIndex::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_target_order_and_duplicates() {
        let index = LikerIndex::new();
        index.add(1, 5, 100);
        index.add(1, 9, 200);
        index.add(1, 5, 300);
        index.add(1, 2, 400);

        let targets: Vec<_> = index.find(1).iter().map(|e| (e.target, e.ts)).collect();
        assert_eq!(targets, vec![(9, 200), (5, 100), (5, 300), (2, 400)]);
        assert!(index.likes(1, 5));
        assert!(!index.likes(1, 6));
        assert!(index.find(2).is_empty());
    }

    #[test]
    fn bulk_sort_is_stable() {
        let index = LikerIndex::new();
        index.append(1, 3, 1);
        index.append(1, 8, 2);
        index.append(1, 3, 3);
        index.update_all();

        let targets: Vec<_> = index.find(1).iter().map(|e| (e.target, e.ts)).collect();
        assert_eq!(targets, vec![(8, 2), (3, 1), (3, 3)]);
        assert_eq!(index.like_count(), 3);
    }
}
