use std::sync::Arc;
use crate::core::types::AccountId;

/// Shared, immutable view of a posting list taken under the owning index's lock.
pub type Postings = Arc<Vec<AccountId>>;

/// Account ids matching one attribute value.
/// Note: kept sorted descending; `append` leaves it unsorted until `sort`.
///
/// Storage is copy-on-write: a reader holding a `Postings` snapshot keeps
/// seeing the old list while a writer mutates a fresh copy.
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    ids: Postings,
}

impl PostingList {
    pub fn new() -> Self {
        PostingList {
            ids: Arc::new(Vec::new()),
        }
    }

    /// Sorted insert; returns false if the id was already present.
    pub fn insert(&mut self, id: AccountId) -> bool {
        match self.ids.binary_search_by(|probe| id.cmp(probe)) {
            Ok(_) => false,
            Err(pos) => {
                Arc::make_mut(&mut self.ids).insert(pos, id);
                true
            }
        }
    }

    /// Bulk-load fast path, order is restored by `sort`.
    pub fn append(&mut self, id: AccountId) {
        Arc::make_mut(&mut self.ids).push(id);
    }

    pub fn remove(&mut self, id: AccountId) -> bool {
        match self.ids.binary_search_by(|probe| id.cmp(probe)) {
            Ok(pos) => {
                Arc::make_mut(&mut self.ids).remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Restore descending order after appends and drop duplicates.
    pub fn sort(&mut self) {
        if self.is_sorted() {
            return;
        }
        let ids = Arc::make_mut(&mut self.ids);
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids.dedup();
    }

    pub fn is_sorted(&self) -> bool {
        self.ids.windows(2).all(|pair| pair[0] > pair[1])
    }

    pub fn contains(&self, id: AccountId) -> bool {
        self.ids.binary_search_by(|probe| id.cmp(probe)).is_ok()
    }

    pub fn snapshot(&self) -> Postings {
        Arc::clone(&self.ids)
    }

    pub fn as_slice(&self) -> &[AccountId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
