use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::warn;
use crate::core::dict::{DictKind, Dictionary};
use crate::core::types::NameId;
use crate::index::group_hash::{GroupHash, BIRTH, CITY, COUNTRY, INTEREST, JOINED, SEX, STATUS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeEntry {
    /// Account hash masked by the group mask.
    pub hash: GroupHash,
    pub count: u32,
}

/// Ascending row order: count, then city name, country name, interest name,
/// status, sex. Only fields named by `group_mask` take part.
pub fn compare_entries(
    group_mask: u64,
    a: &CubeEntry,
    b: &CubeEntry,
    dict: &dyn Dictionary,
) -> Ordering {
    a.count
        .cmp(&b.count)
        .then_with(|| {
            if group_mask & CITY == 0 {
                return Ordering::Equal;
            }
            dict.compare(DictKind::City, a.hash.city(), b.hash.city())
        })
        .then_with(|| {
            if group_mask & COUNTRY == 0 {
                return Ordering::Equal;
            }
            dict.compare(DictKind::Country, a.hash.country(), b.hash.country())
        })
        .then_with(|| {
            if group_mask & INTEREST == 0 {
                return Ordering::Equal;
            }
            dict.compare(DictKind::Interest, a.hash.interest(), b.hash.interest())
        })
        .then_with(|| {
            if group_mask & STATUS == 0 {
                return Ordering::Equal;
            }
            a.hash.status().cmp(&b.hash.status())
        })
        .then_with(|| {
            if group_mask & SEX == 0 {
                return Ordering::Equal;
            }
            a.hash.sex().cmp(&b.hash.sex())
        })
}

/// Counts for one (filter mask, group mask, filter value), kept in ascending row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    group_mask: u64,
    entries: Vec<CubeEntry>,
}

impl Bucket {
    pub fn new(group_mask: u64) -> Self {
        Bucket {
            group_mask,
            entries: Vec::new(),
        }
    }

    /// Build a sorted bucket from counts gathered by a live scan.
    pub fn from_counts(
        group_mask: u64,
        counts: HashMap<GroupHash, u32>,
        dict: &dyn Dictionary,
    ) -> Self {
        let mut bucket = Bucket {
            group_mask,
            entries: counts
                .into_iter()
                .map(|(hash, count)| CubeEntry { hash, count })
                .collect(),
        };
        bucket.sort(dict);
        bucket
    }

    fn position(&self, hash: GroupHash) -> Option<usize> {
        self.entries.iter().position(|entry| entry.hash == hash)
    }

    /// Increment `hash` (any bits outside the group mask are dropped) and
    /// bubble it forward to its sorted place.
    pub fn add(&mut self, hash: GroupHash, dict: &dyn Dictionary) {
        let hash = hash.masked(self.group_mask);
        let mut i = match self.position(hash) {
            Some(pos) => {
                self.entries[pos].count += 1;
                pos
            }
            None => {
                self.entries.insert(0, CubeEntry { hash, count: 1 });
                0
            }
        };

        while i + 1 < self.entries.len()
            && compare_entries(self.group_mask, &self.entries[i], &self.entries[i + 1], dict)
                == Ordering::Greater
        {
            self.entries.swap(i, i + 1);
            i += 1;
        }
    }

    /// Bulk-load path, no ordering work until `sort`.
    pub fn append(&mut self, hash: GroupHash) {
        let hash = hash.masked(self.group_mask);
        match self.position(hash) {
            Some(pos) => self.entries[pos].count += 1,
            None => self.entries.push(CubeEntry { hash, count: 1 }),
        }
    }

    /// Decrement `hash`; a zero count removes the entry.
    /// Returns false, changing nothing, if `hash` has no entry.
    pub fn sub(&mut self, hash: GroupHash, dict: &dyn Dictionary) -> bool {
        let hash = hash.masked(self.group_mask);
        let Some(mut i) = self.position(hash) else {
            return false;
        };

        self.entries[i].count -= 1;
        if self.entries[i].count == 0 {
            self.entries.remove(i);
            return true;
        }

        while i > 0
            && compare_entries(self.group_mask, &self.entries[i], &self.entries[i - 1], dict)
                == Ordering::Less
        {
            self.entries.swap(i, i - 1);
            i -= 1;
        }
        true
    }

    pub fn sort(&mut self, dict: &dyn Dictionary) {
        let mask = self.group_mask;
        self.entries.sort_by(|a, b| compare_entries(mask, a, b, dict));
    }

    pub fn entries(&self) -> &[CubeEntry] {
        &self.entries
    }

    pub fn group_mask(&self) -> u64 {
        self.group_mask
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<CubeEntry> {
        self.entries
    }
}

/// Every (filter mask, group mask) pair the cube precomputes.
pub fn curated_pairs() -> Vec<(u64, u64)> {
    let common = [CITY, COUNTRY, CITY | SEX, CITY | STATUS, COUNTRY | SEX, COUNTRY | STATUS];
    let all = [
        SEX,
        STATUS,
        CITY,
        COUNTRY,
        INTEREST,
        CITY | SEX,
        CITY | STATUS,
        COUNTRY | SEX,
        COUNTRY | STATUS,
    ];
    let narrow = [SEX, STATUS, INTEREST];

    let mut pairs = Vec::new();
    for filter in [0, JOINED, BIRTH] {
        pairs.extend(all.iter().map(|&group| (filter, group)));
    }
    for filter in [
        SEX,
        STATUS,
        INTEREST,
        JOINED | STATUS,
        JOINED | SEX,
        BIRTH | STATUS,
        BIRTH | SEX,
        INTEREST | JOINED,
        INTEREST | BIRTH,
    ] {
        pairs.extend(common.iter().map(|&group| (filter, group)));
    }
    for filter in [
        CITY,
        COUNTRY,
        COUNTRY | JOINED,
        COUNTRY | BIRTH,
        CITY | JOINED,
        CITY | BIRTH,
    ] {
        pairs.extend(narrow.iter().map(|&group| (filter, group)));
    }
    pairs
}

struct Slice {
    filter_mask: u64,
    group_mask: u64,
    fan_out: bool,
    buckets: RwLock<HashMap<GroupHash, Bucket>>,
}

impl Slice {
    /// Hashes an account contributes: one per interest when this slice
    /// involves interests, otherwise the interest-free hash.
    fn for_each_key(&self, hash: GroupHash, interests: &[NameId], mut f: impl FnMut(GroupHash)) {
        if self.fan_out {
            for &interest in interests {
                f(hash.with_interest(interest));
            }
        } else {
            f(hash.with_interest(0));
        }
    }
}

/// Precomputed group-by tables for the curated mask pairs.
/// Each pair has its own lock, so concurrent mutation batches only contend per pair.
pub struct AggregationCube {
    slices: Vec<Slice>,
    lookup: HashMap<(u64, u64), usize>,
    dict: Arc<dyn Dictionary>,
}

impl AggregationCube {
    pub fn new(dict: Arc<dyn Dictionary>) -> Self {
        let slices: Vec<Slice> = curated_pairs()
            .into_iter()
            .map(|(filter_mask, group_mask)| Slice {
                filter_mask,
                group_mask,
                fan_out: (filter_mask | group_mask) & INTEREST != 0,
                buckets: RwLock::new(HashMap::new()),
            })
            .collect();
        let lookup = slices
            .iter()
            .enumerate()
            .map(|(i, slice)| ((slice.filter_mask, slice.group_mask), i))
            .collect();

        AggregationCube { slices, lookup, dict }
    }

    pub fn add(&self, hash: GroupHash, interests: &[NameId]) {
        let dict = self.dict.as_ref();
        for slice in &self.slices {
            let mut buckets = slice.buckets.write();
            slice.for_each_key(hash, interests, |key| {
                buckets
                    .entry(key.masked(slice.filter_mask))
                    .or_insert_with(|| Bucket::new(slice.group_mask))
                    .add(key, dict);
            });
        }
    }

    pub fn append(&self, hash: GroupHash, interests: &[NameId]) {
        for slice in &self.slices {
            let mut buckets = slice.buckets.write();
            slice.for_each_key(hash, interests, |key| {
                buckets
                    .entry(key.masked(slice.filter_mask))
                    .or_insert_with(|| Bucket::new(slice.group_mask))
                    .append(key);
            });
        }
    }

    pub fn sub(&self, hash: GroupHash, interests: &[NameId]) {
        let dict = self.dict.as_ref();
        for slice in &self.slices {
            let mut buckets = slice.buckets.write();
            slice.for_each_key(hash, interests, |key| {
                let filter_value = key.masked(slice.filter_mask);
                let found = match buckets.get_mut(&filter_value) {
                    Some(bucket) => {
                        let found = bucket.sub(key, dict);
                        if bucket.is_empty() {
                            buckets.remove(&filter_value);
                        }
                        found
                    }
                    None => false,
                };
                if !found {
                    warn!(
                        filter_mask = slice.filter_mask,
                        group_mask = slice.group_mask,
                        hash = key.0,
                        "cube count missing on subtract"
                    );
                }
            });
        }
    }

    pub fn is_curated(&self, filter_mask: u64, group_mask: u64) -> bool {
        self.lookup.contains_key(&(filter_mask, group_mask))
    }

    /// Rows for a filter value in ascending order. `None` if the pair is not
    /// precomputed; an unseen filter value yields an empty list.
    pub fn query(
        &self,
        filter_mask: u64,
        group_mask: u64,
        filter_value: GroupHash,
    ) -> Option<Vec<CubeEntry>> {
        let &slot = self.lookup.get(&(filter_mask, group_mask))?;
        let buckets = self.slices[slot].buckets.read();
        Some(
            buckets
                .get(&filter_value.masked(filter_mask))
                .map(|bucket| bucket.entries().to_vec())
                .unwrap_or_default(),
        )
    }

    pub fn pair_count(&self) -> usize {
        self.slices.len()
    }

    pub fn bucket_count(&self) -> usize {
        self.slices.iter().map(|slice| slice.buckets.read().len()).sum()
    }

    /// Sort every bucket once after bulk load.
    pub fn update_all(&self) {
        let dict = self.dict.as_ref();
        self.slices.par_iter().for_each(|slice| {
            for bucket in slice.buckets.write().values_mut() {
                bucket.sort(dict);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dict::Dicts;

    fn dicts() -> Arc<Dicts> {
        let dicts = Arc::new(Dicts::new());
        for city in ["Москва", "Амстердам", "Берлин"] {
            dicts.intern(DictKind::City, city).unwrap();
        }
        dicts
    }

    fn city_hash(city: NameId) -> GroupHash {
        GroupHash::pack(b'm', 3, city, 0, 0, 2015, 1990)
    }

    #[test]
    fn ninety_nine_pairs() {
        let pairs = curated_pairs();
        assert_eq!(pairs.len(), 99);
        let mut dedup = pairs.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), 99);
    }

    #[test]
    fn bucket_orders_by_count_then_name() {
        let dicts = dicts();
        let mut bucket = Bucket::new(CITY);
        // Москва=1, Амстердам=2, Берлин=3
        bucket.add(city_hash(1), dicts.as_ref());
        bucket.add(city_hash(2), dicts.as_ref());
        bucket.add(city_hash(3), dicts.as_ref());
        bucket.add(city_hash(0), dicts.as_ref());
        let cities: Vec<_> = bucket.entries().iter().map(|e| e.hash.city()).collect();
        assert_eq!(cities, vec![0, 2, 3, 1]);

        bucket.add(city_hash(2), dicts.as_ref());
        let rows: Vec<_> = bucket.entries().iter().map(|e| (e.hash.city(), e.count)).collect();
        assert_eq!(rows, vec![(0, 1), (3, 1), (1, 1), (2, 2)]);
    }

    #[test]
    fn add_then_sub_restores_bucket() {
        let dicts = dicts();
        let mut bucket = Bucket::new(CITY);
        for city in [1, 1, 2, 3, 3, 3] {
            bucket.add(city_hash(city), dicts.as_ref());
        }
        for city in [0, 1, 2, 3] {
            let before = bucket.clone();
            bucket.add(city_hash(city), dicts.as_ref());
            bucket.sub(city_hash(city), dicts.as_ref());
            assert_eq!(bucket, before);
        }
    }

    #[test]
    fn sub_of_missing_entry_changes_nothing() {
        let dicts = dicts();
        let mut bucket = Bucket::new(CITY);
        bucket.add(city_hash(1), dicts.as_ref());
        let before = bucket.clone();

        assert!(!bucket.sub(city_hash(2), dicts.as_ref()));
        assert_eq!(bucket, before);
        assert!(bucket.sub(city_hash(1), dicts.as_ref()));
        assert!(bucket.is_empty());
    }

    #[test]
    fn append_then_sort_matches_incremental() {
        let dicts = dicts();
        let mut incremental = Bucket::new(CITY);
        let mut bulk = Bucket::new(CITY);
        for city in [3, 1, 2, 1, 0, 3, 3, 2] {
            incremental.add(city_hash(city), dicts.as_ref());
            bulk.append(city_hash(city));
        }
        bulk.sort(dicts.as_ref());
        assert_eq!(incremental, bulk);
    }

    #[test]
    fn cube_fans_out_interests() {
        let dicts = dicts();
        let cube = AggregationCube::new(dicts.clone());
        let hash = city_hash(1);
        cube.add(hash, &[5, 6]);
        cube.add(city_hash(2), &[]);

        let rows = cube.query(0, INTEREST, GroupHash(0)).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.count == 1));

        let rows = cube.query(0, CITY, GroupHash(0)).unwrap();
        assert_eq!(rows.iter().map(|r| r.count).sum::<u32>(), 2);

        cube.sub(hash, &[5, 6]);
        assert!(cube.query(0, INTEREST, GroupHash(0)).unwrap().is_empty());
        assert!(cube.query(SEX | STATUS, CITY, GroupHash(0)).is_none());
    }
}
