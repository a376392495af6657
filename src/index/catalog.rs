use std::sync::Arc;
use serde::Serialize;
use tracing::info;
use crate::core::config::Config;
use crate::core::dict::Dictionary;
use crate::core::error::Result;
use crate::core::types::{AccountId, NameId};
use crate::index::attribute::{AttributeIndex, IdIndex};
use crate::index::cube::AggregationCube;
use crate::index::likes::LikerIndex;
use crate::index::tier::TierIndex;
use crate::writer::batch::{IndexBatch, IndexKey, IndexMode, IndexOp, Tier};
use crate::writer::worker::IndexWorker;

/// Every per-attribute structure of the store. Each one locks independently.
pub struct Catalog {
    pub ids: IdIndex,
    pub sex: AttributeIndex<u8>,
    pub status: AttributeIndex<u8>,
    pub status_sex: AttributeIndex<(u8, u8)>,
    pub birth_year: AttributeIndex<u16>,
    pub join_year: AttributeIndex<u16>,
    pub first_name: AttributeIndex<NameId>,
    pub country: AttributeIndex<NameId>,
    pub city: AttributeIndex<NameId>,
    pub phone_code: AttributeIndex<u16>,
    pub interest: AttributeIndex<NameId>,
    pub premium: AttributeIndex<u8>,
    pub premium_tier: TierIndex,
    pub single: TierIndex,
    pub complicated: TierIndex,
    pub relationship: TierIndex,
    pub liker: LikerIndex,
    /// target → accounts that liked it
    pub likee: AttributeIndex<AccountId>,
    pub cube: AggregationCube,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub accounts: usize,
    pub cities: usize,
    pub countries: usize,
    pub first_names: usize,
    pub phone_codes: usize,
    pub interests: usize,
    pub premium_tier: usize,
    pub single_tier: usize,
    pub complicated_tier: usize,
    pub relationship_tier: usize,
    pub likers: usize,
    pub likes: usize,
    pub cube_pairs: usize,
    pub cube_buckets: usize,
    pub pending_batches: usize,
}

impl Catalog {
    pub fn new(dict: Arc<dyn Dictionary>) -> Self {
        Catalog {
            ids: IdIndex::new(),
            sex: AttributeIndex::new("sex"),
            status: AttributeIndex::new("status"),
            status_sex: AttributeIndex::new("status_sex"),
            birth_year: AttributeIndex::new("birth_year"),
            join_year: AttributeIndex::new("join_year"),
            first_name: AttributeIndex::new("fname"),
            country: AttributeIndex::new("country"),
            city: AttributeIndex::new("city"),
            phone_code: AttributeIndex::new("phone_code"),
            interest: AttributeIndex::new("interest"),
            premium: AttributeIndex::new("premium"),
            premium_tier: TierIndex::with_status_sex(),
            single: TierIndex::new(),
            complicated: TierIndex::new(),
            relationship: TierIndex::new(),
            liker: LikerIndex::new(),
            likee: AttributeIndex::new("likee"),
            cube: AggregationCube::new(dict),
        }
    }

    pub fn tier(&self, tier: Tier) -> &TierIndex {
        match tier {
            Tier::Premium => &self.premium_tier,
            Tier::Single => &self.single,
            Tier::Complicated => &self.complicated,
            Tier::Relationship => &self.relationship,
        }
    }

    fn insert(&self, id: AccountId, key: IndexKey, bulk: bool) {
        match key {
            IndexKey::Id if bulk => self.ids.append(id),
            IndexKey::Id => self.ids.add(id),
            IndexKey::Tier(tier, slot) if bulk => self.tier(tier).append(slot, id),
            IndexKey::Tier(tier, slot) => self.tier(tier).add(slot, id),
            IndexKey::Sex(v) => put(&self.sex, v, id, bulk),
            IndexKey::Status(v) => put(&self.status, v, id, bulk),
            IndexKey::StatusSex(status, sex) => put(&self.status_sex, (status, sex), id, bulk),
            IndexKey::BirthYear(v) => put(&self.birth_year, v, id, bulk),
            IndexKey::JoinYear(v) => put(&self.join_year, v, id, bulk),
            IndexKey::FirstName(v) => put(&self.first_name, v, id, bulk),
            IndexKey::Country(v) => put(&self.country, v, id, bulk),
            IndexKey::City(v) => put(&self.city, v, id, bulk),
            IndexKey::PhoneCode(v) => put(&self.phone_code, v, id, bulk),
            IndexKey::Interest(v) => put(&self.interest, v, id, bulk),
            IndexKey::Premium(v) => put(&self.premium, v, id, bulk),
        }
    }

    fn remove(&self, id: AccountId, key: IndexKey) {
        match key {
            IndexKey::Id => self.ids.remove(id),
            IndexKey::Tier(tier, slot) => self.tier(tier).remove(slot, id),
            IndexKey::Sex(v) => self.sex.remove(v, id),
            IndexKey::Status(v) => self.status.remove(v, id),
            IndexKey::StatusSex(status, sex) => self.status_sex.remove((status, sex), id),
            IndexKey::BirthYear(v) => self.birth_year.remove(v, id),
            IndexKey::JoinYear(v) => self.join_year.remove(v, id),
            IndexKey::FirstName(v) => self.first_name.remove(v, id),
            IndexKey::Country(v) => self.country.remove(v, id),
            IndexKey::City(v) => self.city.remove(v, id),
            IndexKey::PhoneCode(v) => self.phone_code.remove(v, id),
            IndexKey::Interest(v) => self.interest.remove(v, id),
            IndexKey::Premium(v) => self.premium.remove(v, id),
        }
    }

    pub fn apply(&self, op: &IndexOp, bulk: bool) {
        match op {
            IndexOp::Insert { id, key } => self.insert(*id, *key, bulk),
            IndexOp::Remove { id, key } => self.remove(*id, *key),
            IndexOp::CubeAdd(key) if bulk => self.cube.append(key.hash, &key.interests),
            IndexOp::CubeAdd(key) => self.cube.add(key.hash, &key.interests),
            IndexOp::CubeSub(key) => self.cube.sub(key.hash, &key.interests),
            IndexOp::Like { liker, target, ts } => {
                if bulk {
                    self.liker.append(*liker, *target, *ts);
                    self.likee.append(*target, *liker);
                } else {
                    self.liker.add(*liker, *target, *ts);
                    self.likee.add(*target, *liker);
                }
            }
        }
    }

    pub fn apply_batch(&self, batch: &IndexBatch, bulk: bool) {
        for op in &batch.ops {
            self.apply(op, bulk);
        }
    }

    /// Restore sort order everywhere after a bulk load.
    pub fn update_all(&self) {
        rayon::scope(|s| {
            s.spawn(|_| self.ids.update_all());
            s.spawn(|_| self.sex.update_all());
            s.spawn(|_| self.status.update_all());
            s.spawn(|_| self.status_sex.update_all());
            s.spawn(|_| self.birth_year.update_all());
            s.spawn(|_| self.join_year.update_all());
            s.spawn(|_| self.first_name.update_all());
            s.spawn(|_| self.country.update_all());
            s.spawn(|_| self.city.update_all());
            s.spawn(|_| self.phone_code.update_all());
            s.spawn(|_| self.interest.update_all());
            s.spawn(|_| self.premium.update_all());
            s.spawn(|_| self.premium_tier.update_all());
            s.spawn(|_| self.single.update_all());
            s.spawn(|_| self.complicated.update_all());
            s.spawn(|_| self.relationship.update_all());
            s.spawn(|_| self.liker.update_all());
            s.spawn(|_| self.likee.update_all());
            s.spawn(|_| self.cube.update_all());
        });
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            accounts: self.ids.len(),
            cities: self.city.key_count(),
            countries: self.country.key_count(),
            first_names: self.first_name.key_count(),
            phone_codes: self.phone_code.key_count(),
            interests: self.interest.key_count(),
            premium_tier: self.premium_tier.len(),
            single_tier: self.single.len(),
            complicated_tier: self.complicated.len(),
            relationship_tier: self.relationship.len(),
            likers: self.liker.liker_count(),
            likes: self.liker.like_count(),
            cube_pairs: self.cube.pair_count(),
            cube_buckets: self.cube.bucket_count(),
            pending_batches: 0,
        }
    }

    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            accounts = stats.accounts,
            cities = stats.cities,
            countries = stats.countries,
            interests = stats.interests,
            likes = stats.likes,
            cube_buckets = stats.cube_buckets,
            "index ready"
        );
    }
}

/// Composition root: the catalog plus the worker pool that mutates it.
pub struct Index {
    catalog: Arc<Catalog>,
    worker: IndexWorker,
}

impl Index {
    pub fn new(dict: Arc<dyn Dictionary>, config: &Config) -> Result<Self> {
        let catalog = Arc::new(Catalog::new(dict));
        let worker = IndexWorker::spawn(Arc::clone(&catalog), config.index_workers, config.queue_capacity)?;
        Ok(Index { catalog, worker })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn submit(&self, batch: IndexBatch, mode: IndexMode) {
        match mode {
            IndexMode::Bulk => self.catalog.apply_batch(&batch, true),
            IndexMode::Inline => self.catalog.apply_batch(&batch, false),
            IndexMode::Deferred => {
                if let Err((_, batch)) = self.worker.submit(batch) {
                    self.catalog.apply_batch(&batch, false);
                }
            }
        }
    }

    pub fn wait_idle(&self) {
        self.worker.wait_idle();
    }

    pub fn update_all(&self) {
        self.catalog.update_all();
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            pending_batches: self.worker.pending(),
            ..self.catalog.stats()
        }
    }
}

fn put<K>(index: &AttributeIndex<K>, key: K, id: AccountId, bulk: bool)
where
    K: Eq + std::hash::Hash + Copy + Send + Sync,
{
    if bulk {
        index.append(key, id);
    } else {
        index.add(key, id);
    }
}
