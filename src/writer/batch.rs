use std::collections::HashSet;
use serde::Serialize;
use crate::core::types::{Account, AccountId, NameId, Status};
use crate::index::group_hash::GroupHash;
use crate::index::tier::TierSlot;

/// Premium state keys of the premium index.
pub const PREMIUM_NONE: u8 = 0;
pub const PREMIUM_INACTIVE: u8 = 1;
pub const PREMIUM_ACTIVE: u8 = 2;

/// How a mutation batch reaches the indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// Unsorted appends, a later `finish_load` sorts once.
    Bulk,
    /// Applied on the calling thread before returning.
    Inline,
    /// Queued to the worker pool.
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Tier {
    Premium,
    Single,
    Complicated,
    Relationship,
}

impl Tier {
    fn of_status(status: Status) -> Tier {
        match status {
            Status::Single => Tier::Single,
            Status::Complicated => Tier::Complicated,
            Status::Relationship => Tier::Relationship,
        }
    }
}

/// One posting an account holds in some index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IndexKey {
    Id,
    Sex(u8),
    Status(u8),
    StatusSex(u8, u8),
    BirthYear(u16),
    JoinYear(u16),
    FirstName(NameId),
    Country(NameId),
    City(NameId),
    PhoneCode(u16),
    Interest(NameId),
    Premium(u8),
    Tier(Tier, TierSlot),
}

/// Aggregation contribution of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CubeKey {
    pub hash: GroupHash,
    pub interests: Vec<NameId>,
}

impl CubeKey {
    pub fn of_account(account: &Account) -> Self {
        let mut interests = account.interests.clone();
        interests.sort_unstable();
        CubeKey {
            hash: GroupHash::of_account(account),
            interests,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IndexOp {
    Insert { id: AccountId, key: IndexKey },
    Remove { id: AccountId, key: IndexKey },
    CubeAdd(CubeKey),
    CubeSub(CubeKey),
    Like { liker: AccountId, target: AccountId, ts: u32 },
}

/// Every index mutation caused by one request, applied by one worker in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexBatch {
    pub ops: Vec<IndexOp>,
}

/// Postings an account holds given the current time.
pub fn index_keys(account: &Account, now: u32) -> Vec<IndexKey> {
    let sex = account.sex.code();
    let status = account.status.code();

    let mut keys = vec![
        IndexKey::Id,
        IndexKey::Sex(sex),
        IndexKey::Status(status),
        IndexKey::StatusSex(status, sex),
        IndexKey::BirthYear(account.birth_year),
        IndexKey::JoinYear(account.joined_year),
        IndexKey::FirstName(account.fname),
        IndexKey::Country(account.country),
        IndexKey::City(account.city),
        IndexKey::PhoneCode(account.phone_code),
    ];

    let premium = match account.premium {
        None => PREMIUM_NONE,
        Some(p) if p.is_active(now) => PREMIUM_ACTIVE,
        Some(_) => PREMIUM_INACTIVE,
    };
    keys.push(IndexKey::Premium(premium));

    // premium-now accounts are only candidates of the premium tier
    let tier = if premium == PREMIUM_ACTIVE {
        Tier::Premium
    } else {
        Tier::of_status(account.status)
    };

    for &interest in &account.interests {
        keys.push(IndexKey::Interest(interest));
        keys.push(IndexKey::Tier(
            tier,
            TierSlot {
                interest,
                city: account.city,
                country: account.country,
                status,
                sex,
            },
        ));
    }

    keys
}

impl IndexBatch {
    pub fn new() -> Self {
        IndexBatch::default()
    }

    /// Full membership of a freshly stored account.
    pub fn insert(account: &Account, now: u32) -> Self {
        let ops = index_keys(account, now)
            .into_iter()
            .map(|key| IndexOp::Insert { id: account.id, key })
            .chain(std::iter::once(IndexOp::CubeAdd(CubeKey::of_account(account))))
            .collect();
        IndexBatch { ops }
    }

    /// Moves between the postings of `old` and `new`: removals first, then insertions.
    pub fn update(old: &Account, new: &Account, now: u32) -> Self {
        let old_keys = index_keys(old, now);
        let new_keys = index_keys(new, now);
        let old_set: HashSet<IndexKey> = old_keys.iter().copied().collect();
        let new_set: HashSet<IndexKey> = new_keys.iter().copied().collect();

        let mut ops: Vec<IndexOp> = old_keys
            .into_iter()
            .filter(|key| !new_set.contains(key))
            .map(|key| IndexOp::Remove { id: old.id, key })
            .collect();
        ops.extend(
            new_keys
                .into_iter()
                .filter(|key| !old_set.contains(key))
                .map(|key| IndexOp::Insert { id: new.id, key }),
        );

        let old_cube = CubeKey::of_account(old);
        let new_cube = CubeKey::of_account(new);
        if old_cube != new_cube {
            ops.push(IndexOp::CubeSub(old_cube));
            ops.push(IndexOp::CubeAdd(new_cube));
        }

        IndexBatch { ops }
    }

    pub fn like(&mut self, liker: AccountId, target: AccountId, ts: u32) {
        self.ops.push(IndexOp::Like { liker, target, ts });
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Account whose postings this batch moves, used to pin it to one worker.
    pub fn account(&self) -> Option<AccountId> {
        self.ops.iter().find_map(|op| match op {
            IndexOp::Insert { id, .. } | IndexOp::Remove { id, .. } => Some(*id),
            IndexOp::Like { liker, .. } => Some(*liker),
            IndexOp::CubeAdd(_) | IndexOp::CubeSub(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}
