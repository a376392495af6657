use std::collections::HashSet;
use tracing::debug;
use crate::core::dict::DictKind;
use crate::core::error::{Error, Result};
use crate::core::store::{AccountTable, Store};
use crate::core::types::{Account, AccountId, NameId, Status};
use crate::index::posting::Postings;
use crate::index::tier::TierIndex;
use crate::query::iterators::{CursorIter, PostingCursor, Union};
use crate::query::types::RecommendQuery;

/// Packed score: status priority, then shared interests, then closeness in age.
pub fn compatibility(me: &Account, other: &Account) -> u64 {
    let shared = me.shared_interests(other) as u64;
    let age_gap = me.birth.abs_diff(other.birth).min(u32::MAX as u64);
    (other.status.recommend_priority() << 40) | (shared << 32) | (u32::MAX as u64 - age_gap)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Narrow {
    City(NameId),
    Country(NameId),
    None,
}

impl Narrow {
    fn find(self, tier: &TierIndex, interest: NameId) -> Postings {
        match self {
            Narrow::City(city) => tier.find_by_city(interest, city),
            Narrow::Country(country) => tier.find_by_country(interest, country),
            Narrow::None => tier.find(interest),
        }
    }
}

/// Accumulates ranked candidates one pool at a time.
struct Picks<'a> {
    me: &'a Account,
    table: &'a AccountTable,
    limit: usize,
    seen: HashSet<AccountId>,
    out: Vec<Account>,
}

impl<'a> Picks<'a> {
    fn is_full(&self) -> bool {
        self.out.len() >= self.limit
    }

    /// Score every candidate of the pool, then append the best ones in order.
    fn take_pool(&mut self, lists: Vec<Postings>) {
        if self.is_full() {
            return;
        }
        let cursor = Box::new(Union::new(
            lists.into_iter().map(|ids| PostingCursor::descending(ids).boxed()).collect(),
        ));

        let (me, table, seen) = (self.me, self.table, &self.seen);
        let mut scored: Vec<(u64, &'a Account)> = CursorIter::new(cursor)
            .filter(|&id| id != me.id && !seen.contains(&id))
            .filter_map(|id| table.accounts.get(&id))
            .filter(|pair| pair.sex != me.sex && me.shared_interests(pair) > 0)
            .map(|pair| (compatibility(me, pair), pair))
            .collect();
        // stable: equal scores keep descending id order
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let room = self.limit - self.out.len();
        for (_, pair) in scored.into_iter().take(room) {
            self.seen.insert(pair.id);
            self.out.push(pair.clone());
        }
    }
}

impl Store {
    /// Up to `limit` opposite-sex accounts sharing an interest with `id`.
    pub fn recommend(&self, id: AccountId, query: &RecommendQuery) -> Result<Vec<Account>> {
        let me = self.get(id).ok_or_else(|| Error::not_found(format!("account {}", id)))?;
        let dict = self.dictionary();

        let narrow = match (&query.city, &query.country) {
            (Some(city), _) => match dict.lookup(DictKind::City, city) {
                Some(city) => Narrow::City(city),
                None => return Ok(Vec::new()),
            },
            (None, Some(country)) => match dict.lookup(DictKind::Country, country) {
                Some(country) => Narrow::Country(country),
                None => return Ok(Vec::new()),
            },
            (None, None) => Narrow::None,
        };
        if me.interests.is_empty() || query.limit == 0 {
            return Ok(Vec::new());
        }

        let catalog = self.catalog();
        let table = self.table();
        let mut picks = Picks {
            me: &me,
            table: &table,
            limit: query.limit,
            seen: HashSet::new(),
            out: Vec::with_capacity(query.limit),
        };
        let per_interest = |f: &dyn Fn(NameId) -> Postings| -> Vec<Postings> {
            me.interests.iter().map(|&interest| f(interest)).collect()
        };

        match narrow {
            Narrow::None => {
                let sex = me.sex.opposite().code();
                for status in [Status::Single, Status::Complicated, Status::Relationship] {
                    picks.take_pool(per_interest(&|interest: NameId| {
                        catalog.premium_tier.find_by_status_sex(interest, status.code(), sex)
                    }));
                }
            }
            narrow => {
                picks.take_pool(per_interest(&|interest: NameId| {
                    narrow.find(&catalog.premium_tier, interest)
                }));
            }
        }

        for tier in [&catalog.single, &catalog.complicated, &catalog.relationship] {
            picks.take_pool(per_interest(&|interest: NameId| narrow.find(tier, interest)));
        }

        debug!(id, found = picks.out.len(), ?narrow, "recommend");
        Ok(picks.out)
    }
}
