use std::collections::HashMap;
use serde::Serialize;
use tracing::debug;
use crate::core::dict::{DictKind, Dictionary};
use crate::core::store::Store;
use crate::core::types::{Sex, Status};
use crate::index::cube::{Bucket, CubeEntry};
use crate::index::group_hash::{GroupHash, CITY, COUNTRY, INTEREST, SEX, STATUS};
use crate::query::iterators::CursorIter;
use crate::query::planner::{open_sources, ResolvedGroup};
use crate::query::types::{GroupQuery, SortOrder};

/// One aggregated row; only grouped fields are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<String>,
    pub count: u32,
}

impl GroupRow {
    fn from_entry(group_mask: u64, entry: &CubeEntry, dict: &dyn Dictionary) -> Self {
        let hash = entry.hash;
        let name = |mask: u64, kind: DictKind, id| {
            if group_mask & mask == 0 {
                None
            } else {
                dict.resolve(kind, id)
            }
        };

        GroupRow {
            sex: (group_mask & SEX != 0).then(|| Sex::from_code(hash.sex())).flatten(),
            status: (group_mask & STATUS != 0).then(|| Status::from_code(hash.status())).flatten(),
            city: name(CITY, DictKind::City, hash.city()),
            country: name(COUNTRY, DictKind::Country, hash.country()),
            interests: name(INTEREST, DictKind::Interest, hash.interest()),
            count: entry.count,
        }
    }
}

impl Store {
    pub fn group(&self, query: &GroupQuery) -> Vec<GroupRow> {
        let dict = self.dictionary();
        let Some(group) = ResolvedGroup::resolve(query, dict) else {
            debug!("group references an unknown name, empty result");
            return Vec::new();
        };

        let cached = if group.likes.is_none() {
            self.catalog()
                .cube
                .query(group.filter_mask, group.group_mask, group.filter_value)
        } else {
            None
        };

        let mut entries = match cached {
            Some(entries) => {
                debug!(filter_mask = group.filter_mask, group_mask = group.group_mask, "group from cube");
                entries
            }
            None => {
                debug!(filter_mask = group.filter_mask, group_mask = group.group_mask, "group by live scan");
                self.group_scan(&group)
            }
        };

        if group.order == SortOrder::Desc {
            entries.reverse();
        }
        entries
            .iter()
            .take(group.limit)
            .map(|entry| GroupRow::from_entry(group.group_mask, entry, dict))
            .collect()
    }

    /// Recount the matching accounts, in the same ascending order the cube keeps.
    fn group_scan(&self, group: &ResolvedGroup) -> Vec<CubeEntry> {
        let sources = group.sources();
        let cursor = open_sources(&sources, self.catalog());
        let fan_out = group.group_mask & INTEREST != 0;

        let mut counts: HashMap<GroupHash, u32> = HashMap::new();
        {
            let table = self.table();
            for id in CursorIter::new(cursor) {
                let Some(account) = table.accounts.get(&id) else {
                    continue;
                };
                if !group.matches(account) {
                    continue;
                }

                let hash = GroupHash::of_account(account);
                if !fan_out {
                    *counts.entry(hash.masked(group.group_mask)).or_insert(0) += 1;
                    continue;
                }
                match group.interest {
                    Some(interest) => {
                        *counts
                            .entry(hash.with_interest(interest).masked(group.group_mask))
                            .or_insert(0) += 1;
                    }
                    None => {
                        for &interest in &account.interests {
                            *counts
                                .entry(hash.with_interest(interest).masked(group.group_mask))
                                .or_insert(0) += 1;
                        }
                    }
                }
            }
        }

        Bucket::from_counts(group.group_mask, counts, self.dictionary()).into_entries()
    }
}
