use std::collections::HashSet;
use tracing::debug;
use crate::core::dict::DictKind;
use crate::core::error::{Error, Result};
use crate::core::store::Store;
use crate::core::types::{Account, AccountId};
use crate::index::likes::LikeEntry;
use crate::query::iterators::{CursorIter, PostingCursor, Union};
use crate::query::types::SuggestQuery;

/// Sum over shared targets of 1 / |mean ts difference|, or 1 when the means agree.
/// Both lists must be sorted descending by target; means use integer division.
pub fn similarity(mine: &[LikeEntry], theirs: &[LikeEntry]) -> f64 {
    let mut total = 0.0;
    let (mut i, mut j) = (0, 0);

    while i < mine.len() && j < theirs.len() {
        let target = mine[i].target;
        let (mut my_sum, mut my_count) = (0u64, 0u64);
        while i < mine.len() && mine[i].target == target {
            my_sum += mine[i].ts as u64;
            my_count += 1;
            i += 1;
        }

        let (mut their_sum, mut their_count) = (0u64, 0u64);
        while j < theirs.len() && theirs[j].target >= target {
            if theirs[j].target == target {
                their_sum += theirs[j].ts as u64;
                their_count += 1;
            }
            j += 1;
        }

        if their_count > 0 {
            let delta = (my_sum / my_count).abs_diff(their_sum / their_count);
            total += if delta == 0 { 1.0 } else { 1.0 / delta as f64 };
        }
    }
    total
}

impl Store {
    /// Targets liked by same-sex accounts whose likes resemble those of `id`.
    pub fn suggest(&self, id: AccountId, query: &SuggestQuery) -> Result<Vec<Account>> {
        let me = self.get(id).ok_or_else(|| Error::not_found(format!("account {}", id)))?;
        let dict = self.dictionary();

        let city = match &query.city {
            Some(city) => match dict.lookup(DictKind::City, city) {
                Some(city) => Some(city),
                None => return Ok(Vec::new()),
            },
            None => None,
        };
        let country = match &query.country {
            Some(country) => match dict.lookup(DictKind::Country, country) {
                Some(country) => Some(country),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let catalog = self.catalog();
        let my_likes = catalog.liker.find(id);
        if my_likes.is_empty() || query.limit == 0 {
            return Ok(Vec::new());
        }

        let mut targets: Vec<AccountId> = my_likes.iter().map(|like| like.target).collect();
        targets.dedup();
        let cursor = Box::new(Union::new(
            targets
                .iter()
                .map(|&target| PostingCursor::descending(catalog.likee.find(target)).boxed())
                .collect(),
        ));

        let table = self.table();
        let mut co_likers: Vec<(f64, AccountId)> = CursorIter::new(cursor)
            .filter(|&other| other != id)
            .filter_map(|other| table.accounts.get(&other))
            .filter(|other| other.sex == me.sex)
            .filter(|other| city.map_or(true, |c| c == other.city))
            .filter(|other| country.map_or(true, |c| c == other.country))
            .map(|other| (similarity(&my_likes, &catalog.liker.find(other.id)), other.id))
            .collect();
        // stable: equal similarity keeps descending id order
        co_likers.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut taken: HashSet<AccountId> = HashSet::new();
        let mut suggestions: Vec<AccountId> = Vec::with_capacity(query.limit);
        for &(_, other) in &co_likers {
            let mut chunk: Vec<AccountId> = catalog
                .liker
                .find(other)
                .iter()
                .map(|like| like.target)
                .filter(|&target| target != id && targets.binary_search_by(|t| target.cmp(t)).is_err())
                .filter(|&target| taken.insert(target))
                .collect();
            chunk.sort_unstable_by(|a, b| b.cmp(a));
            suggestions.extend(chunk);
            if suggestions.len() >= query.limit {
                break;
            }
        }
        suggestions.truncate(query.limit);

        debug!(id, co_likers = co_likers.len(), found = suggestions.len(), "suggest");
        Ok(suggestions
            .into_iter()
            .filter_map(|target| table.accounts.get(&target).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn likes(entries: &[(AccountId, u32)]) -> Vec<LikeEntry> {
        entries.iter().map(|&(target, ts)| LikeEntry { target, ts }).collect()
    }

    #[test]
    fn equal_timestamps_score_one_per_target() {
        let mine = likes(&[(9, 100), (5, 200)]);
        let theirs = likes(&[(9, 100), (7, 1), (5, 200)]);
        assert_eq!(similarity(&mine, &theirs), 2.0);
    }

    #[test]
    fn repeated_likes_are_averaged() {
        // my mean for 5 is 150, theirs is 160
        let mine = likes(&[(5, 100), (5, 200)]);
        let theirs = likes(&[(5, 160)]);
        assert!((similarity(&mine, &theirs) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn disjoint_likes_score_zero() {
        let mine = likes(&[(4, 1), (2, 1)]);
        let theirs = likes(&[(3, 1), (1, 1)]);
        assert_eq!(similarity(&mine, &theirs), 0.0);
        assert_eq!(similarity(&[], &theirs), 0.0);
    }
}
