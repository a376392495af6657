use crate::core::types::AccountId;
use crate::index::posting::Postings;

/// Position within a descending id stream. `current() == 0` means exhausted.
pub trait Cursor {
    fn current(&self) -> AccountId;
    fn advance(&mut self);
    /// Upper bound on remaining ids, used to pick the intersection driver.
    fn cost(&self) -> usize;
}

pub type BoxCursor = Box<dyn Cursor + Send>;

/// Cursor over a posting list snapshot.
pub struct PostingCursor {
    ids: Postings,
    pos: usize,
    ascending: bool,
}

impl PostingCursor {
    pub fn descending(ids: Postings) -> Self {
        PostingCursor { ids, pos: 0, ascending: false }
    }

    /// Walks the list from the smallest id; not usable inside Union/Intersect.
    pub fn ascending(ids: Postings) -> Self {
        PostingCursor { ids, pos: 0, ascending: true }
    }

    pub fn boxed(self) -> BoxCursor {
        Box::new(self)
    }
}

impl Cursor for PostingCursor {
    fn current(&self) -> AccountId {
        if self.pos >= self.ids.len() {
            return 0;
        }
        if self.ascending {
            self.ids[self.ids.len() - 1 - self.pos]
        } else {
            self.ids[self.pos]
        }
    }

    fn advance(&mut self) {
        if self.pos < self.ids.len() {
            self.pos += 1;
        }
    }

    fn cost(&self) -> usize {
        self.ids.len().saturating_sub(self.pos)
    }
}

/// Always exhausted.
pub struct EmptyCursor;

impl Cursor for EmptyCursor {
    fn current(&self) -> AccountId {
        0
    }

    fn advance(&mut self) {}

    fn cost(&self) -> usize {
        0
    }
}

/// Lazy k-way merge of descending cursors, duplicates collapsed.
pub struct Union {
    cursors: Vec<BoxCursor>,
    current: AccountId,
}

impl Union {
    pub fn new(cursors: Vec<BoxCursor>) -> Self {
        let mut union = Union { cursors, current: 0 };
        union.current = union.max();
        union
    }

    fn max(&self) -> AccountId {
        self.cursors.iter().map(|c| c.current()).max().unwrap_or(0)
    }
}

impl Cursor for Union {
    fn current(&self) -> AccountId {
        self.current
    }

    fn advance(&mut self) {
        if self.current == 0 {
            return;
        }
        for cursor in self.cursors.iter_mut() {
            if cursor.current() == self.current {
                cursor.advance();
            }
        }
        self.current = self.max();
    }

    fn cost(&self) -> usize {
        self.cursors.iter().map(|c| c.cost()).sum()
    }
}

/// Lazy merge-join of descending cursors driven by the cheapest input.
pub struct Intersect {
    cursors: Vec<BoxCursor>,
    current: AccountId,
}

impl Intersect {
    pub fn new(mut cursors: Vec<BoxCursor>) -> Self {
        cursors.sort_by_key(|c| c.cost());
        let mut intersect = Intersect { cursors, current: 0 };
        intersect.settle();
        intersect
    }

    /// Move every cursor to the next id present in all of them.
    fn settle(&mut self) {
        if self.cursors.is_empty() {
            self.current = 0;
            return;
        }

        'outer: loop {
            let target = self.cursors[0].current();
            if target == 0 {
                self.current = 0;
                return;
            }

            for i in 1..self.cursors.len() {
                let cursor = &mut self.cursors[i];
                while cursor.current() > target {
                    cursor.advance();
                }
                let value = cursor.current();
                if value == 0 {
                    self.current = 0;
                    return;
                }
                if value < target {
                    let driver = &mut self.cursors[0];
                    while driver.current() > value {
                        driver.advance();
                    }
                    continue 'outer;
                }
            }

            self.current = target;
            return;
        }
    }
}

impl Cursor for Intersect {
    fn current(&self) -> AccountId {
        self.current
    }

    fn advance(&mut self) {
        if self.current == 0 {
            return;
        }
        self.cursors[0].advance();
        self.settle();
    }

    fn cost(&self) -> usize {
        self.cursors.first().map_or(0, |c| c.cost())
    }
}

/// Adapts a cursor into a std iterator.
pub struct CursorIter {
    cursor: BoxCursor,
}

impl CursorIter {
    pub fn new(cursor: BoxCursor) -> Self {
        CursorIter { cursor }
    }
}

impl Iterator for CursorIter {
    type Item = AccountId;

    fn next(&mut self) -> Option<AccountId> {
        let id = self.cursor.current();
        if id == 0 {
            return None;
        }
        self.cursor.advance();
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use rand::Rng;

    fn cursor(ids: &[u32]) -> BoxCursor {
        let mut sorted = ids.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        PostingCursor::descending(Arc::new(sorted)).boxed()
    }

    fn drain(cursor: BoxCursor) -> Vec<u32> {
        CursorIter::new(cursor).collect()
    }

    fn random_list(rng: &mut impl Rng) -> Vec<u32> {
        let len = rng.gen_range(0..40);
        (0..len).map(|_| rng.gen_range(1..100)).collect()
    }

    #[test]
    fn ascending_and_descending() {
        let ids = Arc::new(vec![9, 5, 2]);
        assert_eq!(drain(PostingCursor::descending(ids.clone()).boxed()), vec![9, 5, 2]);
        assert_eq!(drain(PostingCursor::ascending(ids).boxed()), vec![2, 5, 9]);
    }

    #[test]
    fn union_merges_and_dedups() {
        let union = Union::new(vec![cursor(&[9, 4, 1]), cursor(&[7, 4, 2]), cursor(&[])]);
        assert_eq!(drain(Box::new(union)), vec![9, 7, 4, 2, 1]);
        assert_eq!(drain(Box::new(Union::new(Vec::new()))), Vec::<u32>::new());
    }

    #[test]
    fn intersect_keeps_common() {
        let intersect = Intersect::new(vec![cursor(&[9, 7, 4, 1]), cursor(&[8, 7, 4, 2]), cursor(&[7, 4])]);
        assert_eq!(drain(Box::new(intersect)), vec![7, 4]);

        let with_empty = Intersect::new(vec![cursor(&[3, 2]), cursor(&[])]);
        assert_eq!(drain(Box::new(with_empty)), Vec::<u32>::new());
    }

    #[test]
    fn matches_brute_force() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let lists: Vec<Vec<u32>> = (0..rng.gen_range(1..5)).map(|_| random_list(&mut rng)).collect();
            let sets: Vec<BTreeSet<u32>> = lists.iter().map(|l| l.iter().copied().collect()).collect();

            let mut union: Vec<u32> = sets.iter().flatten().copied().collect::<BTreeSet<_>>().into_iter().collect();
            union.reverse();
            let got = drain(Box::new(Union::new(lists.iter().map(|l| cursor(l)).collect())));
            assert_eq!(got, union);

            let mut intersection: Vec<u32> = sets[0]
                .iter()
                .copied()
                .filter(|id| sets.iter().all(|s| s.contains(id)))
                .collect();
            intersection.reverse();
            let got = drain(Box::new(Intersect::new(lists.iter().map(|l| cursor(l)).collect())));
            assert_eq!(got, intersection);
        }
    }

    #[test]
    fn nested_combinators() {
        let inner = Union::new(vec![cursor(&[10, 6]), cursor(&[8, 3])]);
        let outer = Intersect::new(vec![Box::new(inner), cursor(&[10, 8, 7, 3, 1])]);
        assert_eq!(drain(Box::new(outer)), vec![10, 8, 3]);
    }
}
