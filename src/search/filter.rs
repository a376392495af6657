use tracing::debug;
use crate::core::store::Store;
use crate::core::types::Account;
use crate::query::iterators::CursorIter;
use crate::query::planner::{open_sources, plan_filter, ResolvedFilter};
use crate::query::types::FilterQuery;

impl Store {
    /// Accounts matching every predicate, descending by id, at most `limit`.
    pub fn filter(&self, query: &FilterQuery) -> Vec<Account> {
        let Some(filter) = ResolvedFilter::resolve(query, self.dictionary()) else {
            debug!("filter references an unknown name, empty result");
            return Vec::new();
        };

        let sources = plan_filter(&filter);
        let cursor = open_sources(&sources, self.catalog());
        let now = self.now();
        let dict = self.dictionary();

        let table = self.table();
        CursorIter::new(cursor)
            .filter_map(|id| table.accounts.get(&id))
            .filter(|account| filter.matches(account, now, dict))
            .take(filter.limit)
            .cloned()
            .collect()
    }
}
