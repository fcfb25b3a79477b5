//! Daily counters, local only

use super::{CacheResult, Collection, ReferenceCache};
use shared::models::Count;

#[derive(Clone)]
pub struct CountStore {
    cache: ReferenceCache,
}

impl CountStore {
    pub(super) fn new(cache: ReferenceCache) -> Self {
        Self { cache }
    }

    pub fn all(&self) -> CacheResult<Vec<Count>> {
        self.cache.find_all(Collection::Counts)
    }

    /// Counters last reset on `date`
    pub fn find_by_date(&self, date: &str) -> CacheResult<Vec<Count>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|c| c.last_reset == date)
            .collect())
    }

    pub fn find(&self, key: &str) -> CacheResult<Option<Count>> {
        self.cache.get(Collection::Counts, key)
    }

    pub fn upsert(&self, count: &Count) -> CacheResult<()> {
        self.cache.insert_one(Collection::Counts, count)
    }

    /// Drop every counter
    pub fn clear(&self) -> CacheResult<usize> {
        self.cache.delete_where(Collection::Counts, |_: &Count| true)
    }
}
