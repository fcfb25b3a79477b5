//! Counter Service - per-key daily counters kept in the local cache

use crate::cache::CountStore;
use parking_lot::Mutex;
use shared::error::AppResult;
use shared::models::Count;

pub struct CounterService {
    counts: CountStore,
    /// Increments are read-modify-write across two cache transactions
    write_lock: Mutex<()>,
}

impl CounterService {
    pub fn new(counts: CountStore) -> Self {
        Self {
            counts,
            write_lock: Mutex::new(()),
        }
    }

    /// Today's counters. When none belong to today, stale ones are dropped.
    pub fn counts_for_today(&self) -> AppResult<Vec<Count>> {
        self.counts_for(&shared::util::today())
    }

    pub fn increment(&self, key: &str, qty: i64) -> AppResult<Count> {
        self.increment_on(key, qty, &shared::util::today())
    }

    fn counts_for(&self, date: &str) -> AppResult<Vec<Count>> {
        let counts = self.counts.find_by_date(date)?;
        if counts.is_empty() {
            let cleared = self.counts.clear()?;
            if cleared > 0 {
                tracing::info!(cleared, date, "Stale counters cleared");
            }
        }
        Ok(counts)
    }

    /// Add `qty` to a counter, restarting it first if it belongs to another day
    fn increment_on(&self, key: &str, qty: i64, date: &str) -> AppResult<Count> {
        let _guard = self.write_lock.lock();
        let count = match self.counts.find(key)? {
            Some(mut c) if c.last_reset == date => {
                c.value += qty;
                c
            }
            _ => Count {
                key: key.to_string(),
                value: qty,
                last_reset: date.to_string(),
            },
        };
        self.counts.upsert(&count)?;
        Ok(count)
    }
}
