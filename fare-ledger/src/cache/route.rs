//! Cached routes

use super::{CacheResult, Collection, ReferenceCache};
use shared::models::Route;

#[derive(Clone)]
pub struct RouteCache {
    cache: ReferenceCache,
}

impl RouteCache {
    pub(super) fn new(cache: ReferenceCache) -> Self {
        Self { cache }
    }

    pub fn all(&self) -> CacheResult<Vec<Route>> {
        self.cache.find_all(Collection::Routes)
    }

    pub fn find(&self, id: &str) -> CacheResult<Option<Route>> {
        self.cache.get(Collection::Routes, id)
    }

    /// First route serving a departure/destination pair
    pub fn find_by_endpoints(&self, departure: &str, destination: &str) -> CacheResult<Option<Route>> {
        self.cache.find_first(Collection::Routes, |r: &Route| {
            r.departure == departure && r.destination == destination
        })
    }

    pub fn replace(&self, routes: &[Route]) -> CacheResult<()> {
        self.cache.replace_all(Collection::Routes, routes)
    }
}
