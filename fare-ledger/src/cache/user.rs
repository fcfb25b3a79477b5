//! Cached users

use super::{CacheResult, Collection, ReferenceCache};
use shared::models::User;

#[derive(Clone)]
pub struct UserCache {
    cache: ReferenceCache,
}

impl UserCache {
    pub(super) fn new(cache: ReferenceCache) -> Self {
        Self { cache }
    }

    pub fn all(&self) -> CacheResult<Vec<User>> {
        self.cache.find_all(Collection::Users)
    }

    pub fn find(&self, username: &str) -> CacheResult<Option<User>> {
        self.cache.get(Collection::Users, username)
    }

    pub fn replace(&self, users: &[User]) -> CacheResult<()> {
        self.cache.replace_all(Collection::Users, users)
    }
}
