//! User Service - registration against the remote store, login against the cache

use super::SyncService;
use crate::cache::ReferenceCache;
use crate::cloud::{ConnectivityProbe, RemoteStore, require_connectivity};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use shared::error::{AppError, AppResult};
use shared::models::{CollectionKind, User, UserCreate};
use std::sync::Arc;

/// Hash password using argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

/// Verify password using argon2
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub struct UserService {
    cache: ReferenceCache,
    remote: Arc<dyn RemoteStore>,
    probe: Arc<dyn ConnectivityProbe>,
    sync: Arc<SyncService>,
}

impl UserService {
    pub fn new(
        cache: ReferenceCache,
        remote: Arc<dyn RemoteStore>,
        probe: Arc<dyn ConnectivityProbe>,
        sync: Arc<SyncService>,
    ) -> Self {
        Self {
            cache,
            remote,
            probe,
            sync,
        }
    }

    /// Register a user remotely and refresh the local copy
    pub async fn register(&self, data: UserCreate) -> AppResult<User> {
        for (field, value) in [
            ("username", &data.username),
            ("password", &data.password),
            ("name", &data.name),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("{field} is required")).with_detail("field", field));
            }
        }
        if self.cache.users().find(&data.username)?.is_some() {
            tracing::warn!(username = %data.username, "Username already registered");
            return Err(AppError::already_exists(format!("User {}", data.username)));
        }

        require_connectivity(self.probe.as_ref()).await?;

        let password_hash = hash_password(&data.password)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;
        let user = User {
            username: data.username,
            password_hash,
            name: data.name,
            role: data.role,
            created_at: shared::util::now_millis(),
            updated_at: None,
        };
        let doc = serde_json::to_value(&user)
            .map_err(|e| AppError::internal(format!("Failed to encode user: {e}")))?;

        self.remote
            .insert_one(CollectionKind::Users, doc)
            .await
            .inspect_err(|e| tracing::error!(username = %user.username, error = %e, "Failed to register remote user"))?;
        tracing::info!(username = %user.username, "User registered");

        self.sync.sync_collection(CollectionKind::Users).await?;
        Ok(user)
    }

    /// Check credentials against the cached users
    pub fn login(&self, username: &str, password: &str) -> AppResult<User> {
        let user = self
            .cache
            .users()
            .find(username)?
            .ok_or_else(|| AppError::user_not_found(username))?;

        let valid = verify_password(password, &user.password_hash).map_err(|e| {
            tracing::error!(username, error = %e, "Stored password hash is unreadable");
            AppError::internal(format!("Password verification failed: {e}"))
        })?;
        if !valid {
            tracing::warn!(username, "Invalid password");
            return Err(AppError::invalid_credentials());
        }

        tracing::info!(username, "User logged in");
        Ok(user)
    }

    pub fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.cache.users().all()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
        assert!(verify_password("s3cret", "not-a-hash").is_err());
    }
}
