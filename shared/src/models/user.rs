//! User Model (reference data, remote-authoritative)

use serde::{Deserialize, Serialize};

/// User role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// User entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique key
    pub username: String,
    /// Argon2 PHC string
    #[serde(alias = "password")]
    pub password_hash: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

/// Register user payload (plain-text password)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_accepts_password_field() {
        let json = r#"{"username":"bob","password":"$argon2id$x","name":"Bob","role":"admin"}"#;
        let u: User = serde_json::from_str(json).unwrap();
        assert_eq!(u.password_hash, "$argon2id$x");
        assert_eq!(u.role, Role::Admin);
        assert_eq!(u.created_at, 0);
    }
}
