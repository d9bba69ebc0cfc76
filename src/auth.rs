use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::entities::farmer;
use crate::error::AppError;

/// The authenticated farmer a request acts on behalf of.
///
/// Inserted into request extensions by the token middleware (API) or the
/// session middleware (HTML pages).
#[derive(Clone, Debug, Serialize)]
pub struct Actor {
    pub id: i32,
    pub username: String,
    pub date_joined: NaiveDateTime,
}

impl From<&farmer::Model> for Actor {
    fn from(model: &farmer::Model) -> Self {
        Self {
            id: model.id,
            username: model.username.clone(),
            date_joined: model.date_joined,
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::Internal("Failed to hash password".to_string()))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => {
            tracing::warn!("Invalid password hash in DB");
            false
        }
    }
}

/// 40 lowercase hex characters.
pub fn generate_token_key() -> String {
    let first = uuid::Uuid::new_v4().simple().to_string();
    let second = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", first, &second[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("password123").unwrap();
        assert!(verify_password("password123", &hash));
        assert!(!verify_password("password124", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("password123", "not-a-phc-string"));
    }

    #[test]
    fn token_keys_are_40_hex_chars() {
        let key = generate_token_key();
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_token_key());
    }
}
