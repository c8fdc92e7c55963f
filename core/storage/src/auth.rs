//! Authentication collaborator.
//!
//! The account service verifies passwords and issues sessions. For the
//! encryption core its only relevant output is the user's KDF salt, returned
//! on every successful login or registration.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, info};

use sealnote_common::{Error, Result, UserId};

/// Successful login or registration response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthGrant {
    pub user_id: UserId,
    /// Hex-encoded KDF salt. Public parameter, not a secret.
    pub salt: String,
}

/// Account service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an account and sign it in.
    ///
    /// `salt` is generated client-side and sent exactly once, here.
    ///
    /// # Errors
    /// - `InvalidInput` if any field is empty
    /// - `AlreadyExists` if the email is taken
    async fn register(&self, email: &str, password: &str, salt: &str) -> Result<AuthGrant>;

    /// Verify credentials and sign in.
    ///
    /// # Errors
    /// - `InvalidInput` if any field is empty
    /// - `NotPermitted` for an unknown email or wrong password
    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant>;

    /// End the server-side session.
    async fn logout(&self, user: &UserId) -> Result<()>;
}

struct Credential {
    user_id: UserId,
    password_hash: String,
    salt: String,
}

/// In-memory account service backed by Argon2id password hashes.
#[derive(Default)]
pub struct MemoryAuth {
    credentials: RwLock<HashMap<String, Credential>>,
    signed_in: RwLock<HashSet<UserId>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `user` currently holds a server-side session.
    pub async fn is_signed_in(&self, user: &UserId) -> bool {
        self.signed_in.read().await.contains(user)
    }

    fn hash_password(password: &str) -> Result<String> {
        use rand::RngCore;
        let mut salt_bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| Error::Crypto(format!("Password salt encoding failed: {}", e)))?;

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Crypto(format!("Password hashing failed: {}", e)))
    }

    fn verify_password(password: &str, stored: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored)
            .map_err(|e| Error::Storage(format!("Corrupt password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

fn invalid_credentials() -> Error {
    Error::NotPermitted("invalid credentials".to_string())
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn register(&self, email: &str, password: &str, salt: &str) -> Result<AuthGrant> {
        require("email", email)?;
        require("password", password)?;
        require("salt", salt)?;

        let mut credentials = self.credentials.write().await;
        if credentials.contains_key(email) {
            return Err(Error::AlreadyExists("User already exists".to_string()));
        }

        let credential = Credential {
            user_id: UserId::generate(),
            password_hash: Self::hash_password(password)?,
            salt: salt.to_string(),
        };
        let grant = AuthGrant {
            user_id: credential.user_id.clone(),
            salt: credential.salt.clone(),
        };
        credentials.insert(email.to_string(), credential);
        self.signed_in.write().await.insert(grant.user_id.clone());

        info!(user_id = %grant.user_id, "Account registered");
        Ok(grant)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant> {
        require("email", email)?;
        require("password", password)?;

        let credentials = self.credentials.read().await;
        let credential = credentials.get(email).ok_or_else(invalid_credentials)?;
        if !Self::verify_password(password, &credential.password_hash)? {
            debug!(user_id = %credential.user_id, "Rejected login");
            return Err(invalid_credentials());
        }

        let grant = AuthGrant {
            user_id: credential.user_id.clone(),
            salt: credential.salt.clone(),
        };
        self.signed_in.write().await.insert(grant.user_id.clone());

        info!(user_id = %grant.user_id, "Signed in");
        Ok(grant)
    }

    async fn logout(&self, user: &UserId) -> Result<()> {
        self.signed_in.write().await.remove(user);
        debug!(user_id = %user, "Signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: &str = "a1b2c3d4e5f60708a1b2c3d4e5f60708";

    #[tokio::test]
    async fn test_register_returns_salt() {
        let auth = MemoryAuth::new();
        let grant = auth.register("a@example.com", "pw", SALT).await.unwrap();

        assert_eq!(grant.salt, SALT);
        assert!(auth.is_signed_in(&grant.user_id).await);
    }

    #[tokio::test]
    async fn test_login_returns_same_user_and_salt() {
        let auth = MemoryAuth::new();
        let registered = auth.register("a@example.com", "pw", SALT).await.unwrap();
        auth.logout(&registered.user_id).await.unwrap();
        assert!(!auth.is_signed_in(&registered.user_id).await);

        let grant = auth.login("a@example.com", "pw").await.unwrap();
        assert_eq!(grant, registered);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let auth = MemoryAuth::new();
        auth.register("a@example.com", "pw", SALT).await.unwrap();

        assert!(matches!(
            auth.register("a@example.com", "other", SALT).await,
            Err(Error::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_alike() {
        let auth = MemoryAuth::new();
        auth.register("a@example.com", "pw", SALT).await.unwrap();

        let wrong = auth.login("a@example.com", "nope").await.unwrap_err();
        let unknown = auth.login("b@example.com", "pw").await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let auth = MemoryAuth::new();
        assert!(matches!(
            auth.register("a@example.com", "pw", "").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            auth.login("", "pw").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_password_hash_is_phc_string() {
        let hash = MemoryAuth::hash_password("pw").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(MemoryAuth::verify_password("pw", &hash).unwrap());
        assert!(!MemoryAuth::verify_password("wrong", &hash).unwrap());
    }
}
