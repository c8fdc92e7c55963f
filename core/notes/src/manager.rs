//! Account flows that establish and tear down the key session.

use std::sync::Arc;
use tracing::info;

use crate::session::KeySession;
use sealnote_common::{Error, Result, UserId};
use sealnote_crypto::Salt;
use sealnote_storage::{AuthGrant, AuthProvider};

/// Drives registration, login and logout against the auth collaborator and
/// keeps the caller's [`KeySession`] in step.
pub struct AccountManager {
    auth: Arc<dyn AuthProvider>,
}

impl AccountManager {
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        Self { auth }
    }

    /// Register a new account and derive its key.
    ///
    /// # Postconditions
    /// - A fresh salt was generated and sent once, with the registration
    /// - `session` holds the key derived from the salt the server returned
    ///
    /// # Errors
    /// - `InvalidInput` for an empty email or password; nothing is sent
    /// - `AlreadyExists` if the email is taken
    /// - `InvalidInput` if the server returns a malformed salt
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        session: &mut KeySession,
    ) -> Result<AuthGrant> {
        check_credentials(email, password)?;

        let salt = Salt::generate();
        let grant = self.auth.register(email, password, &salt.to_hex()).await?;
        self.establish(&grant, password, session).await?;

        info!(user_id = %grant.user_id, "Registered and derived key");
        Ok(grant)
    }

    /// Sign in and re-derive the key from the stored salt.
    ///
    /// # Errors
    /// - `InvalidInput` for an empty email or password; nothing is sent
    /// - `NotPermitted` for bad credentials
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        session: &mut KeySession,
    ) -> Result<AuthGrant> {
        check_credentials(email, password)?;

        let grant = self.auth.login(email, password).await?;
        self.establish(&grant, password, session).await?;

        info!(user_id = %grant.user_id, "Signed in and derived key");
        Ok(grant)
    }

    /// Clear the key, then end the server-side session.
    ///
    /// The key is gone even if the server call fails.
    pub async fn logout(&self, user: &UserId, session: &mut KeySession) -> Result<()> {
        session.clear();
        self.auth.logout(user).await?;
        info!(user_id = %user, "Signed out");
        Ok(())
    }

    async fn establish(
        &self,
        grant: &AuthGrant,
        password: &str,
        session: &mut KeySession,
    ) -> Result<()> {
        let salt = Salt::from_hex(&grant.salt)?;
        session.unlock(password, &salt).await
    }
}

fn check_credentials(email: &str, password: &str) -> Result<()> {
    if email.is_empty() {
        return Err(Error::InvalidInput("Email is required".to_string()));
    }
    if password.is_empty() {
        return Err(Error::InvalidInput("Password cannot be empty".to_string()));
    }
    Ok(())
}
