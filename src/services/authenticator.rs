//! Login attempt verification.
//!
//! The two failure reasons exist for tests and callers inside the crate only.
//! Anything user-facing goes through [`AuthFailure::user_message`], which is
//! the same for both, and unknown usernames still pay for one Argon2
//! verification so response timing does not reveal which accounts exist.
//!
//! There is no lockout or attempt counting.

use crate::services::credentials::CredentialStore;
use crate::services::password;

/// Shown for every rejected login, whatever the reason.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid username or password";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("unknown user")]
    UnknownUser,
    #[error("bad password")]
    BadPassword,
}

impl AuthFailure {
    #[must_use]
    pub fn user_message(self) -> &'static str {
        INVALID_CREDENTIALS_MESSAGE
    }
}

/// Verify a username/password pair. Returns the canonical username.
///
/// # Errors
///
/// Returns [`AuthFailure::UnknownUser`] or [`AuthFailure::BadPassword`].
pub fn authenticate(store: &CredentialStore, username: &str, plaintext: &str) -> Result<String, AuthFailure> {
    let Some(record) = store.lookup(username) else {
        let _ = password::verify_password(plaintext, store.decoy_hash());
        return Err(AuthFailure::UnknownUser);
    };

    match password::verify_password(plaintext, &record.password_hash) {
        Ok(true) => Ok(record.username.clone()),
        Ok(false) => Err(AuthFailure::BadPassword),
        Err(e) => {
            tracing::error!(error = %e, "stored password hash could not be verified");
            Err(AuthFailure::BadPassword)
        }
    }
}

#[cfg(test)]
#[path = "authenticator_test.rs"]
mod tests;
