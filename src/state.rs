//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. Both
//! members are built once from `auth.yaml` before the listener binds and are
//! never mutated afterwards, so they are shared behind `Arc` without locks.

use std::sync::Arc;

use crate::config::{AuthFile, ConfigError};
use crate::services::credentials::CredentialStore;
use crate::services::session::SessionManager;

/// Clone is required by Axum; both fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    #[must_use]
    pub fn new(credentials: CredentialStore, sessions: SessionManager) -> Self {
        Self { credentials: Arc::new(credentials), sessions: Arc::new(sessions) }
    }

    /// Build the credential store and session manager from a loaded file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is invalid or the session manager rejects
    /// its cookie settings.
    pub fn from_config(file: &AuthFile, cookie_secure: bool) -> Result<Self, ConfigError> {
        let credentials = CredentialStore::from_config(file)?;
        let sessions = SessionManager::from_config(&file.cookie, cookie_secure)?;
        Ok(Self::new(credentials, sessions))
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
