//! Read-only credential store built from `auth.yaml`.

use std::collections::HashMap;

use rand::Rng;

use crate::config::{AuthFile, ConfigError, normalize_username};
use crate::services::password;

/// A provisioned account.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// Username → record map, fixed for the lifetime of the process.
pub struct CredentialStore {
    users: HashMap<String, CredentialRecord>,
    /// Hash of random bytes, verified against when the username is unknown.
    decoy_hash: String,
}

impl CredentialStore {
    /// Build the store from a validated credential file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file fails validation or the decoy hash cannot
    /// be produced.
    pub fn from_config(file: &AuthFile) -> Result<Self, ConfigError> {
        file.validate()?;

        let users = file
            .credentials
            .usernames
            .iter()
            .map(|(username, entry)| {
                let username = normalize_username(username);
                let record = CredentialRecord {
                    username: username.clone(),
                    display_name: entry.name.clone(),
                    password_hash: entry.password.clone(),
                };
                (username, record)
            })
            .collect::<HashMap<_, _>>();

        // Match a stored hash's cost so unknown users take as long as known ones.
        let reference = users
            .values()
            .next()
            .map(|record| record.password_hash.as_str())
            .ok_or_else(|| ConfigError::Invalid("credentials.usernames is empty".to_owned()))?;

        let decoy_plaintext: [u8; 32] = rand::rng().random();
        let decoy_hash = password::hash_password_like(&bytes_to_hex(&decoy_plaintext), reference)?;

        Ok(Self { users, decoy_hash })
    }

    /// Find the record for `username` (case-insensitive, trimmed).
    #[must_use]
    pub fn lookup(&self, username: &str) -> Option<&CredentialRecord> {
        self.users.get(&normalize_username(username))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Sorted usernames, for startup logging.
    #[must_use]
    pub fn usernames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.users.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn decoy_hash(&self) -> &str {
        &self.decoy_hash
    }
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
