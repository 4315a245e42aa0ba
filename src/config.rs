//! Startup configuration: the credential file plus process environment.
//!
//! SYSTEM CONTEXT
//! ==============
//! `auth.yaml` is provisioned by hand (hashes come from `matchhub-hash`) and
//! read exactly once before the listener binds. Anything wrong with it is a
//! `ConfigError` and the process refuses to serve traffic.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::services::password::{self, PasswordError};

pub const DEFAULT_AUTH_PATH: &str = "data/auth.yaml";
pub const DEFAULT_COOKIE_NAME: &str = "matchhub_auth";
pub const DEFAULT_EXPIRY_DAYS: i64 = 30;
pub const MAX_EXPIRY_DAYS: i64 = 3650;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed credential file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid credential file: {0}")]
    Invalid(String),
    #[error("password hashing unavailable: {0}")]
    Hash(#[from] PasswordError),
}

// =============================================================================
// CREDENTIAL FILE
// =============================================================================

/// Parsed `auth.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthFile {
    pub credentials: CredentialsSection,
    pub cookie: CookieSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsSection {
    pub usernames: BTreeMap<String, UserEntry>,
}

/// One account. Extra keys (email, counters) are tolerated and ignored.
#[derive(Clone, Deserialize)]
pub struct UserEntry {
    pub name: String,
    pub password: String,
}

impl std::fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserEntry")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Cookie policy and the session signing secret.
#[derive(Clone, Deserialize)]
pub struct CookieSection {
    #[serde(default = "default_cookie_name")]
    pub name: String,
    pub key: String,
    #[serde(default = "default_expiry_days")]
    pub expiry_days: i64,
}

impl std::fmt::Debug for CookieSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSection")
            .field("name", &self.name)
            .field("key", &"<redacted>")
            .field("expiry_days", &self.expiry_days)
            .finish()
    }
}

fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_owned()
}

fn default_expiry_days() -> i64 {
    DEFAULT_EXPIRY_DAYS
}

impl AuthFile {
    /// Read and validate the credential file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, is
    /// missing a required field, or fails [`AuthFile::validate`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::parse(&raw)
    }

    /// Parse and validate a credential document held in memory.
    ///
    /// # Errors
    ///
    /// Same as [`AuthFile::load`], minus the I/O.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let file: Self = serde_yaml::from_str(raw)?;
        file.validate()?;
        Ok(file)
    }

    /// Check the invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cookie.key.trim().is_empty() {
            return Err(ConfigError::Invalid("cookie.key must not be empty".into()));
        }
        if !is_valid_cookie_name(&self.cookie.name) {
            return Err(ConfigError::Invalid(format!("cookie.name {:?} is not a valid cookie name", self.cookie.name)));
        }
        if !(1..=MAX_EXPIRY_DAYS).contains(&self.cookie.expiry_days) {
            return Err(ConfigError::Invalid(format!("cookie.expiry_days must be between 1 and {MAX_EXPIRY_DAYS}")));
        }
        if self.credentials.usernames.is_empty() {
            return Err(ConfigError::Invalid("credentials.usernames must list at least one user".into()));
        }

        let mut seen = std::collections::HashSet::new();
        for (username, entry) in &self.credentials.usernames {
            let normalized = normalize_username(username);
            if normalized.is_empty() {
                return Err(ConfigError::Invalid("usernames must not be blank".into()));
            }
            if !seen.insert(normalized) {
                return Err(ConfigError::Invalid(format!("username {username:?} is listed more than once")));
            }
            if !password::is_supported_hash(&entry.password) {
                return Err(ConfigError::Invalid(format!(
                    "password for {username:?} is not an argon2id hash; generate one with matchhub-hash"
                )));
            }
        }
        Ok(())
    }
}

/// Usernames compare case-insensitively and ignore surrounding whitespace.
#[must_use]
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn is_valid_cookie_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// =============================================================================
// PROCESS ENVIRONMENT
// =============================================================================

/// Settings read from the environment (and `.env`, when present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub auth_path: PathBuf,
    pub port: u16,
    pub cookie_secure: bool,
}

impl ServerConfig {
    /// Optional:
    /// - `MATCHHUB_AUTH_PATH`: credential file, default `data/auth.yaml`
    /// - `PORT`: default 3000
    /// - `COOKIE_SECURE`: mark the session cookie `Secure`, default off
    #[must_use]
    pub fn from_env() -> Self {
        let auth_path = std::env::var("MATCHHUB_AUTH_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_AUTH_PATH));
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let cookie_secure = env_bool("COOKIE_SECURE").unwrap_or(false);
        Self { auth_path, port, cookie_secure }
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| parse_bool(&raw))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
