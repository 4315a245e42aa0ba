//! Argon2id password hashing and verification.
//!
//! Every stored hash is a PHC string produced by [`hash_password`]. Request
//! handling only ever calls [`verify_password`]; hashing happens offline in
//! the `matchhub-hash` provisioning tool.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("invalid password hash: {0}")]
    InvalidHash(String),
}

/// Hash a plaintext password with Argon2id and a fresh random salt.
///
/// # Errors
///
/// Returns [`PasswordError::Hash`] if the hasher rejects the input.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check `plaintext` against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch. The digest comparison is constant-time.
///
/// # Errors
///
/// Returns [`PasswordError::InvalidHash`] if `hash` cannot be parsed.
pub fn verify_password(plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;
    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::InvalidHash(e.to_string())),
    }
}

/// Hash `plaintext` with the algorithm version and cost parameters of
/// `reference`, so both take the same time to verify.
///
/// # Errors
///
/// Returns [`PasswordError::InvalidHash`] if `reference` is not a usable
/// Argon2 hash, or [`PasswordError::Hash`] if hashing fails.
pub fn hash_password_like(plaintext: &str, reference: &str) -> Result<String, PasswordError> {
    let parsed = PasswordHash::new(reference).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;
    let params = Params::try_from(&parsed).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;
    let version = match parsed.version {
        Some(raw) => Version::try_from(raw).map_err(|e| PasswordError::InvalidHash(e.to_string()))?,
        None => Version::default(),
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::new(Algorithm::Argon2id, version, params)
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Whether `hash` is an Argon2id PHC string that can actually be verified
/// against: the parameters and version must be accepted by the hasher, not
/// merely parse.
#[must_use]
pub fn is_supported_hash(hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    if parsed.algorithm != Algorithm::Argon2id.ident() || parsed.hash.is_none() {
        return false;
    }
    matches!(
        Argon2::default().verify_password(b"", &parsed),
        Ok(()) | Err(argon2::password_hash::Error::Password)
    )
}

#[cfg(test)]
#[path = "password_test.rs"]
mod tests;
