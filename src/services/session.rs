//! Signed, client-held session cookies.
//!
//! ARCHITECTURE
//! ============
//! Sessions are stateless. The cookie value is
//! `base64url(json{sub, iat, exp}) "." base64url(hmac_sha256(secret, payload))`
//! where the MAC covers the encoded payload exactly as sent. Validation
//! checks the MAC first (constant-time), then decodes, then checks expiry.
//!
//! TRADE-OFFS
//! ==========
//! Nothing is stored server-side, so logout only clears the browser's copy.
//! A value copied out of the browser stays valid until its own `exp`, and
//! rotating `cookie.key` logs everyone out at once.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use time::{Duration, OffsetDateTime};

use crate::config::{ConfigError, CookieSection, MAX_EXPIRY_DAYS};

type HmacSha256 = Hmac<Sha256>;

/// Decoded contents of a valid session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "sub")]
    pub username: String,
    /// Unix seconds.
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Unix seconds.
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

/// Issues and checks session cookies with one process-wide signing key.
#[derive(Clone)]
pub struct SessionManager {
    mac: HmacSha256,
    cookie_name: String,
    validity: Duration,
    secure: bool,
}

impl SessionManager {
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `secret` is empty or `validity` is
    /// outside `(0, MAX_EXPIRY_DAYS]`.
    pub fn new(secret: &[u8], cookie_name: impl Into<String>, validity: Duration, secure: bool) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::Invalid("session signing secret must not be empty".into()));
        }
        if !validity.is_positive() || validity > Duration::days(MAX_EXPIRY_DAYS) {
            return Err(ConfigError::Invalid(format!("session validity must be between 1 second and {MAX_EXPIRY_DAYS} days")));
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(Self { mac, cookie_name: cookie_name.into(), validity, secure })
    }

    /// Build from the `cookie` section of `auth.yaml`.
    ///
    /// # Errors
    ///
    /// Same as [`SessionManager::new`].
    pub fn from_config(cookie: &CookieSection, secure: bool) -> Result<Self, ConfigError> {
        Self::new(cookie.key.as_bytes(), cookie.name.clone(), Duration::days(cookie.expiry_days), secure)
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    #[must_use]
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Mint a cookie value for `username`, valid from now.
    #[must_use]
    pub fn issue(&self, username: &str) -> String {
        self.issue_at(username, OffsetDateTime::now_utc())
    }

    #[must_use]
    pub fn issue_at(&self, username: &str, now: OffsetDateTime) -> String {
        let payload = serde_json::json!({
            "sub": username,
            "iat": now.unix_timestamp(),
            "exp": (now + self.validity).unix_timestamp(),
        })
        .to_string();
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(encoded.as_bytes()));
        format!("{encoded}.{signature}")
    }

    /// Check a cookie value against the current time.
    #[must_use]
    pub fn validate(&self, value: &str) -> Option<SessionClaims> {
        self.validate_at(value, OffsetDateTime::now_utc())
    }

    /// Returns `None` for anything malformed, tampered with, or expired.
    #[must_use]
    pub fn validate_at(&self, value: &str, now: OffsetDateTime) -> Option<SessionClaims> {
        let (encoded, signature) = value.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(encoded.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let payload = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        let claims: SessionClaims = serde_json::from_slice(&payload).ok()?;
        if now.unix_timestamp() > claims.expires_at {
            return None;
        }
        Some(claims)
    }

    /// Validate whatever session cookie the request carried.
    #[must_use]
    pub fn read(&self, jar: &CookieJar) -> Option<SessionClaims> {
        let value = jar.get(&self.cookie_name)?.value();
        let claims = self.validate(value);
        if claims.is_none() {
            tracing::debug!(cookie = %self.cookie_name, "session cookie rejected");
        }
        claims
    }

    /// `Set-Cookie` for a freshly issued value.
    #[must_use]
    pub fn session_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(self.validity)
            .build()
    }

    /// `Set-Cookie` that makes the browser drop its session.
    #[must_use]
    pub fn clear_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(Duration::ZERO)
            .build()
    }

    fn sign(&self, bytes: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(bytes);
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
