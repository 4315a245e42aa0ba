//! Authentication services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Leaf-first: `password` hashes, `credentials` holds the provisioned
//! accounts, `authenticator` checks a login attempt against them, and
//! `session` signs and verifies the cookie that remembers the result. Route
//! handlers only translate between HTTP and these calls.

pub mod authenticator;
pub mod credentials;
pub mod password;
pub mod session;
