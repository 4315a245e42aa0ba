//! MatchHub login gate: password check, signed session cookie, logout.

pub mod config;
pub mod routes;
pub mod services;
pub mod state;
