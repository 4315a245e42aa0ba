//! Login gate routes: landing page, login form submission, logout.

use std::sync::Arc;

use axum::Form;
use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use super::pages;
use crate::services::authenticator;
use crate::state::AppState;

/// The signed-in account, as exposed to pages and downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub username: String,
    pub display_name: String,
}

/// Resolve the request's session cookie to a provisioned account.
///
/// Missing, tampered, and expired cookies all yield `None`, as does a valid
/// cookie for a username that has since been removed from `auth.yaml`.
#[must_use]
pub fn current_user(state: &AppState, jar: &CookieJar) -> Option<CurrentUser> {
    let claims = state.sessions.read(jar)?;
    let Some(record) = state.credentials.lookup(&claims.username) else {
        tracing::debug!("session names an account that is no longer provisioned");
        return None;
    };
    Some(CurrentUser { username: record.username.clone(), display_name: record.display_name.clone() })
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: CurrentUser,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let app_state = AppState::from_ref(state);
        current_user(&app_state, &jar)
            .map(|user| Self { user })
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /`: signed-in view, or the login form when there is no valid session.
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Html<String>) {
    if let Some(user) = current_user(&state, &jar) {
        return (jar, Html(pages::render_home(&user)));
    }

    // Drop a stale or tampered cookie so the browser stops presenting it.
    let jar = if jar.get(state.sessions.cookie_name()).is_some() {
        jar.add(state.sessions.clear_cookie())
    } else {
        jar
    };
    (jar, Html(pages::render_login(None)))
}

/// Submitted login form. Never logged, never stored.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// `POST /login`: verify credentials, set the session cookie, redirect to `/`.
///
/// Both failure reasons produce the same 401 page.
pub async fn login(State(state): State<AppState>, jar: CookieJar, Form(form): Form<LoginForm>) -> Response {
    let LoginForm { username, password } = form;
    let credentials = Arc::clone(&state.credentials);

    // Argon2 verification is CPU-bound; keep it off the async workers.
    let outcome =
        tokio::task::spawn_blocking(move || authenticator::authenticate(&credentials, &username, &password)).await;

    match outcome {
        Ok(Ok(username)) => {
            tracing::info!(%username, "login succeeded");
            let cookie = state.sessions.session_cookie(state.sessions.issue(&username));
            (jar.add(cookie), Redirect::to("/")).into_response()
        }
        Ok(Err(failure)) => {
            tracing::info!("login rejected");
            (StatusCode::UNAUTHORIZED, Html(pages::render_login(Some(failure.user_message())))).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "credential check task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "login unavailable").into_response()
        }
    }
}

/// `POST /logout`: clear the cookie and return to the login form.
///
/// Only this browser's copy is removed; the token itself stays valid until
/// its expiry.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(user) = current_user(&state, &jar) {
        tracing::info!(username = %user.username, "logout");
    }
    (jar.add(state.sessions.clear_cookie()), Redirect::to("/"))
}

/// `GET /api/me`: return the current user.
pub async fn me(auth: AuthUser) -> Json<CurrentUser> {
    Json(auth.user)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
