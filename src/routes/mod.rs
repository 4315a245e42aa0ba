//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page of the app sits behind the login gate at `/`. `/api/me` is the
//! JSON view of the same session for scripts and downstream handlers.

pub mod auth;
pub mod pages;

use axum::Router;
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full router over a loaded [`AppState`].
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(auth::index))
        .route("/login", get(redirect_login_to_index).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/api/me", get(auth::me))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn redirect_login_to_index() -> Redirect {
    Redirect::to("/")
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
