use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use super::*;
use crate::routes::app;
use crate::services::authenticator::INVALID_CREDENTIALS_MESSAGE;
use crate::state::test_helpers::{MARTIN_PASSWORD, TEST_COOKIE_NAME, test_app_state};

// =============================================================================
// HELPERS
// =============================================================================

async fn send(request: Request<Body>) -> Response {
    app(test_app_state()).oneshot(request).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = cookie {
        builder = builder.header(COOKIE, format!("{TEST_COOKIE_NAME}={value}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_owned())
}

/// Extract the session value from a `Set-Cookie` header.
fn session_value(header: &str) -> String {
    let pair = header.split(';').next().unwrap();
    let (name, value) = pair.split_once('=').unwrap();
    assert_eq!(name, TEST_COOKIE_NAME);
    value.to_owned()
}

fn is_login_page(html: &str) -> bool {
    html.contains(r#"action="/login""#)
}

// =============================================================================
// GET /
// =============================================================================

#[tokio::test]
async fn index_without_cookie_renders_login() {
    let response = send(get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).is_none());
    let html = body_text(response).await;
    assert!(is_login_page(&html));
    assert!(!html.contains(INVALID_CREDENTIALS_MESSAGE));
}

#[tokio::test]
async fn index_with_valid_session_renders_home() {
    let value = test_app_state().sessions.issue("martin");
    let response = send(get("/", Some(&value))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).is_none());
    let html = body_text(response).await;
    assert!(html.contains("Martin"));
    assert!(html.contains(r#"action="/logout""#));
    assert!(!is_login_page(&html));
}

#[tokio::test]
async fn index_with_tampered_cookie_falls_back_to_login() {
    let value = test_app_state().sessions.issue("martin");
    let last = if value.ends_with('A') { 'B' } else { 'A' };
    let tampered = format!("{}{last}", &value[..value.len() - 1]);
    let response = send(get("/", Some(&tampered))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = set_cookie(&response).expect("stale cookie should be cleared");
    assert!(cleared.contains("Max-Age=0"));
    assert!(is_login_page(&body_text(response).await));
}

#[tokio::test]
async fn index_with_session_for_removed_user_renders_login() {
    let value = test_app_state().sessions.issue("ghost");
    let response = send(get("/", Some(&value))).await;
    assert!(is_login_page(&body_text(response).await));
}

#[tokio::test]
async fn get_login_redirects_to_index() {
    let response = send(get("/login", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/");
}

// =============================================================================
// POST /login
// =============================================================================

#[tokio::test]
async fn login_success_sets_signed_cookie() {
    let response = send(post_form("/login", &format!("username=martin&password={MARTIN_PASSWORD}"))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/");

    let header = set_cookie(&response).expect("session cookie");
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("SameSite=Lax"));
    assert!(header.contains("Path=/"));
    assert!(header.contains("Max-Age=2592000"));

    let claims = test_app_state().sessions.validate(&session_value(&header)).unwrap();
    assert_eq!(claims.username, "martin");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let bad_password = send(post_form("/login", "username=martin&password=wrong_pw")).await;
    let unknown_user = send(post_form("/login", "username=ghost&password=anything")).await;

    assert_eq!(bad_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&bad_password).is_none());
    assert!(set_cookie(&unknown_user).is_none());

    let a = body_text(bad_password).await;
    let b = body_text(unknown_user).await;
    assert_eq!(a, b);
    assert!(a.contains(INVALID_CREDENTIALS_MESSAGE));
    assert!(is_login_page(&a));
}

#[tokio::test]
async fn login_with_empty_form_is_rejected() {
    let response = send(post_form("/login", "")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains(INVALID_CREDENTIALS_MESSAGE));
}

#[tokio::test]
async fn failed_login_page_does_not_echo_password() {
    let response = send(post_form("/login", "username=martin&password=leaky-secret-42")).await;
    assert!(!body_text(response).await.contains("leaky-secret-42"));
}

// =============================================================================
// POST /logout
// =============================================================================

#[tokio::test]
async fn logout_clears_cookie_and_next_request_sees_login() {
    let login = send(post_form("/login", &format!("username=martin&password={MARTIN_PASSWORD}"))).await;
    let value = session_value(&set_cookie(&login).unwrap());

    let mut request = post_form("/logout", "");
    request
        .headers_mut()
        .insert(COOKIE, format!("{TEST_COOKIE_NAME}={value}").parse().unwrap());
    let logout = send(request).await;
    assert_eq!(logout.status(), StatusCode::SEE_OTHER);
    assert_eq!(logout.headers()[LOCATION], "/");
    let cleared = set_cookie(&logout).unwrap();
    assert!(cleared.starts_with(&format!("{TEST_COOKIE_NAME}=;")));
    assert!(cleared.contains("Max-Age=0"));

    // The browser dropped the cookie, so the next visit carries none.
    let next = send(get("/", None)).await;
    assert!(is_login_page(&body_text(next).await));
}

#[tokio::test]
async fn logout_without_session_still_clears() {
    let response = send(post_form("/logout", "")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));
}

// =============================================================================
// GET /api/me
// =============================================================================

#[tokio::test]
async fn me_requires_session() {
    let response = send(get("/api/me", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_current_user() {
    let value = test_app_state().sessions.issue("christoph");
    let response = send(get("/api/me", Some(&value))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json, serde_json::json!({ "username": "christoph", "display_name": "Christoph" }));
}

#[tokio::test]
async fn healthz_is_open() {
    let response = send(get("/healthz", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// current_user
// =============================================================================

#[test]
fn current_user_resolves_display_name() {
    let state = test_app_state();
    let jar = CookieJar::new().add(state.sessions.session_cookie(state.sessions.issue("martin")));
    assert_eq!(
        current_user(&state, &jar),
        Some(CurrentUser { username: "martin".into(), display_name: "Martin".into() })
    );
}

#[test]
fn current_user_without_cookie_is_none() {
    assert_eq!(current_user(&test_app_state(), &CookieJar::new()), None);
}
