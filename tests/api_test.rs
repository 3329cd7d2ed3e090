//! Integration tests for the page handlers.
//!
//! These tests drive the real router with hand-written mock services, so
//! no database or SMTP server is required. Sessions live in the router's
//! in-memory store; the cookie from one response is replayed on the next
//! request to follow flash messages across redirects.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;
use tower_sessions::session::Id;
use tower_sessions::{MemoryStore, SessionStore};
use uuid::Uuid;

use pick4_web::api::{create_router, AppState};
use pick4_web::domain::{NewAccount, User};
use pick4_web::errors::{AppError, AppResult, FormErrors};
use pick4_web::services::{
    AccountService, ResendOutcome, VerificationService, VerifyOutcome, USERNAME_TAKEN,
};

// =============================================================================
// Mock Services for Testing
// =============================================================================

/// Mock account service: every new account gets the configured active flag
struct MockAccountService {
    activate_on_signup: bool,
}

fn make_user(username: &str, is_active: bool) -> User {
    User::new(
        Uuid::new_v4(),
        NewAccount {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password: String::new(),
        },
        "hashed".to_string(),
        is_active,
    )
}

#[async_trait]
impl AccountService for MockAccountService {
    async fn register(&self, account: NewAccount) -> AppResult<User> {
        if account.username == "taken" {
            let mut errors = FormErrors::new();
            errors.add("username", USERNAME_TAKEN);
            return Err(errors.into());
        }
        if account.username == "explode" {
            return Err(AppError::internal("database went away"));
        }
        Ok(make_user(&account.username, self.activate_on_signup))
    }

    async fn check_unique(
        &self,
        username: Option<&str>,
        _email: Option<&str>,
    ) -> AppResult<FormErrors> {
        let mut errors = FormErrors::new();
        if username == Some("taken") {
            errors.add("username", USERNAME_TAKEN);
        }
        Ok(errors)
    }

    async fn authenticate(&self, username: &str, password: &str) -> AppResult<User> {
        match (username, password) {
            ("fan", "TestPass123!") => Ok(make_user("fan", true)),
            ("sleeper", "TestPass123!") => Err(AppError::InactiveAccount),
            _ => Err(AppError::InvalidCredentials),
        }
    }
}

/// Mock verification service that counts outgoing emails
struct MockVerificationService {
    fail_sending: bool,
    sent: Arc<AtomicUsize>,
}

#[async_trait]
impl VerificationService for MockVerificationService {
    async fn send_verification(&self, _user: &User) -> AppResult<()> {
        if self.fail_sending {
            return Err(AppError::mail("connection refused"));
        }
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn verify(&self, token: &str) -> AppResult<VerifyOutcome> {
        Ok(match token {
            "fresh" => VerifyOutcome::Activated(make_user("fan", true)),
            "used" => VerifyOutcome::AlreadyActive(make_user("fan", true)),
            _ => VerifyOutcome::Invalid,
        })
    }

    async fn resend(&self, email: &str) -> AppResult<ResendOutcome> {
        match email {
            "inactive@example.com" => Ok(ResendOutcome::Sent),
            "active@example.com" => Ok(ResendOutcome::AlreadyActive),
            "down@example.com" => Err(AppError::mail("connection refused")),
            _ => Ok(ResendOutcome::UnknownEmail),
        }
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

struct TestApp {
    router: Router,
    sent: Arc<AtomicUsize>,
}

fn app(activate_on_signup: bool, fail_sending: bool) -> TestApp {
    app_with_store(activate_on_signup, fail_sending, MemoryStore::default())
}

fn app_with_store(activate_on_signup: bool, fail_sending: bool, store: MemoryStore) -> TestApp {
    let sent = Arc::new(AtomicUsize::new(0));
    let state = AppState::new(
        Arc::new(MockAccountService { activate_on_signup }),
        Arc::new(MockVerificationService {
            fail_sending,
            sent: sent.clone(),
        }),
    );

    TestApp {
        router: create_router(state, store),
        sent,
    }
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// `name=value` pair of the session cookie set by a response
fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response sets a session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect has a location")
        .to_str()
        .unwrap()
}

const VALID_REGISTRATION: &str = "username=testuser&first_name=Test&last_name=User\
    &email=test%40example.com&password1=TestPass123%21&password2=TestPass123%21\
    &agree_to_terms=on";

/// Follow a redirect carrying the session and return the rendered page.
async fn follow(router: &Router, response: Response) -> String {
    let cookie = session_cookie(&response);
    let target = location(&response).to_string();
    body_text(send(router, get(&target, Some(&cookie))).await).await
}

// =============================================================================
// Home
// =============================================================================

#[tokio::test]
async fn test_home_renders() {
    let app = app(true, false);
    let response = send(&app.router, get("/", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Welcome to Baseball Pick 4"));
    assert!(!body.contains("alert-"));
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_get_shows_empty_form() {
    let app = app(true, false);
    let response = send(&app.router, get("/register", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("name=\"username\""));
    assert!(body.contains("name=\"password2\""));
    assert!(!body.contains("invalid-feedback"));
    assert!(!body.contains("alert-danger"));
}

#[tokio::test]
async fn test_register_active_user_redirects_to_login() {
    let app = app(true, false);
    let response = send(&app.router, post_form("/register", VALID_REGISTRATION, None)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let page = follow(&app.router, response).await;
    assert!(page.contains("Account created for testuser! You can now log in."));
    assert!(page.contains("alert-success"));
    assert_eq!(app.sent.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_register_inactive_user_sends_verification() {
    let app = app(false, false);
    let response = send(&app.router, post_form("/register", VALID_REGISTRATION, None)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let page = follow(&app.router, response).await;
    assert!(page
        .contains("Account created for testuser! Please check your email to verify your account."));
    assert_eq!(app.sent.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_register_mail_failure_still_redirects_with_warning() {
    let app = app(false, true);
    let response = send(&app.router, post_form("/register", VALID_REGISTRATION, None)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let page = follow(&app.router, response).await;
    assert!(page.contains(
        "Account created for testuser, but there was an issue sending the verification email."
    ));
    assert!(page.contains("alert-warning"));
}

#[tokio::test]
async fn test_register_invalid_rerenders_with_errors() {
    let app = app(true, false);
    let body = "username=testuser&first_name=Test&last_name=User&email=invalid-email\
        &password1=TestPass123%21&password2=Different123%21&agree_to_terms=on";
    let response = send(&app.router, post_form("/register", body, None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::LOCATION).is_none());

    let page = body_text(response).await;
    assert!(page.contains("Please correct the errors below."));
    assert!(page.contains("Enter a valid email address."));
    assert!(page.contains("The two password fields must match."));
    assert!(page.contains("value=\"testuser\""));
    assert!(!page.contains("TestPass123"));
}

#[tokio::test]
async fn test_register_empty_submission() {
    let app = app(true, false);
    let response = send(&app.router, post_form("/register", "", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("This field is required."));
    assert!(page.contains("You must agree to the terms to register."));
}

#[tokio::test]
async fn test_register_taken_username() {
    let app = app(true, false);
    let body = VALID_REGISTRATION.replace("username=testuser", "username=taken");
    let response = send(&app.router, post_form("/register", &body, None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains(USERNAME_TAKEN));
    assert!(page.contains("Please correct the errors below."));
}

#[tokio::test]
async fn test_register_taken_username_shown_with_other_errors() {
    let app = app(true, false);
    let body = VALID_REGISTRATION
        .replace("username=testuser", "username=taken")
        .replace("password2=TestPass123%21", "password2=Different123%21");
    let response = send(&app.router, post_form("/register", &body, None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("The two password fields must match."));
    assert!(page.contains(USERNAME_TAKEN));
}

#[tokio::test]
async fn test_register_blank_terms_value_is_unticked() {
    let app = app(true, false);
    let body = VALID_REGISTRATION.replace("agree_to_terms=on", "agree_to_terms=");
    let response = send(&app.router, post_form("/register", &body, None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("You must agree to the terms to register."));
}

#[tokio::test]
async fn test_register_storage_failure_is_server_error() {
    let app = app(true, false);
    let body = VALID_REGISTRATION.replace("username=testuser", "username=explode");
    let response = send(&app.router, post_form("/register", &body, None)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let page = body_text(response).await;
    assert!(!page.contains("database went away"));
}

#[tokio::test]
async fn test_register_rejects_other_methods() {
    let app = app(true, false);
    let request = Request::builder()
        .method("PUT")
        .uri("/register")
        .body(Body::empty())
        .unwrap();
    let response = send(&app.router, request).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_flash_message_shows_once() {
    let app = app(true, false);
    let response = send(&app.router, post_form("/register", VALID_REGISTRATION, None)).await;
    let cookie = session_cookie(&response);

    let first = body_text(send(&app.router, get("/login", Some(&cookie))).await).await;
    let second = body_text(send(&app.router, get("/login", Some(&cookie))).await).await;

    assert!(first.contains("Account created for testuser!"));
    assert!(!second.contains("Account created for testuser!"));
}

// =============================================================================
// Login / Logout
// =============================================================================

#[tokio::test]
async fn test_login_success_redirects_home() {
    let app = app(true, false);
    let response = send(
        &app.router,
        post_form("/login", "username=fan&password=TestPass123%21", None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(response.headers().get(header::SET_COOKIE).is_some());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = app(true, false);
    let response = send(
        &app.router,
        post_form("/login", "username=fan&password=wrong", None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Please enter a correct username and password."));
    assert!(page.contains("value=\"fan\""));
}

#[tokio::test]
async fn test_login_inactive_account() {
    let app = app(true, false);
    let response = send(
        &app.router,
        post_form("/login", "username=sleeper&password=TestPass123%21", None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("This account is inactive. Please verify your email address."));
}

#[tokio::test]
async fn test_logout_flashes_and_redirects_home() {
    let app = app(true, false);
    let login = send(
        &app.router,
        post_form("/login", "username=fan&password=TestPass123%21", None),
    )
    .await;
    let cookie = session_cookie(&login);

    let response = send(&app.router, post_form("/logout", "", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let page = follow(&app.router, response).await;
    assert!(page.contains("You have been logged out."));
}

// =============================================================================
// Email Verification
// =============================================================================

#[tokio::test]
async fn test_verify_fresh_link() {
    let app = app(false, false);
    let response = send(&app.router, get("/verify-email/fresh", None)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let page = follow(&app.router, response).await;
    assert!(page.contains("Your email has been verified successfully! You can now log in."));
}

#[tokio::test]
async fn test_verify_used_link() {
    let app = app(false, false);
    let response = send(&app.router, get("/verify-email/used", None)).await;

    assert_eq!(location(&response), "/login");
    let page = follow(&app.router, response).await;
    assert!(page.contains("Your account is already verified. You can log in now."));
    assert!(page.contains("alert-info"));
}

#[tokio::test]
async fn test_verify_invalid_link() {
    let app = app(false, false);
    let response = send(&app.router, get("/verify-email/garbage", None)).await;

    assert_eq!(location(&response), "/resend-verification");
    let page = follow(&app.router, response).await;
    assert!(page.contains("The verification link is invalid or has expired."));
}

#[tokio::test]
async fn test_resend_blank_email() {
    let app = app(false, false);
    let response = send(
        &app.router,
        post_form("/resend-verification", "email=+", None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Please enter your email address."));
}

#[tokio::test]
async fn test_resend_sent() {
    let app = app(false, false);
    let response = send(
        &app.router,
        post_form("/resend-verification", "email=inactive%40example.com", None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/verification-sent");
    let page = follow(&app.router, response).await;
    assert!(page.contains("A new verification email has been sent."));
}

#[tokio::test]
async fn test_resend_unknown_email_does_not_reveal() {
    let app = app(false, false);
    let response = send(
        &app.router,
        post_form("/resend-verification", "email=nobody%40example.com", None),
    )
    .await;

    assert_eq!(location(&response), "/login");
    let page = follow(&app.router, response).await;
    assert!(page.contains("If an account with that email exists and is not verified"));
}

#[tokio::test]
async fn test_resend_already_active() {
    let app = app(false, false);
    let response = send(
        &app.router,
        post_form("/resend-verification", "email=active%40example.com", None),
    )
    .await;

    assert_eq!(location(&response), "/login");
    let page = follow(&app.router, response).await;
    assert!(page.contains("This account is already verified. You can log in now."));
}

#[tokio::test]
async fn test_resend_mail_failure_rerenders() {
    let app = app(false, false);
    let response = send(
        &app.router,
        post_form("/resend-verification", "email=down%40example.com", None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("There was an error sending the verification email."));
    assert!(page.contains("down@example.com"));
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_without_database() {
    let app = app(true, false);
    let response = send(&app.router, get("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["status"], "not_configured");
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_sessions_are_kept_in_the_supplied_store() {
    let store = MemoryStore::default();
    let app = app_with_store(true, false, store.clone());

    let response = send(&app.router, post_form("/register", VALID_REGISTRATION, None)).await;
    let cookie = session_cookie(&response);
    let id: Id = cookie
        .split_once('=')
        .map(|(_, value)| value)
        .unwrap()
        .parse()
        .unwrap();

    let record = store
        .load(&id)
        .await
        .unwrap()
        .expect("session saved in the supplied store");
    assert!(record.data.contains_key("_messages"));
}
