//! HTTP request handlers.

pub mod home_handler;
pub mod login_handler;
pub mod registration_handler;
pub mod verification_handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::api::AppState;
use crate::config::{
    ROUTE_HOME, ROUTE_LOGIN, ROUTE_REGISTER, ROUTE_RESEND_VERIFICATION, ROUTE_VERIFICATION_SENT,
};

/// Create the page routes
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(ROUTE_HOME, get(home_handler::home))
        .route(
            ROUTE_REGISTER,
            get(registration_handler::register_page).post(registration_handler::register),
        )
        .route(
            ROUTE_LOGIN,
            get(login_handler::login_page).post(login_handler::login),
        )
        .route("/logout", post(login_handler::logout))
        .route("/verify-email/:token", get(verification_handler::verify_email))
        .route(
            ROUTE_RESEND_VERIFICATION,
            get(verification_handler::resend_page).post(verification_handler::resend),
        )
        .route(
            ROUTE_VERIFICATION_SENT,
            get(verification_handler::verification_sent),
        )
}
