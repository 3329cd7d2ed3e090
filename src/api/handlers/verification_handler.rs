//! Email verification links and resend requests.

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};

use crate::api::extractors::Messages;
use crate::api::forms::ResendVerificationForm;
use crate::api::templates::{render, ResendVerificationPage, VerificationSentPage};
use crate::api::AppState;
use crate::config::{ROUTE_LOGIN, ROUTE_RESEND_VERIFICATION, ROUTE_VERIFICATION_SENT};
use crate::errors::{AppError, AppResult};
use crate::services::{ResendOutcome, VerifyOutcome};

pub const MSG_VERIFIED: &str = "Your email has been verified successfully! You can now log in.";
pub const MSG_ALREADY_VERIFIED: &str = "Your account is already verified. You can log in now.";
pub const MSG_INVALID_LINK: &str =
    "The verification link is invalid or has expired. Please request a new verification email.";
pub const MSG_EMAIL_REQUIRED: &str = "Please enter your email address.";
pub const MSG_RESEND_UNKNOWN: &str =
    "If an account with that email exists and is not verified, we have sent a new verification email.";
pub const MSG_RESEND_ACTIVE: &str = "This account is already verified. You can log in now.";
pub const MSG_RESEND_SENT: &str = "A new verification email has been sent. Please check your inbox.";
pub const MSG_RESEND_FAILED: &str =
    "There was an error sending the verification email. Please try again later.";

/// GET /verify-email/:token
pub async fn verify_email(
    State(state): State<AppState>,
    messages: Messages,
    Path(token): Path<String>,
) -> AppResult<Redirect> {
    match state.verification.verify(&token).await? {
        VerifyOutcome::Activated(_) => {
            messages.success(MSG_VERIFIED).await?;
            Ok(Redirect::to(ROUTE_LOGIN))
        }
        VerifyOutcome::AlreadyActive(_) => {
            messages.info(MSG_ALREADY_VERIFIED).await?;
            Ok(Redirect::to(ROUTE_LOGIN))
        }
        VerifyOutcome::Invalid => {
            messages.error(MSG_INVALID_LINK).await?;
            Ok(Redirect::to(ROUTE_RESEND_VERIFICATION))
        }
    }
}

/// GET /resend-verification
pub async fn resend_page(messages: Messages) -> AppResult<Html<String>> {
    render(&ResendVerificationPage {
        email: String::new(),
        messages: messages.take().await?,
    })
}

/// POST /resend-verification
///
/// The unknown-email answer is worded so it does not reveal whether an
/// address is registered.
pub async fn resend(
    State(state): State<AppState>,
    messages: Messages,
    Form(form): Form<ResendVerificationForm>,
) -> AppResult<Response> {
    let email = form.email.trim();
    if email.is_empty() {
        messages.error(MSG_EMAIL_REQUIRED).await?;
        return resend_again(email, &messages).await;
    }

    match state.verification.resend(email).await {
        Ok(ResendOutcome::Sent) => {
            messages.success(MSG_RESEND_SENT).await?;
            Ok(Redirect::to(ROUTE_VERIFICATION_SENT).into_response())
        }
        Ok(ResendOutcome::AlreadyActive) => {
            messages.info(MSG_RESEND_ACTIVE).await?;
            Ok(Redirect::to(ROUTE_LOGIN).into_response())
        }
        Ok(ResendOutcome::UnknownEmail) => {
            messages.success(MSG_RESEND_UNKNOWN).await?;
            Ok(Redirect::to(ROUTE_LOGIN).into_response())
        }
        Err(AppError::Mail(reason)) => {
            tracing::error!(email = %email, reason = %reason, "Verification resend failed");
            messages.error(MSG_RESEND_FAILED).await?;
            resend_again(email, &messages).await
        }
        Err(e) => Err(e),
    }
}

async fn resend_again(email: &str, messages: &Messages) -> AppResult<Response> {
    let page = ResendVerificationPage {
        email: email.to_string(),
        messages: messages.take().await?,
    };
    Ok(render(&page)?.into_response())
}

/// GET /verification-sent
pub async fn verification_sent(messages: Messages) -> AppResult<Html<String>> {
    render(&VerificationSentPage {
        messages: messages.take().await?,
    })
}
