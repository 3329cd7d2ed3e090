//! Registration handlers.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};

use crate::api::extractors::Messages;
use crate::api::forms::RegistrationForm;
use crate::api::templates::{render, RegisterPage};
use crate::api::AppState;
use crate::config::ROUTE_LOGIN;
use crate::errors::{AppError, AppResult, FormErrors};

pub const MSG_CORRECT_ERRORS: &str = "Please correct the errors below.";

/// GET /register - empty form
pub async fn register_page(messages: Messages) -> AppResult<Html<String>> {
    render(&RegisterPage::unbound(messages.take().await?))
}

/// POST /register
///
/// A valid submission creates the account and always redirects to the
/// login page; the flash message tells the visitor whether the account is
/// usable yet. An invalid one re-renders the bound form.
pub async fn register(
    State(state): State<AppState>,
    messages: Messages,
    Form(form): Form<RegistrationForm>,
) -> AppResult<Response> {
    let account = match form.clean() {
        Ok(account) => account,
        Err(mut errors) => {
            let (username, email) = form.unique_candidates(&errors);
            if username.is_some() || email.is_some() {
                errors.merge(state.accounts.check_unique(username, email).await?);
            }
            return rejected(&form, errors, &messages).await;
        }
    };

    let user = match state.accounts.register(account).await {
        Ok(user) => user,
        Err(AppError::InvalidForm(errors)) => return rejected(&form, errors, &messages).await,
        Err(e) => return Err(e),
    };

    let username = &user.username;
    if user.is_active {
        messages
            .success(format!("Account created for {}! You can now log in.", username))
            .await?;
    } else {
        match state.verification.send_verification(&user).await {
            Ok(()) => {
                messages
                    .success(format!(
                        "Account created for {}! Please check your email to verify your account.",
                        username
                    ))
                    .await?;
            }
            Err(e) => {
                tracing::error!(
                    username = %username,
                    error = %e,
                    "Failed to send verification email after registration"
                );
                messages
                    .warning(format!(
                        "Account created for {}, but there was an issue sending the verification email. Please use the \"Resend Verification\" option.",
                        username
                    ))
                    .await?;
            }
        }
    }

    Ok(Redirect::to(ROUTE_LOGIN).into_response())
}

async fn rejected(
    form: &RegistrationForm,
    errors: FormErrors,
    messages: &Messages,
) -> AppResult<Response> {
    tracing::debug!(errors = %errors, "Registration form rejected");
    messages.error(MSG_CORRECT_ERRORS).await?;

    let page = RegisterPage::bound(form, errors, messages.take().await?);
    Ok(render(&page)?.into_response())
}
