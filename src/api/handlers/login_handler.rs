//! Session login and logout.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};

use crate::api::extractors::Messages;
use crate::api::forms::LoginForm;
use crate::api::templates::{render, LoginPage};
use crate::api::AppState;
use crate::config::{ROUTE_HOME, SESSION_KEY_USER_ID};
use crate::errors::{AppError, AppResult};

pub const MSG_LOGGED_OUT: &str = "You have been logged out.";

/// GET /login
pub async fn login_page(messages: Messages) -> AppResult<Html<String>> {
    render(&LoginPage {
        username: String::new(),
        error: None,
        messages: messages.take().await?,
    })
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    messages: Messages,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let username = form.username.trim();

    match state.accounts.authenticate(username, &form.password).await {
        Ok(user) => {
            let session = messages.session();
            session.cycle_id().await?;
            session.insert(SESSION_KEY_USER_ID, user.id).await?;
            Ok(Redirect::to(ROUTE_HOME).into_response())
        }
        Err(e @ (AppError::InvalidCredentials | AppError::InactiveAccount)) => {
            let page = LoginPage {
                username: username.to_string(),
                error: Some(e.to_string()),
                messages: messages.take().await?,
            };
            Ok(render(&page)?.into_response())
        }
        Err(e) => Err(e),
    }
}

/// POST /logout
pub async fn logout(messages: Messages) -> AppResult<Redirect> {
    let session = messages.session();
    if let Some(user_id) = session.get::<uuid::Uuid>(SESSION_KEY_USER_ID).await? {
        tracing::info!(user_id = %user_id, "User logged out");
    }

    session.clear().await;
    session.cycle_id().await?;
    messages.info(MSG_LOGGED_OUT).await?;

    Ok(Redirect::to(ROUTE_HOME))
}
