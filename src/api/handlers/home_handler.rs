//! Home page.

use axum::response::Html;

use crate::api::extractors::Messages;
use crate::api::templates::{render, HomePage};
use crate::errors::AppResult;

/// GET / - static landing page
pub async fn home(messages: Messages) -> AppResult<Html<String>> {
    render(&HomePage {
        messages: messages.take().await?,
    })
}
