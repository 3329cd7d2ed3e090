//! One-time flash messages stored in the visitor's session.
//!
//! A handler queues a message, the next page that renders takes the whole
//! queue and displays it. Taking empties the queue.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::config::SESSION_KEY_FLASH;
use crate::errors::{AppError, AppResult};

/// Message severity, rendered as a CSS class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl FlashLevel {
    /// Bootstrap alert class
    pub fn css_class(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Warning => "warning",
            FlashLevel::Error => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

/// Extractor giving handlers access to the flash queue.
#[derive(Clone)]
pub struct Messages {
    session: Session,
}

#[async_trait]
impl<S> FromRequestParts<S> for Messages
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::internal(format!("Session unavailable: {}", msg)))?;

        Ok(Self { session })
    }
}

impl Messages {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session, for handlers that also manage login state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Queue a message for the next rendered page.
    pub async fn add(&self, level: FlashLevel, text: impl Into<String>) -> AppResult<()> {
        let mut queue: Vec<FlashMessage> = self
            .session
            .get(SESSION_KEY_FLASH)
            .await?
            .unwrap_or_default();

        queue.push(FlashMessage {
            level,
            text: text.into(),
        });

        self.session.insert(SESSION_KEY_FLASH, queue).await?;
        Ok(())
    }

    pub async fn success(&self, text: impl Into<String>) -> AppResult<()> {
        self.add(FlashLevel::Success, text).await
    }

    pub async fn info(&self, text: impl Into<String>) -> AppResult<()> {
        self.add(FlashLevel::Info, text).await
    }

    pub async fn warning(&self, text: impl Into<String>) -> AppResult<()> {
        self.add(FlashLevel::Warning, text).await
    }

    pub async fn error(&self, text: impl Into<String>) -> AppResult<()> {
        self.add(FlashLevel::Error, text).await
    }

    /// Remove and return every queued message.
    pub async fn take(&self) -> AppResult<Vec<FlashMessage>> {
        Ok(self
            .session
            .remove::<Vec<FlashMessage>>(SESSION_KEY_FLASH)
            .await?
            .unwrap_or_default())
    }
}
