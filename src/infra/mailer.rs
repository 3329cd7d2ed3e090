//! Outgoing email.
//!
//! With `SMTP_HOST` set, mail goes out through an async lettre SMTP
//! transport. Without it (development mode) messages are written to the
//! log instead of sent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// SMTP command timeout
const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A rendered message, plain text plus HTML alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Mail delivery abstraction.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()>;
}

/// Pick the mailer matching the configuration.
pub fn from_config(config: &SmtpConfig) -> AppResult<Arc<dyn Mailer>> {
    if config.is_configured() {
        Ok(Arc::new(SmtpMailer::new(config)?))
    } else {
        tracing::warn!("SMTP not configured - emails will be logged instead of sent");
        Ok(Arc::new(LogMailer::new(config.from.clone())))
    }
}

/// Development mailer: logs instead of sending.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        tracing::info!(
            "=== EMAIL (not sent) ===\n\
             From: {}\n\
             To: {}\n\
             Subject: {}\n\
             Body:\n{}\n\
             ========================",
            self.from,
            email.to,
            email.subject,
            email.text_body
        );
        Ok(())
    }
}

/// SMTP mailer over lettre's tokio transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| AppError::internal("SMTP_HOST is not set"))?;

        let builder = if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| AppError::mail(format!("Invalid SMTP relay {}: {}", host, e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };

        let mut builder = builder.port(config.port).timeout(Some(SMTP_TIMEOUT));
        if let (Some(user), Some(pass)) = (config.username.as_ref(), config.password()) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.to_string()));
        }

        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| AppError::internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        tracing::info!(host = %host, port = config.port, "SMTP mailer initialized");

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| AppError::mail(format!("Invalid recipient {}: {}", email.to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .multipart(MultiPart::alternative_plain_html(
                email.text_body,
                email.html_body,
            ))
            .map_err(|e| AppError::mail(e.to_string()))?;

        match self.transport.send(message).await {
            Ok(_) => {
                tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(to = %email.to, error = %e, "Failed to send email");
                Err(AppError::mail(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            to: "fan@example.com".to_string(),
            subject: "Hello".to_string(),
            text_body: "plain".to_string(),
            html_body: "<p>html</p>".to_string(),
        }
    }

    #[test]
    fn test_log_mailer_always_succeeds() {
        let mailer = LogMailer::new("noreply@example.com");
        assert!(tokio_test::block_on(mailer.send(email())).is_ok());
    }

    #[test]
    fn test_unconfigured_smtp_falls_back_to_log_mailer() {
        let config = SmtpConfig::default();
        let mailer = from_config(&config).unwrap();
        assert!(tokio_test::block_on(mailer.send(email())).is_ok());
    }

    #[test]
    fn test_smtp_mailer_requires_host() {
        assert!(SmtpMailer::new(&SmtpConfig::default()).is_err());
    }
}
