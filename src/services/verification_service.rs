//! Email verification - signed links that activate new accounts.
//!
//! A link carries a signed token naming the user and a stamp of the
//! account's `updated_at`. Any change to the account (activation, a new
//! password) moves the stamp, so each link works at most once.

use askama::Template;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{
    Config, ROUTE_VERIFY_EMAIL_PREFIX, TOKEN_PURPOSE_EMAIL_VERIFICATION,
    VERIFICATION_EMAIL_SUBJECT,
};
use crate::domain::User;
use crate::errors::{AppError, AppResult};
use crate::infra::{Mailer, OutgoingEmail, UnitOfWork};

/// Verification token payload
#[derive(Debug, Serialize, Deserialize)]
pub struct VerificationClaims {
    pub sub: Uuid,
    pub stamp: i64,
    pub purpose: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and checks verification tokens.
#[derive(Clone)]
pub struct VerificationTokens {
    secret: Vec<u8>,
    lifetime: Duration,
}

impl VerificationTokens {
    pub fn new(secret: &[u8], lifetime_hours: i64) -> Self {
        Self {
            secret: secret.to_vec(),
            lifetime: Duration::hours(lifetime_hours),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.secret_key_bytes(), config.verification_token_hours)
    }

    /// Sign a token bound to the user's current state.
    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = VerificationClaims {
            sub: user.id,
            stamp: user.state_stamp(),
            purpose: TOKEN_PURPOSE_EMAIL_VERIFICATION.to_string(),
            exp: (now + self.lifetime).timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )?)
    }

    /// Check signature, expiry and purpose.
    pub fn decode(&self, token: &str) -> AppResult<VerificationClaims> {
        let data = decode::<VerificationClaims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::default(),
        )?;

        if data.claims.purpose != TOKEN_PURPOSE_EMAIL_VERIFICATION {
            return Err(AppError::validation("Token issued for another purpose"));
        }

        Ok(data.claims)
    }

    /// Whether decoded claims still describe this user as it is now.
    pub fn matches(claims: &VerificationClaims, user: &User) -> bool {
        claims.sub == user.id && claims.stamp == user.state_stamp()
    }
}

/// Result of following a verification link
#[derive(Debug)]
pub enum VerifyOutcome {
    Activated(User),
    AlreadyActive(User),
    Invalid,
}

/// Result of a resend request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendOutcome {
    Sent,
    AlreadyActive,
    UnknownEmail,
}

/// Verification service trait for dependency injection.
#[async_trait]
pub trait VerificationService: Send + Sync {
    /// Email a fresh verification link to the user.
    async fn send_verification(&self, user: &User) -> AppResult<()>;

    /// Activate the account named by a link token.
    async fn verify(&self, token: &str) -> AppResult<VerifyOutcome>;

    /// Send a new link to an inactive account, if one exists for the email.
    async fn resend(&self, email: &str) -> AppResult<ResendOutcome>;
}

#[derive(Template)]
#[template(path = "emails/verification.html")]
struct VerificationEmailHtml<'a> {
    user: &'a User,
    link: &'a str,
    year: i32,
}

#[derive(Template)]
#[template(path = "emails/verification.txt")]
struct VerificationEmailText<'a> {
    user: &'a User,
    link: &'a str,
}

/// Concrete implementation of VerificationService.
pub struct EmailVerifier<U: UnitOfWork> {
    uow: Arc<U>,
    mailer: Arc<dyn Mailer>,
    tokens: VerificationTokens,
    public_url: String,
}

impl<U: UnitOfWork> EmailVerifier<U> {
    pub fn new(
        uow: Arc<U>,
        mailer: Arc<dyn Mailer>,
        tokens: VerificationTokens,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            uow,
            mailer,
            tokens,
            public_url: public_url.into(),
        }
    }

    fn link_for(&self, token: &str) -> String {
        format!("{}{}{}", self.public_url, ROUTE_VERIFY_EMAIL_PREFIX, token)
    }

    fn render_email(&self, user: &User, link: &str) -> AppResult<OutgoingEmail> {
        use chrono::Datelike;

        let html_body = VerificationEmailHtml {
            user,
            link,
            year: Utc::now().year(),
        }
        .render()?;
        let text_body = VerificationEmailText { user, link }.render()?;

        Ok(OutgoingEmail {
            to: user.email.clone(),
            subject: VERIFICATION_EMAIL_SUBJECT.to_string(),
            text_body,
            html_body,
        })
    }
}

#[async_trait]
impl<U: UnitOfWork> VerificationService for EmailVerifier<U> {
    async fn send_verification(&self, user: &User) -> AppResult<()> {
        let token = self.tokens.issue(user)?;
        let link = self.link_for(&token);
        let email = self.render_email(user, &link)?;

        self.mailer.send(email).await?;
        tracing::info!(email = %user.email, "Verification email sent");
        Ok(())
    }

    async fn verify(&self, token: &str) -> AppResult<VerifyOutcome> {
        let claims = match self.tokens.decode(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected verification token");
                return Ok(VerifyOutcome::Invalid);
            }
        };

        let Some(mut user) = self.uow.users().find_by_id(claims.sub).await? else {
            tracing::warn!(user_id = %claims.sub, "Verification token for unknown user");
            return Ok(VerifyOutcome::Invalid);
        };

        if user.is_active {
            tracing::info!(email = %user.email, "Verification link for already active account");
            return Ok(VerifyOutcome::AlreadyActive(user));
        }

        if !VerificationTokens::matches(&claims, &user) {
            tracing::warn!(email = %user.email, "Stale verification token");
            return Ok(VerifyOutcome::Invalid);
        }

        user.activate();
        let user = self.uow.users().save(user).await?;
        tracing::info!(email = %user.email, "Email verified, account activated");
        Ok(VerifyOutcome::Activated(user))
    }

    async fn resend(&self, email: &str) -> AppResult<ResendOutcome> {
        let Some(user) = self.uow.users().find_by_email(email).await? else {
            tracing::info!(email = %email, "Verification resend for unknown email");
            return Ok(ResendOutcome::UnknownEmail);
        };

        if user.is_active {
            tracing::info!(email = %email, "Verification resend for active account");
            return Ok(ResendOutcome::AlreadyActive);
        }

        self.send_verification(&user).await?;
        Ok(ResendOutcome::Sent)
    }
}
