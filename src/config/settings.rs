//! Application settings loaded from environment variables.

use std::env;

use super::constants::{
    DEFAULT_DATABASE_URL, DEFAULT_FROM_EMAIL, DEFAULT_PUBLIC_URL, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT, DEFAULT_SMTP_PORT, DEFAULT_VERIFICATION_TOKEN_HOURS,
    MIN_SECRET_KEY_LENGTH,
};

/// Outgoing mail settings. `host == None` means development mode:
/// messages are logged instead of sent.
#[derive(Clone, Default)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    password: Option<String>,
    pub from: String,
    pub tls: bool,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from", &self.from)
            .field("tls", &self.tls)
            .finish()
    }
}

impl SmtpConfig {
    /// Whether a real SMTP relay is configured.
    pub fn is_configured(&self) -> bool {
        self.host.is_some()
    }

    /// SMTP password, if any.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    fn from_env() -> Self {
        Self {
            host: env::var("SMTP_HOST").ok().filter(|h| !h.is_empty()),
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            username: env::var("SMTP_USER").ok(),
            password: env::var("SMTP_PASS").ok(),
            from: env::var("SMTP_FROM").unwrap_or_else(|_| DEFAULT_FROM_EMAIL.to_string()),
            tls: env_flag("SMTP_TLS").unwrap_or(true),
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    secret_key: String,
    pub server_host: String,
    pub server_port: u16,
    /// Base URL used to build absolute links in emails
    pub public_url: String,
    /// New accounts start inactive until the email address is verified
    pub require_email_verification: bool,
    pub verification_token_hours: i64,
    /// Mark the session cookie `Secure` (HTTPS only)
    pub secure_cookies: bool,
    pub smtp: SmtpConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("public_url", &self.public_url)
            .field("require_email_verification", &self.require_email_verification)
            .field("verification_token_hours", &self.verification_token_hours)
            .field("secure_cookies", &self.secure_cookies)
            .field("smtp", &self.smtp)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if SECRET_KEY is not set in release builds or is too short.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let secret_key = env::var("SECRET_KEY").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                tracing::warn!("SECRET_KEY not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            } else {
                panic!("SECRET_KEY environment variable must be set in production");
            }
        });

        if secret_key.len() < MIN_SECRET_KEY_LENGTH {
            panic!(
                "SECRET_KEY must be at least {} characters long",
                MIN_SECRET_KEY_LENGTH
            );
        }

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            secret_key,
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            public_url: env::var("PUBLIC_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_PUBLIC_URL.to_string()),
            require_email_verification: env_flag("REQUIRE_EMAIL_VERIFICATION").unwrap_or(true),
            verification_token_hours: env::var("VERIFICATION_TOKEN_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_VERIFICATION_TOKEN_HOURS),
            secure_cookies: env_flag("SECURE_COOKIES").unwrap_or(!cfg!(debug_assertions)),
            smtp: SmtpConfig::from_env(),
        }
    }

    /// Build a configuration directly, without touching the environment.
    pub fn new(database_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            secret_key: secret_key.into(),
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            require_email_verification: true,
            verification_token_hours: DEFAULT_VERIFICATION_TOKEN_HOURS,
            secure_cookies: false,
            smtp: SmtpConfig {
                port: DEFAULT_SMTP_PORT,
                from: DEFAULT_FROM_EMAIL.to_string(),
                tls: true,
                ..SmtpConfig::default()
            },
        }
    }

    /// Get secret key bytes for token signing/verification.
    pub fn secret_key_bytes(&self) -> &[u8] {
        self.secret_key.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Parse a boolean environment flag (`true`/`1`/`yes` or `false`/`0`/`no`).
fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
