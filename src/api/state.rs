//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Database, Mailer};
use crate::services::{AccountService, ServiceContainer, Services, VerificationService};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Registration and login
    pub accounts: Arc<dyn AccountService>,
    /// Verification emails and links
    pub verification: Arc<dyn VerificationService>,
    /// Database handle for health checks; absent when services are mocked
    pub database: Option<Arc<Database>>,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
}

impl AppState {
    /// Create application state with manually injected services.
    pub fn new(
        accounts: Arc<dyn AccountService>,
        verification: Arc<dyn VerificationService>,
    ) -> Self {
        Self {
            accounts,
            verification,
            database: None,
            secure_cookies: false,
        }
    }

    /// Take every service from a container.
    pub fn from_container<C: ServiceContainer + ?Sized>(container: &C) -> Self {
        Self::new(container.accounts(), container.verification())
    }

    /// Create application state from database connection and config.
    pub fn from_config(database: Arc<Database>, config: &Config, mailer: Arc<dyn Mailer>) -> Self {
        let container = Services::from_connection(database.get_connection(), config, mailer);

        Self::from_container(&container)
            .with_database(database)
            .with_secure_cookies(config.secure_cookies)
    }

    pub fn with_database(mut self, database: Arc<Database>) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}
