//! Service Container - Centralized service access.
//!
//! Builds every service once at start-up and hands out shared handles.

use std::sync::Arc;

use super::{AccountManager, AccountService, EmailVerifier, VerificationService, VerificationTokens};
use crate::config::Config;
use crate::infra::{Mailer, Persistence};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    /// Get account service
    fn accounts(&self) -> Arc<dyn AccountService>;

    /// Get email verification service
    fn verification(&self) -> Arc<dyn VerificationService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    account_service: Arc<dyn AccountService>,
    verification_service: Arc<dyn VerificationService>,
}

impl Services {
    /// Create service container from database connection, config and mailer
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        config: &Config,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db));
        let account_service = Arc::new(AccountManager::new(
            uow.clone(),
            config.require_email_verification,
        ));
        let verification_service = Arc::new(EmailVerifier::new(
            uow,
            mailer,
            VerificationTokens::from_config(config),
            config.public_url.clone(),
        ));

        Self {
            account_service,
            verification_service,
        }
    }
}

impl ServiceContainer for Services {
    fn accounts(&self) -> Arc<dyn AccountService> {
        self.account_service.clone()
    }

    fn verification(&self) -> Arc<dyn VerificationService> {
        self.verification_service.clone()
    }
}
