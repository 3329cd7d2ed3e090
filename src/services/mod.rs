//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion.

mod account_service;
pub mod container;
mod verification_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use account_service::{AccountManager, AccountService, ACCOUNT_TAKEN, EMAIL_TAKEN, USERNAME_TAKEN};
pub use verification_service::{
    EmailVerifier, ResendOutcome, VerificationClaims, VerificationService, VerificationTokens,
    VerifyOutcome,
};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
