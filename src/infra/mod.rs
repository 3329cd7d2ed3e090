//! Infrastructure layer - External systems integration
//!
//! - Database connection and migrations
//! - Repositories behind a Unit of Work
//! - Session storage
//! - Outgoing email

pub mod db;
pub mod mailer;
pub mod repositories;
pub mod sessions;
pub mod unit_of_work;

pub use db::{Database, Migrator};
pub use mailer::{LogMailer, Mailer, OutgoingEmail, SmtpMailer};
pub use repositories::{UserRepository, UserStore};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use mailer::MockMailer;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::MockUserRepository;
