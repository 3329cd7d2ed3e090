//! Domain layer - Core business entities and logic
//!
//! Accounts and their credentials, independent of storage and HTTP.

pub mod password;
pub mod user;

pub use password::Password;
pub use user::{NewAccount, User};
