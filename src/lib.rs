//! Baseball Pick 4 web - the public front door of the game
//!
//! Server-rendered pages for the home page, account registration, login
//! and email verification, built on Axum with askama templates and
//! session-backed flash messages.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Users and passwords
//! - **services**: Account and email verification use cases
//! - **infra**: Database, repositories, outgoing email
//! - **api**: HTTP handlers, forms, templates, and routes
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{NewAccount, Password, User};
pub use errors::{AppError, AppResult};
