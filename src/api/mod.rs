//! API layer - HTTP handlers and pages
//!
//! This module contains all HTTP-related concerns:
//! - Request handlers
//! - Form bindings and flash messages
//! - Templates
//! - Route definitions

pub mod extractors;
pub mod forms;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod templates;

pub use routes::create_router;
pub use state::AppState;
