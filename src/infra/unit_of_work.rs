//! Unit of Work: one place to reach every repository.
//!
//! Services depend on `UnitOfWork` rather than on concrete stores so the
//! whole persistence layer can be swapped for mocks in tests.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::repositories::{UserRepository, UserStore};

/// Repository registry for dependency injection.
pub trait UnitOfWork: Send + Sync {
    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;
}

/// Concrete implementation of UnitOfWork over a SeaORM connection pool
pub struct Persistence {
    user_repo: Arc<UserStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        let user_repo = Arc::new(UserStore::new(db));
        Self { user_repo }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }
}
