//! Postgres-backed session storage.
//!
//! Sessions share the application's connection pool. Expired rows are
//! swept by a background task for as long as the server runs.

use std::time::Duration;

use tokio::task::JoinHandle;
use tower_sessions::session_store::ExpiredDeletion;
use tower_sessions_sqlx_store::PostgresStore;

use super::Database;
use crate::config::SESSION_CLEANUP_INTERVAL_SECS;
use crate::errors::{AppError, AppResult};

/// Open the session store, creating its table if needed.
pub async fn postgres_store(db: &Database) -> AppResult<PostgresStore> {
    let pool = db.get_connection().get_postgres_connection_pool().clone();
    let store = PostgresStore::new(pool);

    store
        .migrate()
        .await
        .map_err(|e| AppError::internal(format!("Session table migration failed: {}", e)))?;

    tracing::info!("Session store ready");
    Ok(store)
}

/// Delete expired sessions periodically until the task is aborted.
pub fn spawn_expired_cleanup(store: PostgresStore) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_secs(SESSION_CLEANUP_INTERVAL_SECS);
        if let Err(e) = store.continuously_delete_expired(period).await {
            tracing::error!(error = %e, "Expired session cleanup stopped");
        }
    })
}
