//! Serve command - Starts the HTTP server.

use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{mailer, sessions, Database};

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    // Initialize database (runs pending migrations)
    let db = Arc::new(Database::connect(&config).await?);
    tracing::info!("Database connected");

    let session_store = sessions::postgres_store(&db).await?;
    let cleanup = sessions::spawn_expired_cleanup(session_store.clone());

    let mailer = mailer::from_config(&config.smtp)?;

    let app_state = AppState::from_config(db, &config, mailer);
    let app = create_router(app_state, session_store);

    let addr = args.bind_addr(&config);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!(
        require_email_verification = config.require_email_verification,
        "Server running on http://{}",
        addr
    );

    let served = axum::serve(listener, app)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)));

    cleanup.abort();
    served
}
