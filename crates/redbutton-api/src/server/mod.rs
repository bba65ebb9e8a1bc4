//! Server setup and initialization
//!
//! Provides the main application builder and server runner. Startup fails
//! fast when the database is unreachable or the billing price catalog
//! cannot be resolved.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use redbutton_common::{AppConfig, AppError, JwtService};
use redbutton_db::{
    create_pool, run_migrations, PgInviteRepository, PgUserDataRepository, PgUserRepository,
};
use redbutton_providers::{
    resolve_catalog, GoogleOAuthClient, OpenAiClientFactory, SmtpMailer, StripeClient,
};
use redbutton_service::ServiceContext;
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::apply_middleware_with_config;
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let config = state.config().clone();

    let api = apply_middleware_with_config(
        create_router(&state),
        &config.rate_limit,
        &config.cors,
        config.app.env.is_production(),
    );

    // Health stays outside the rate limiter
    api.merge(health_routes()).with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    // Create database pool
    info!("Connecting to PostgreSQL...");
    let db_config = redbutton_db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        ..Default::default()
    };
    let pool = create_pool(&db_config)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    run_migrations(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    // Create JWT service
    let jwt_service = Arc::new(JwtService::new(
        &config.auth.jwt_secret,
        config.auth.token_expiry_secs,
    ));

    // Create repositories
    let user_repo = Arc::new(PgUserRepository::new(pool.clone()));
    let invite_repo = Arc::new(PgInviteRepository::new(pool.clone()));
    let user_data_repo = Arc::new(PgUserDataRepository::new(pool));

    // Create external collaborators
    let billing = Arc::new(
        StripeClient::new(config.billing.secret_key.clone())
            .map_err(|e| AppError::Config(e.to_string()))?,
    );
    let completions = Arc::new(
        OpenAiClientFactory::new(&config.ai.api_key)
            .map_err(|e| AppError::Config(e.to_string()))?,
    );
    let oauth = Arc::new(
        GoogleOAuthClient::new(&config.oauth).map_err(|e| AppError::Config(e.to_string()))?,
    );
    let mailer =
        Arc::new(SmtpMailer::new(&config.email).map_err(|e| AppError::Config(e.to_string()))?);

    // Resolve the billing catalog; the process must not serve without it
    info!("Resolving billing product catalog...");
    let catalog = resolve_catalog(billing.as_ref(), &config.billing)
        .await
        .map_err(|e| AppError::Config(format!("Billing catalog resolution failed: {e}")))?;

    let service_context = ServiceContext::new(
        user_repo,
        invite_repo,
        user_data_repo,
        billing,
        completions,
        oauth,
        mailer,
        jwt_service,
        Arc::new(catalog),
        Arc::new(config),
    );

    Ok(AppState::new(service_context))
}

/// Run the HTTP server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

    // Create app state
    let state = create_app_state(config).await?;

    // Build application
    let app = create_app(state);

    // Run server
    run_server(app, addr).await
}
