//! # Taskpad API Server
//!
//! The Taskpad API server binary. Provides:
//! - Account registration, login, and JWT-based sessions
//! - Per-user task CRUD
//! - Publicly readable wiki pages with owner-only mutation
//! - A shared message log
//! - Redis-backed rate limiting (optional; disabled without `REDIS_URL`)
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskpad-api
//! ```

use taskpad_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskpad_shared::db;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskpad_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Taskpad API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    // Database pool + migrations
    let pool_config = db::pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    };
    let pool = db::pool::create_pool(pool_config).await?;
    db::migrations::run_migrations(&pool).await?;

    // Redis is optional; without it rate limiting is disabled.
    let redis = match &config.redis.url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            let manager = redis::aio::ConnectionManager::new(client).await?;
            tracing::info!("Connected to Redis, rate limiting enabled");
            Some(manager)
        }
        None => {
            tracing::warn!("REDIS_URL not set, rate limiting disabled");
            None
        }
    };

    let bind_address = config.bind_address();
    let state = AppState::new(pool, redis, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM, triggering graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
