//! Fitbot
//!
//! A check-in chat bot served as OneBot V11/V12 webhooks.
//!
//! ## Architecture
//!
//! - Routes: webhook and health endpoints
//! - Adapters: OneBot event parsing and reply encoding
//! - Bot: commands, conversations and handlers
//! - Services / Repositories: business logic and PostgreSQL access

use anyhow::Result;
use fitbot_backend::{
    bot::{InMemorySessionStore, RedisSessionStore, SessionStore},
    config, db, routes,
    state::AppState,
};
use redis::aio::ConnectionManager;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        "Starting Fitbot"
    );

    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database).await?;

    // Skipped in production, where a separate migration job runs
    if !config::AppConfig::is_production() {
        info!("Running database migrations...");
        db::run_migrations(&db_pool).await?;
    }

    let sessions = session_store(&config.redis.url).await;
    info!(backend = sessions.backend(), "Session store ready");

    let state = AppState::new(db_pool, sessions, config.clone())?;
    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Redis when reachable, otherwise process memory
async fn session_store(url: &str) -> Arc<dyn SessionStore> {
    info!("Connecting to Redis...");

    match redis::Client::open(url) {
        Ok(client) => match ConnectionManager::new(client).await {
            Ok(conn) => {
                info!("Redis connection established");
                Arc::new(RedisSessionStore::new(conn))
            }
            Err(e) => {
                warn!("Failed to connect to Redis: {}. Sessions will be kept in memory.", e);
                Arc::new(InMemorySessionStore::new())
            }
        },
        Err(e) => {
            warn!("Invalid Redis URL: {}. Sessions will be kept in memory.", e);
            Arc::new(InMemorySessionStore::new())
        }
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "fitbot_backend=info,fitbot=info,tower_http=info".into()
        } else {
            "fitbot_backend=debug,fitbot=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON lines for log aggregation
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Validate configuration for production deployment
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.onebot.access_token.as_deref().unwrap_or_default().is_empty() {
        errors.push("onebot.access_token must be set so webhooks cannot be forged");
    }

    if config.onebot.v11_api_url.is_none() && config.onebot.v12_api_url.is_none() {
        warn!("No OneBot API url configured - hello greetings and V12 replies are disabled");
    }

    if config.database.url.contains("localhost") || config.database.url.contains("127.0.0.1") {
        warn!("Database URL contains localhost - ensure this is intentional for production");
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
