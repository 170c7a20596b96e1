mod config;
mod db;
mod routes;
mod services;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::services::{
    auth::AuthService,
    panel::{PanelClient, PanelCredentials},
    rate_limit::{RateLimiter, RateLimits},
    sync::{start_sync_task, SyncService},
    upstream::UpstreamPool,
};
use sqlx::PgPool;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub limiter: RateLimiter,
    pub upstream: UpstreamPool,
    pub auth: AuthService,
    pub start_time: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    // Initialize tracing/logging
    let default_filter = if config.debug {
        "xtream_gateway=debug,tower_http=debug"
    } else {
        "xtream_gateway=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Starting Xtream Gateway v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL connection pool
    let pool = create_pool(&config).await?;
    tracing::info!("PostgreSQL connected");

    // Run database migrations
    run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize services
    let client = PanelClient::new(config.upstream_timeout_secs, &config.upstream_user_agent)?;
    let upstream = UpstreamPool::new(pool.clone());
    let auth = AuthService::new(pool.clone(), upstream.clone(), client.clone(), &config);
    let limiter = RateLimiter::new(RateLimits {
        player_api_per_minute: config.rate_limit_player_api_per_minute,
        redirect_per_minute: config.rate_limit_redirect_per_minute,
    });

    // Start the catalog sync task (runs in background)
    if config.sync_enabled {
        match (&config.sync_username, &config.sync_password) {
            (Some(username), Some(password)) => {
                let creds = PanelCredentials {
                    username: username.clone(),
                    password: password.clone(),
                };
                let sync = SyncService::new(pool.clone(), upstream.clone(), client.clone(), &config)?;
                tokio::spawn(start_sync_task(sync, config.sync_interval_secs, creds));
                tracing::info!(
                    "Catalog sync task started (every {}s)",
                    config.sync_interval_secs
                );
            }
            _ => {
                tracing::warn!("Catalog sync enabled but SYNC_USERNAME/SYNC_PASSWORD not set, skipping");
            }
        }
    }

    // Build application state
    let state = Arc::new(AppState {
        config,
        pool,
        limiter,
        upstream,
        auth,
        start_time: Instant::now(),
    });

    // Build router; anything unmatched becomes an upstream redirect
    let app = Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/player_api.php", get(routes::player_api::player_api))
        .route("/xmltv.php", get(routes::guide::xmltv))
        .fallback(routes::redirect::redirect_any)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
