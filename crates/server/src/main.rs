use std::sync::Arc;

use server::config;
use server::db;
use server::matchmaking::{Matchmaker, PgSessionStore, SharedMatchmaker, SystemClock};
use server::routes;

use anyhow::Context;
use axum::{routing::{get, post}, Extension, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::pool::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Running migrations...");
    db::pool::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    let matchmaker: SharedMatchmaker = Arc::new(Matchmaker::new(
        PgSessionStore::new(pool.clone()),
        SystemClock,
        config.match_ttl(),
    ));
    let sweeper = matchmaker.spawn_sweeper(config.sweep_period());
    tracing::info!(
        ttl_secs = config.match_ttl_secs,
        sweep_secs = config.match_sweep_secs,
        "Matchmaking sweeper started"
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        // Auth
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/me", get(routes::auth::me))
        // Matchmaking
        .route("/api/match/request", post(routes::matchmaking::request_match))
        .route("/api/match/poll", get(routes::matchmaking::poll_match))
        .route("/api/match/cancel", post(routes::matchmaking::cancel_match))
        // Games
        .route("/api/games/{game_id}", get(routes::games::get_game))
        .route("/api/games/{game_id}/moves", post(routes::games::submit_move))
        .route("/api/games/{game_id}/resign", post(routes::games::resign))
        // History
        .route("/api/history/my-games", get(routes::history::my_games))
        .route("/api/history/match/{match_id}/moves", get(routes::history::match_moves))
        .route("/api/history/match/{match_id}/fen", get(routes::history::match_fen))
        // Rating
        .route("/api/rating/me", get(routes::rating::my_rating))
        .route("/api/rating/leaderboard", get(routes::rating::leaderboard))
        .route("/api/rating/user/{username}", get(routes::rating::user_rating))
        // Shared state
        .layer(Extension(pool))
        .layer(Extension(config.clone()))
        .layer(Extension(matchmaker))
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
