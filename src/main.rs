use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use regexduel::{
    api,
    challenge::ChallengeCatalog,
    config::ServerConfig,
    reaper,
    state::RoomRegistry,
    types::ChallengeCategory,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "regexduel=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting regexduel...");

    let config = ServerConfig::from_env();

    let catalog = match &config.challenge_catalog {
        Some(path) => match ChallengeCatalog::load(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!("Cannot start without a challenge catalog: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::info!("Using built-in challenge catalog");
            ChallengeCatalog::builtin()
        }
    };
    tracing::info!(
        "Serving {} regex challenges and {} string sets",
        catalog.len(ChallengeCategory::Regex),
        catalog.len(ChallengeCategory::Strings)
    );

    let registry = Arc::new(RoomRegistry::new(Arc::new(catalog)));

    if let Some(max_idle) = config.room_idle_timeout {
        reaper::spawn_idle_room_reaper(registry.clone(), max_idle, config.reap_interval);
    }

    let app = api::router(registry)
        .layer(config.cors_layer())
        .layer(TraceLayer::new_for_http());

    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on http://{}", config.addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
