use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use panel_showdown::{api, auth, config::ServerConfig, state::AppState, store::Store, ws};

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
                .unwrap_or_else(|_| "panel_showdown=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Panel Showdown...");

    let config = ServerConfig::from_env();
    let auth_config = Arc::new(auth::AuthConfig::from_env());

    let store = match Store::open(&config.database_path) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open database {}: {}", config.database_path, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Using database {}", config.database_path);

    let state = Arc::new(
        AppState::new(store, config.team_names.clone()).with_panelists(config.panelists.clone()),
    );

    // WebSocket route, moderator role behind HTTP Basic Auth
    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(
            auth_config.clone(),
            auth::moderator_ws_auth_middleware,
        ));

    let app = Router::new()
        .merge(ws_routes)
        .merge(api::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Listening on http://{}", config.bind_addr);

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
