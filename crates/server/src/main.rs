use std::sync::Arc;

use server::cache::{EvalCache, ExplanationCache};
use server::config;
use server::engine::{EngineHandle, StockfishEngine};
use server::routes;
use server::state::AppState;
use server::store::GameStore;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();

    tracing::info!("Starting engine at {}", config.stockfish_path);
    let engine = StockfishEngine::new(&config.stockfish_path)
        .await
        .expect("Failed to start engine");

    let state = AppState {
        engine: EngineHandle::new(engine, config.engine_timeout),
        evals: Arc::new(EvalCache::new(config.eval_cache_capacity)),
        explanations: Arc::new(ExplanationCache::new(config.explain_cache_capacity)),
        games: Arc::new(GameStore::new(config.max_games)),
    };

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/upload_pgn/", post(routes::games::upload_pgn))
        .route("/analyze_fen/", post(routes::analyze::analyze_fen))
        .route("/analyze_game/", post(routes::analyze::analyze_game))
        .route("/explain_move/", post(routes::explain::explain_move))
        .route("/best_line/", post(routes::explain::best_line))
        .route("/explain_vs_best/", post(routes::explain::explain_vs_best))
        .layer(Extension(state))
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
