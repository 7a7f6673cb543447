use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub stockfish_path: String,
    /// Wall-clock cap for one engine search; past it the position is
    /// scored as neutral.
    pub engine_timeout: Duration,
    pub max_games: usize,
    pub eval_cache_capacity: usize,
    pub explain_cache_capacity: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            stockfish_path: env::var("STOCKFISH_PATH")
                .unwrap_or_else(|_| "stockfish".to_string()),
            engine_timeout: Duration::from_secs(
                env::var("ENGINE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
            max_games: env::var("MAX_GAMES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(64),
            eval_cache_capacity: env::var("EVAL_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4096),
            explain_cache_capacity: env::var("EXPLAIN_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1024),
        }
    }
}
