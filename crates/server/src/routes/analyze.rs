use axum::{Extension, Json};
use serde::Deserialize;

use crate::analysis::{self, FenAnalysis, GameSummary};
use crate::error::AppError;
use crate::routes::clamp_depth;
use crate::state::AppState;

fn default_eval_depth() -> u32 {
    14
}

/// Summaries touch every position of a game, so they default shallower.
fn default_summary_depth() -> u32 {
    12
}

#[derive(Deserialize)]
pub struct AnalyzeFenRequest {
    pub fen: String,
    #[serde(default = "default_eval_depth")]
    pub depth: u32,
}

#[derive(Deserialize)]
pub struct AnalyzeGameRequest {
    pub game_id: u32,
    #[serde(default = "default_summary_depth")]
    pub depth: u32,
}

/// POST /analyze_fen/
pub async fn analyze_fen(
    Extension(state): Extension<AppState>,
    Json(req): Json<AnalyzeFenRequest>,
) -> Result<Json<FenAnalysis>, AppError> {
    let depth = clamp_depth(req.depth);
    let analysis = analysis::analyze_fen(&state, &req.fen, depth).await?;
    Ok(Json(analysis))
}

/// POST /analyze_game/
pub async fn analyze_game(
    Extension(state): Extension<AppState>,
    Json(req): Json<AnalyzeGameRequest>,
) -> Result<Json<GameSummary>, AppError> {
    let depth = clamp_depth(req.depth);
    let summary = analysis::summarize_game(&state, req.game_id, depth).await?;
    Ok(Json(summary))
}
