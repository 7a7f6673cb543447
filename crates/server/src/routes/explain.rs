use axum::{Extension, Json};
use serde::Deserialize;

use crate::analysis::{self, BestLine, Differential, ExplainResponse};
use crate::error::AppError;
use crate::routes::clamp_depth;
use crate::state::AppState;

fn default_explain_depth() -> u32 {
    14
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub game_id: u32,
    /// 1-based ply index into the game.
    pub ply: usize,
    #[serde(default = "default_explain_depth")]
    pub depth: u32,
}

/// POST /explain_move/
pub async fn explain_move(
    Extension(state): Extension<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<ExplainResponse>, AppError> {
    let depth = clamp_depth(req.depth);
    let response = analysis::explain_ply(&state, req.game_id, req.ply, depth).await?;
    Ok(Json(response))
}

/// POST /best_line/
pub async fn best_line(
    Extension(state): Extension<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<BestLine>, AppError> {
    let depth = clamp_depth(req.depth);
    let response = analysis::best_line(&state, req.game_id, req.ply, depth).await?;
    Ok(Json(response))
}

/// POST /explain_vs_best/
pub async fn explain_vs_best(
    Extension(state): Extension<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<Differential>, AppError> {
    let depth = clamp_depth(req.depth);
    let response = analysis::explain_vs_best(&state, req.game_id, req.ply, depth).await?;
    Ok(Json(response))
}
