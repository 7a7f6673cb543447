use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use annotator_core::game::GameRecord;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UploadPgnRequest {
    pub pgn: String,
}

/// POST /upload_pgn/
pub async fn upload_pgn(
    Extension(state): Extension<AppState>,
    Json(req): Json<UploadPgnRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let game = GameRecord::from_pgn(&req.pgn)
        .map_err(|e| AppError::BadRequest(format!("Could not parse PGN: {e}")))?;

    let (game_id, evicted) = state.games.insert(game).await;
    for old_id in evicted {
        state.explanations.invalidate_game(old_id).await;
    }

    let game = state
        .games
        .get(game_id)
        .await
        .ok_or_else(|| AppError::Internal("game missing right after insert".to_string()))?;

    tracing::info!(game_id, plies = game.ply_count(), "PGN uploaded");

    Ok(Json(serde_json::json!({
        "message": "PGN uploaded successfully",
        "game_id": game_id,
        "moves": &game.fens,
        "moves_uci": &game.moves_uci,
        "white_name": &game.white_name,
        "black_name": &game.black_name,
        "result": &game.result,
        "winner": &game.winner,
    })))
}
