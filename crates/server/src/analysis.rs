//! Orchestration: feeds engine evals through the core classifier,
//! detectors and composer, and shapes the API responses.

use std::str::FromStr;

use chess::{Board, ChessMove, Color};
use serde::Serialize;

use annotator_core::detectors::brilliancy::{BrilliancyEvals, MIN_DEPTH};
use annotator_core::detectors::{run_all, DetectorContext, Findings};
use annotator_core::eval::{impact, pawn_score_white, pov};
use annotator_core::explain::{compose, differential, ComposeInput};
use annotator_core::game::GameRecord;
use annotator_core::quality::{classify, Quality, QualityCounts};
use annotator_core::san;
use annotator_core::summary::tally;

use crate::engine::EngineEval;
use crate::error::AppError;
use crate::state::AppState;

/// How much of a principal variation the API shows.
const PV_SHOW_PLIES: usize = 8;

#[derive(Debug, Clone, Serialize)]
pub struct ExplainResponse {
    pub game_id: u32,
    pub ply: usize,
    pub depth: u32,
    pub played_move_uci: String,
    pub played_move_san: String,
    pub best_move_uci: Option<String>,
    pub best_move_san: Option<String>,
    /// White-POV evals in pawns around the move.
    pub eval_before: f64,
    pub eval_after: f64,
    /// Mover-POV swing.
    pub impact: f64,
    pub quality: Quality,
    pub bullets: Vec<String>,
    pub reason_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FenAnalysis {
    pub fen: String,
    pub depth: u32,
    /// White-POV eval in pawns.
    pub score: f64,
    pub best_move_uci: Option<String>,
    pub best_move_san: Option<String>,
    pub pv_uci: Vec<String>,
    pub pv_san: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub game_id: u32,
    pub depth: u32,
    pub white_name: String,
    pub black_name: String,
    pub result: String,
    pub winner: String,
    pub white: QualityCounts,
    pub black: QualityCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct BestLine {
    pub game_id: u32,
    pub ply: usize,
    pub depth: u32,
    /// White-POV eval of the position before the ply.
    pub eval: f64,
    pub best_move_uci: Option<String>,
    pub best_move_san: Option<String>,
    pub pv_uci: Vec<String>,
    pub pv_san: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Differential {
    pub game_id: u32,
    pub ply: usize,
    pub depth: u32,
    pub played_move_san: String,
    pub best_move_san: String,
    /// Mover-POV swings of the two branches, from real evals of both.
    pub played_impact: f64,
    pub best_impact: f64,
    pub bullets: Vec<String>,
}

/// Evaluate one position through the shared cache; concurrent requests
/// for the same position share a single search.
async fn evaluate_position(state: &AppState, fen: &str, depth: u32) -> EngineEval {
    state
        .evals
        .get_or_compute(fen, depth, || async { state.engine.evaluate(fen, depth).await })
        .await
}

fn white_pov(eval: &EngineEval, board: &Board) -> f64 {
    pawn_score_white(eval.score, board.side_to_move() == Color::White)
}

/// The engine's top move, if its PV head parses and is legal here.
fn engine_best(eval: &EngineEval, board: &Board) -> Option<ChessMove> {
    let m = san::parse_uci(eval.best_uci()?)?;
    board.legal(m).then_some(m)
}

pub async fn analyze_fen(state: &AppState, fen: &str, depth: u32) -> Result<FenAnalysis, AppError> {
    let board =
        Board::from_str(fen).map_err(|_| AppError::BadRequest(format!("Invalid FEN: {fen}")))?;
    // Canonical FEN as the cache key, so spacing variants share an entry.
    let fen = board.to_string();
    let eval = evaluate_position(state, &fen, depth).await;

    let best = engine_best(&eval, &board);
    Ok(FenAnalysis {
        score: white_pov(&eval, &board),
        best_move_uci: best.map(san::to_uci),
        best_move_san: best.map(|m| san::to_san(&board, m)),
        pv_uci: eval.pv.iter().take(PV_SHOW_PLIES).cloned().collect(),
        pv_san: san::pv_to_san(&board, &eval.pv, PV_SHOW_PLIES),
        fen,
        depth,
    })
}

async fn get_game(
    state: &AppState,
    game_id: u32,
) -> Result<std::sync::Arc<GameRecord>, AppError> {
    state
        .games
        .get(game_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Game {game_id} not found")))
}

fn checked_ply(game: &GameRecord, ply: usize) -> Result<(), AppError> {
    if ply == 0 || ply > game.ply_count() {
        return Err(AppError::BadRequest(format!(
            "ply must be between 1 and {}",
            game.ply_count()
        )));
    }
    Ok(())
}

/// Engine-derived numbers for the brilliancy detector: evals of the
/// played branch, the engine-best branch, and the position after the
/// opponent's best reply, all mover POV.
async fn gather_brilliancy_evals(
    state: &AppState,
    board_before: &Board,
    board_after: &Board,
    played: ChessMove,
    best: Option<ChessMove>,
    eval_after: &EngineEval,
    depth: u32,
    mover_is_white: bool,
) -> BrilliancyEvals {
    let played_eval = pov(white_pov(eval_after, board_after), mover_is_white);
    let played_is_engine_best = best == Some(played);

    let best_eval = match best {
        Some(b) if b != played => {
            let board_best = board_before.make_move_new(b);
            let eval = evaluate_position(state, &board_best.to_string(), depth).await;
            Some(pov(white_pov(&eval, &board_best), mover_is_white))
        }
        Some(_) => Some(played_eval),
        None => None,
    };

    let reply = eval_after
        .best_uci()
        .and_then(san::parse_uci)
        .filter(|m| board_after.legal(*m));
    let after_reply_eval = match reply {
        Some(reply) => {
            let board_replied = board_after.make_move_new(reply);
            let eval = evaluate_position(state, &board_replied.to_string(), depth).await;
            Some(pov(white_pov(&eval, &board_replied), mover_is_white))
        }
        None => None,
    };

    BrilliancyEvals {
        played_eval,
        best_eval,
        played_is_engine_best,
        after_reply_eval,
    }
}

/// Detector findings for one branch from a game position.
struct Branch {
    findings: Findings,
    swing: f64,
}

async fn run_branch(
    state: &AppState,
    game: &GameRecord,
    ply: usize,
    branch_move: ChessMove,
    best: Option<ChessMove>,
    score_before: f64,
    depth: u32,
) -> Branch {
    let board_before = game.boards()[ply - 1];
    let board_after = board_before.make_move_new(branch_move);

    let eval_after = evaluate_position(state, &board_after.to_string(), depth).await;
    let score_after = white_pov(&eval_after, &board_after);
    let mover_is_white = board_before.side_to_move() == Color::White;
    let swing = impact(score_before, score_after, mover_is_white);

    let brilliancy = if depth >= MIN_DEPTH {
        Some(
            gather_brilliancy_evals(
                state,
                &board_before,
                &board_after,
                branch_move,
                best,
                &eval_after,
                depth,
                mover_is_white,
            )
            .await,
        )
    } else {
        None
    };

    let ctx = DetectorContext {
        boards_before: game.boards(),
        moves: game.moves(),
        ply: ply - 1,
        played: branch_move,
        best,
        impact: swing,
        depth,
        opponent_pv: &eval_after.pv,
        brilliancy,
    };

    Branch {
        findings: run_all(&ctx),
        swing,
    }
}

/// Full annotation of one played ply.
pub async fn explain_ply(
    state: &AppState,
    game_id: u32,
    ply: usize,
    depth: u32,
) -> Result<ExplainResponse, AppError> {
    if let Some(hit) = state.explanations.get(game_id, ply, depth).await {
        return Ok(hit);
    }

    let game = get_game(state, game_id).await?;
    checked_ply(&game, ply)?;

    let board_before = game.boards()[ply - 1];
    let board_after = game.boards()[ply];
    let played = game.moves()[ply - 1];
    let mover_is_white = board_before.side_to_move() == Color::White;

    let eval_b = evaluate_position(state, &game.fens[ply - 1], depth).await;
    let eval_a = evaluate_position(state, &game.fens[ply], depth).await;

    let score_before = white_pov(&eval_b, &board_before);
    let score_after = white_pov(&eval_a, &board_after);
    let swing = impact(score_before, score_after, mover_is_white);

    let best = engine_best(&eval_b, &board_before);
    let played_is_best = best == Some(played);
    let mut quality = classify(swing, played_is_best);

    let brilliancy = if depth >= MIN_DEPTH {
        Some(
            gather_brilliancy_evals(
                state,
                &board_before,
                &board_after,
                played,
                best,
                &eval_a,
                depth,
                mover_is_white,
            )
            .await,
        )
    } else {
        None
    };

    let ctx = DetectorContext {
        boards_before: game.boards(),
        moves: game.moves(),
        ply: ply - 1,
        played,
        best,
        impact: swing,
        depth,
        opponent_pv: &eval_a.pv,
        brilliancy,
    };
    let findings = run_all(&ctx);
    if findings.brilliancy.is_some() {
        quality = Quality::Perfect;
    }

    let explanation = compose(&ComposeInput {
        board_before: &board_before,
        board_after: &board_after,
        played,
        best,
        eval_before: score_before,
        eval_after: score_after,
        impact: swing,
        quality,
        opponent_pv: &eval_a.pv,
        findings: &findings,
    });

    let response = ExplainResponse {
        game_id,
        ply,
        depth,
        played_move_uci: san::to_uci(played),
        played_move_san: san::to_san(&board_before, played),
        best_move_uci: best.map(san::to_uci),
        best_move_san: best.map(|m| san::to_san(&board_before, m)),
        eval_before: score_before,
        eval_after: score_after,
        impact: swing,
        quality: explanation.quality,
        bullets: explanation.bullets,
        reason_tags: explanation.reason_tags,
    };
    state
        .explanations
        .insert(game_id, ply, depth, response.clone())
        .await;
    Ok(response)
}

/// Per-side quality tallies for a whole game: evals only, no detectors,
/// so a cheaper depth is fine.
pub async fn summarize_game(
    state: &AppState,
    game_id: u32,
    depth: u32,
) -> Result<GameSummary, AppError> {
    let game = get_game(state, game_id).await?;

    let mut evals_white = Vec::with_capacity(game.fens.len());
    let mut best_moves = Vec::with_capacity(game.fens.len());
    for (i, fen) in game.fens.iter().enumerate() {
        let board = &game.boards()[i];
        let eval = evaluate_position(state, fen, depth).await;
        evals_white.push(white_pov(&eval, board));
        best_moves.push(engine_best(&eval, board));
    }

    let (white, black) = tally(&game, &evals_white, &best_moves);
    Ok(GameSummary {
        game_id,
        depth,
        white_name: game.white_name.clone(),
        black_name: game.black_name.clone(),
        result: game.result.clone(),
        winner: game.winner.clone(),
        white,
        black,
    })
}

/// The engine's preferred continuation from the position a ply was
/// played from.
pub async fn best_line(
    state: &AppState,
    game_id: u32,
    ply: usize,
    depth: u32,
) -> Result<BestLine, AppError> {
    let game = get_game(state, game_id).await?;
    checked_ply(&game, ply)?;

    let board_before = game.boards()[ply - 1];
    let eval = evaluate_position(state, &game.fens[ply - 1], depth).await;
    let best = engine_best(&eval, &board_before);

    Ok(BestLine {
        game_id,
        ply,
        depth,
        eval: white_pov(&eval, &board_before),
        best_move_uci: best.map(san::to_uci),
        best_move_san: best.map(|m| san::to_san(&board_before, m)),
        pv_uci: eval.pv.iter().take(PV_SHOW_PLIES).cloned().collect(),
        pv_san: san::pv_to_san(&board_before, &eval.pv, PV_SHOW_PLIES),
    })
}

/// Differential annotation: run the detectors on the played move and on
/// the engine's top move from the same position, and report only the
/// asymmetric findings.
pub async fn explain_vs_best(
    state: &AppState,
    game_id: u32,
    ply: usize,
    depth: u32,
) -> Result<Differential, AppError> {
    let game = get_game(state, game_id).await?;
    checked_ply(&game, ply)?;

    let board_before = game.boards()[ply - 1];
    let played = game.moves()[ply - 1];
    let played_san = san::to_san(&board_before, played);

    let eval_b = evaluate_position(state, &game.fens[ply - 1], depth).await;
    let score_before = white_pov(&eval_b, &board_before);
    let best = engine_best(&eval_b, &board_before);

    let best = match best {
        Some(b) if b != played => b,
        _ => {
            // The played move is the engine move (or there is none);
            // there is nothing to contrast.
            let played_branch =
                run_branch(state, &game, ply, played, best, score_before, depth).await;
            return Ok(Differential {
                game_id,
                ply,
                depth,
                best_move_san: played_san.clone(),
                played_move_san: played_san,
                played_impact: played_branch.swing,
                best_impact: played_branch.swing,
                bullets: vec![],
            });
        }
    };
    let best_san = san::to_san(&board_before, best);

    let played_branch =
        run_branch(state, &game, ply, played, Some(best), score_before, depth).await;
    let best_branch = run_branch(state, &game, ply, best, Some(best), score_before, depth).await;

    let bullets = differential(
        &played_branch.findings,
        &best_branch.findings,
        &played_san,
        &best_san,
    );

    Ok(Differential {
        game_id,
        ply,
        depth,
        played_move_san: played_san,
        best_move_san: best_san,
        played_impact: played_branch.swing,
        best_impact: best_branch.swing,
        bullets,
    })
}
