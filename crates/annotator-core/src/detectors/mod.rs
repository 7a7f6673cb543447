//! Tactical pattern detectors.
//!
//! Each detector is a pure function over board states and fails closed:
//! inconsistent input (an illegal move, a missing ply) means "does not
//! fire", never a panic or an error.

pub mod brilliancy;
pub mod hanging;
pub mod king_safety;
pub mod overworked;
pub mod tempo;

use chess::{Board, ChessMove};

use crate::san;

use brilliancy::{Brilliancy, BrilliancyEvals};
use hanging::HangingPiece;
use king_safety::OpensKing;
use overworked::OverworkedDefender;

/// Which detectors fired for one move.
#[derive(Debug, Clone, Default)]
pub struct Findings {
    pub brilliancy: Option<Brilliancy>,
    pub hanging: Option<HangingPiece>,
    pub overworked: Option<OverworkedDefender>,
    pub opens_king: Option<OpensKing>,
    pub lost_tempo: bool,
}

/// Everything the detectors need for one move of one branch (the played
/// branch, or the engine-best branch in differential mode).
pub struct DetectorContext<'a> {
    /// Boards before each move of the game; index `ply` is this move's
    /// starting position.
    pub boards_before: &'a [Board],
    /// The moves actually played, for repetition history.
    pub moves: &'a [ChessMove],
    /// 0-based index of this move.
    pub ply: usize,
    /// The move this branch makes from `boards_before[ply]`.
    pub played: ChessMove,
    /// Engine's top choice from the same position, when known.
    pub best: Option<ChessMove>,
    /// Mover-POV evaluation swing for this branch.
    pub impact: f64,
    pub depth: u32,
    /// Engine PV from the position after `played` (opponent to move).
    pub opponent_pv: &'a [String],
    /// Engine-derived numbers for the brilliancy detector; `None` skips it.
    pub brilliancy: Option<BrilliancyEvals>,
}

/// Run every detector for one branch.
pub fn run_all(ctx: &DetectorContext) -> Findings {
    let board_before = match ctx.boards_before.get(ctx.ply) {
        Some(b) => b,
        None => return Findings::default(),
    };
    if !board_before.legal(ctx.played) {
        return Findings::default();
    }
    let board_after = board_before.make_move_new(ctx.played);
    let mover = board_before.side_to_move();

    let reply = ctx
        .opponent_pv
        .first()
        .and_then(|uci| san::parse_uci(uci))
        .filter(|m| board_after.legal(*m));

    let reply_checks =
        king_safety::reply_checks_within(&board_after, ctx.opponent_pv, mover, 4);

    Findings {
        brilliancy: ctx.brilliancy.as_ref().and_then(|evals| {
            brilliancy::find(board_before, &board_after, ctx.played, reply, ctx.depth, evals)
        }),
        hanging: hanging::find(&board_after, mover),
        overworked: overworked::find(&board_after, mover),
        opens_king: king_safety::opens_king(board_before, ctx.played, ctx.impact, reply_checks),
        lost_tempo: tempo::lost_tempo(
            ctx.boards_before,
            ctx.moves,
            ctx.ply,
            ctx.played,
            ctx.best,
            ctx.impact,
        ),
    }
}
