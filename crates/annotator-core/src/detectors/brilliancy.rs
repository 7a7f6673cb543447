//! Brilliancy: a genuine sacrifice the engine approves of.

use chess::{Board, ChessMove};

use crate::board_utils::{
    gives_check, is_capture, material_delta_for_mover, piece_value,
};
use crate::detectors::hanging;

/// Below this search depth the comparison evals are too noisy to call
/// anything brilliant.
pub const MIN_DEPTH: u32 = 14;

/// Played move must stay within this much of the engine top move (pawns).
const NEAR_BEST_MARGIN: f64 = 0.35;
/// Minimum material put at stake by the move.
const MIN_SACRIFICE: i32 = 2;
/// Material still unrecovered after the opponent's best reply.
const MIN_STILL_DOWN: i32 = 1;
/// Mover-POV evaluation floor after the reply: the sacrifice must be sound.
const SOUNDNESS_FLOOR: f64 = 0.80;

/// Engine-derived numbers the detector cannot compute itself.
#[derive(Debug, Clone)]
pub struct BrilliancyEvals {
    /// Eval after the played move, mover POV.
    pub played_eval: f64,
    /// Eval after the engine's own top move, mover POV (when evaluated).
    pub best_eval: Option<f64>,
    /// Whether the played move literally equals the engine top move.
    pub played_is_engine_best: bool,
    /// Eval after the opponent's best reply to the played move, mover POV.
    pub after_reply_eval: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Brilliancy {
    /// Material put at stake, in points.
    pub sacrificed: i32,
    /// Neither a capture nor a check: the quiet kind.
    pub quiet: bool,
}

pub fn find(
    board_before: &Board,
    board_after: &Board,
    played: ChessMove,
    reply: Option<ChessMove>,
    depth: u32,
    evals: &BrilliancyEvals,
) -> Option<Brilliancy> {
    if depth < MIN_DEPTH {
        return None;
    }

    // (1) The move holds the evaluation: near the engine top move, or it
    // literally is the top move when no comparison eval exists.
    let near_best = match evals.best_eval {
        Some(best) => evals.played_eval >= best - NEAR_BEST_MARGIN,
        None => evals.played_is_engine_best,
    };
    if !near_best {
        return None;
    }

    // (2) Material at stake: the moved piece is worth at least two points
    // more than whatever the move itself captured.
    let mover = board_before.side_to_move();
    let moved = board_before.piece_on(played.get_source())?;
    let captured = board_before
        .piece_on(played.get_dest())
        .map(piece_value)
        .unwrap_or(0);
    let sacrificed = piece_value(moved) - captured;
    if sacrificed < MIN_SACRIFICE {
        return None;
    }

    // (4, checked early: it is cheap) The moved piece is left hanging
    // where it landed.
    if board_after.piece_on(played.get_dest()).is_none() {
        return None;
    }
    if !hanging::square_is_hanging(board_after, mover, played.get_dest()) {
        return None;
    }

    // (3) The opponent's best reply cashes in and the material is not
    // immediately regained: still down at least a point versus before.
    let reply = reply.filter(|m| board_after.legal(*m))?;
    let board_replied = board_after.make_move_new(reply);
    if material_delta_for_mover(board_before, &board_replied, mover) > -MIN_STILL_DOWN {
        return None;
    }

    // (5) And the engine still likes the mover's position after the reply.
    let after_reply = evals.after_reply_eval?;
    if after_reply < SOUNDNESS_FLOOR {
        return None;
    }

    let quiet = !is_capture(board_before, played) && !gives_check(board_before, played);

    Some(Brilliancy { sacrificed, quiet })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::san;
    use std::str::FromStr;

    /// Rook takes a pawn-defended knight: gives up the exchange plus.
    fn exchange_sac() -> (Board, ChessMove, Option<ChessMove>) {
        let board = Board::from_str("4k3/8/5p2/4n3/8/8/8/4R1K1 w - - 0 1").unwrap();
        let m = san::parse_san(&board, "Rxe5").unwrap();
        let after = board.make_move_new(m);
        let reply = san::parse_san(&after, "fxe5").ok();
        assert!(reply.is_some());
        (board, m, reply)
    }

    fn passing_evals() -> BrilliancyEvals {
        BrilliancyEvals {
            played_eval: 1.4,
            best_eval: Some(1.5),
            played_is_engine_best: true,
            after_reply_eval: Some(1.2),
        }
    }

    #[test]
    fn never_fires_below_depth_fourteen() {
        let (board, m, reply) = exchange_sac();
        let after = board.make_move_new(m);
        // Every other condition is satisfied (see the test below).
        assert!(find(&board, &after, m, reply, 13, &passing_evals()).is_none());
        assert!(find(&board, &after, m, reply, 0, &passing_evals()).is_none());
    }

    #[test]
    fn exchange_sacrifice_fires_at_depth() {
        let (board, m, reply) = exchange_sac();
        let after = board.make_move_new(m);
        let hit = find(&board, &after, m, reply, 16, &passing_evals())
            .expect("rook-for-knight sac should fire");
        // Rook (5) for knight (3): two points at stake.
        assert_eq!(hit.sacrificed, 2);
        // Rxe5 is a capture (and a check), so not the quiet kind.
        assert!(!hit.quiet);
    }

    #[test]
    fn quiet_piece_offer_is_tagged_quiet() {
        // Bishop walks into a pawn's mouth without capturing or checking.
        let board = Board::from_str("4k3/8/5p2/8/8/8/1B6/6K1 w - - 0 1").unwrap();
        let m = san::parse_san(&board, "Be5").unwrap();
        let after = board.make_move_new(m);
        let reply = san::parse_san(&after, "fxe5").ok();
        let hit = find(&board, &after, m, reply, 16, &passing_evals())
            .expect("quiet offer should fire");
        assert_eq!(hit.sacrificed, 3);
        assert!(hit.quiet);
    }

    #[test]
    fn winning_capture_is_not_a_sacrifice() {
        // Knight takes a queen: nothing is at stake.
        let board =
            Board::from_str("rnb1kbnr/ppp1pppp/8/3q4/8/2N5/PPPPPPPP/R1BQKBNR w KQkq - 0 3")
                .unwrap();
        let m = san::parse_san(&board, "Nxd5").unwrap();
        let after = board.make_move_new(m);
        assert!(find(&board, &after, m, None, 16, &passing_evals()).is_none());
    }

    #[test]
    fn eval_collapse_after_reply_does_not_fire() {
        let (board, m, reply) = exchange_sac();
        let after = board.make_move_new(m);
        let evals = BrilliancyEvals {
            after_reply_eval: Some(0.3),
            ..passing_evals()
        };
        assert!(find(&board, &after, m, reply, 16, &evals).is_none());
    }

    #[test]
    fn eval_drop_versus_best_move_does_not_fire() {
        let (board, m, reply) = exchange_sac();
        let after = board.make_move_new(m);
        let evals = BrilliancyEvals {
            played_eval: 1.0,
            best_eval: Some(3.0),
            ..passing_evals()
        };
        assert!(find(&board, &after, m, reply, 16, &evals).is_none());
    }

    #[test]
    fn missing_reply_fails_closed() {
        let (board, m, _) = exchange_sac();
        let after = board.make_move_new(m);
        assert!(find(&board, &after, m, None, 16, &passing_evals()).is_none());
    }
}
