//! Opens king: a quiet pawn push that loosens the mover's pawn shield.

use chess::{Board, ChessMove, Color, Piece, Square};

use crate::board_utils::{gives_check, in_check, is_capture, king_square};
use crate::san;

const MILD_IMPACT: f64 = -0.20;
const SEVERE_IMPACT: f64 = -0.50;

#[derive(Debug, Clone)]
pub struct OpensKing {
    /// The pushed pawn's destination.
    pub square: Square,
    /// Double push from a shield file, leaving a permanent hole.
    pub hole_creating: bool,
}

/// The three files nearest the mover's king: f-h on the kingside half,
/// a-d otherwise.
fn shield_files(king: Square) -> &'static [usize] {
    if king.get_file().to_index() >= 4 {
        &[5, 6, 7]
    } else {
        &[0, 1, 2, 3]
    }
}

/// Does the opponent's reply line deliver a check against `mover` within
/// the first `max_plies` half-moves?
pub fn reply_checks_within(
    board_after: &Board,
    pv: &[String],
    mover: Color,
    max_plies: usize,
) -> bool {
    let mut current = *board_after;
    for uci in pv.iter().take(max_plies) {
        let m = match san::parse_uci(uci) {
            Some(m) if current.legal(m) => m,
            _ => return false,
        };
        if current.side_to_move() != mover && gives_check(&current, m) {
            return true;
        }
        current = current.make_move_new(m);
    }
    false
}

pub fn opens_king(
    board_before: &Board,
    played: ChessMove,
    impact: f64,
    reply_checks_soon: bool,
) -> Option<OpensKing> {
    if !board_before.legal(played) {
        return None;
    }
    if in_check(board_before) {
        return None;
    }
    if is_capture(board_before, played) || gives_check(board_before, played) {
        return None;
    }
    if board_before.piece_on(played.get_source()) != Some(Piece::Pawn) {
        return None;
    }

    let mover = board_before.side_to_move();
    let king = king_square(board_before, mover);
    let from_file = played.get_source().get_file().to_index();
    if !shield_files(king).contains(&from_file) {
        return None;
    }

    let rank_delta = (played.get_source().get_rank().to_index() as i32
        - played.get_dest().get_rank().to_index() as i32)
        .abs();
    let hole_creating = rank_delta == 2;

    let fires = (hole_creating && (impact <= MILD_IMPACT || reply_checks_soon))
        || impact <= SEVERE_IMPACT
        || (impact <= MILD_IMPACT && reply_checks_soon);

    if fires {
        Some(OpensKing {
            square: played.get_dest(),
            hole_creating,
        })
    } else {
        None
    }
}
