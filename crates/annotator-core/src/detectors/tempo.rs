//! Lost tempo: shuffling a piece back and forth with no tactical point.

use chess::{Board, ChessMove};

use crate::board_utils::{attacker_count, gives_check, in_check, is_capture};

const IMPACT_CEILING: f64 = -0.20;

/// Did this move retrace the steps of the same piece, moved on this side's
/// previous or second-previous turn, with nothing to show for it?
///
/// Forced moves are excluded: no firing when the mover was in check, when
/// the piece was itself under attack (a retreat), or when the earlier move
/// was a capture, a check, or played while in check.
pub fn lost_tempo(
    boards_before: &[Board],
    moves: &[ChessMove],
    ply: usize,
    played: ChessMove,
    best: Option<ChessMove>,
    impact: f64,
) -> bool {
    if impact > IMPACT_CEILING {
        return false;
    }

    // Matching the engine top move, or not knowing it, rules the pattern out.
    match best {
        Some(b) if b != played => {}
        _ => return false,
    }

    let board = match boards_before.get(ply) {
        Some(b) => b,
        None => return false,
    };
    if !board.legal(played) {
        return false;
    }
    if in_check(board) {
        return false;
    }
    if is_capture(board, played) || gives_check(board, played) {
        return false;
    }

    let mover = board.side_to_move();
    let from = played.get_source();
    let piece = match board.piece_on(from) {
        Some(p) => p,
        None => return false,
    };

    // A piece already under attack is repositioning, not wasting time.
    if attacker_count(board, !mover, from) > 0 {
        return false;
    }

    // The same piece landed on the departure square two or four half-moves
    // ago, and that earlier move was itself quiet and unforced.
    for back in [2usize, 4] {
        if ply < back {
            continue;
        }
        let earlier_board = match boards_before.get(ply - back) {
            Some(b) => b,
            None => continue,
        };
        let earlier_move = match moves.get(ply - back) {
            Some(m) => *m,
            None => continue,
        };
        if !earlier_board.legal(earlier_move) {
            continue;
        }
        if earlier_move.get_dest() != from {
            continue;
        }
        if earlier_board.piece_on(earlier_move.get_source()) != Some(piece) {
            continue;
        }
        if in_check(earlier_board) {
            continue;
        }
        if is_capture(earlier_board, earlier_move) || gives_check(earlier_board, earlier_move) {
            continue;
        }
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::san;
    use chess::Board;

    /// Replay SAN moves from the start position, returning boards-before
    /// and parsed moves.
    fn replay(sans: &[&str]) -> (Vec<Board>, Vec<ChessMove>) {
        let mut board = Board::default();
        let mut boards = Vec::new();
        let mut moves = Vec::new();
        for s in sans {
            let m = san::parse_san(&board, s).unwrap();
            boards.push(board);
            moves.push(m);
            board = board.make_move_new(m);
        }
        (boards, moves)
    }

    #[test]
    fn knight_shuffle_fires() {
        // 1. Nf3 Nc6 2. Ng1: the knight goes straight back.
        let (boards, moves) = replay(&["Nf3", "Nc6", "Ng1"]);
        let ply = 2;
        let alt = san::parse_san(&boards[ply], "d4").unwrap();
        assert!(lost_tempo(
            &boards,
            &moves,
            ply,
            moves[ply],
            Some(alt),
            -0.3
        ));
    }

    #[test]
    fn mild_impact_does_not_fire() {
        let (boards, moves) = replay(&["Nf3", "Nc6", "Ng1"]);
        let alt = san::parse_san(&boards[2], "d4").unwrap();
        assert!(!lost_tempo(&boards, &moves, 2, moves[2], Some(alt), -0.1));
    }

    #[test]
    fn matching_engine_best_does_not_fire() {
        let (boards, moves) = replay(&["Nf3", "Nc6", "Ng1"]);
        assert!(!lost_tempo(
            &boards,
            &moves,
            2,
            moves[2],
            Some(moves[2]),
            -0.3
        ));
        // Unknown engine choice also fails closed.
        assert!(!lost_tempo(&boards, &moves, 2, moves[2], None, -0.3));
    }

    #[test]
    fn in_check_before_the_move_never_fires() {
        // 1. e4 e5 2. Qh5 Nf6 3. Qxe5+ and Black must deal with the check;
        // a queen-out-and-back for Black cannot be a lost tempo here.
        let (boards, moves) = replay(&["e4", "e5", "Qh5", "Nf6", "Qxe5+", "Be7"]);
        let ply = 5;
        let alt = san::parse_san(&boards[ply], "Qe7").unwrap();
        assert!(in_check(&boards[ply]));
        assert!(!lost_tempo(&boards, &moves, ply, moves[ply], Some(alt), -1.0));
    }

    #[test]
    fn retreat_of_attacked_piece_does_not_fire() {
        // 1. Nf3 Nc6 2. Ne5 d6: the e5 knight is attacked by the d6 pawn,
        // so 3. Nf3 is a forced-ish retreat, not a shuffle.
        let (boards, moves) = replay(&["Nf3", "Nc6", "Ne5", "d6", "Nf3"]);
        let ply = 4;
        let alt = san::parse_san(&boards[ply], "d4").unwrap();
        assert!(!lost_tempo(&boards, &moves, ply, moves[ply], Some(alt), -0.3));
    }

    #[test]
    fn four_plies_back_also_matches() {
        // 1. Nf3 d6 2. e3 e6 3. Ng1: ply 4 departs f3, where the knight
        // landed at ply 0. The 2-back move (e3) does not match, so only
        // the 4-back slot can fire.
        let (boards, moves) = replay(&["Nf3", "d6", "e3", "e6", "Ng1"]);
        let ply = 4;
        let alt = san::parse_san(&boards[ply], "d4").unwrap();
        assert!(lost_tempo(&boards, &moves, ply, moves[ply], Some(alt), -0.25));
    }
}
