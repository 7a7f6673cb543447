//! Hanging piece: a mover piece left attacked with too few defenders.

use chess::{Board, Color, Piece, Square};

use crate::board_utils::{attackers, piece_map, piece_value};

/// Only minor pieces and up count as worth reporting.
const MIN_VALUE: i32 = 3;

#[derive(Debug, Clone)]
pub struct HangingPiece {
    pub square: Square,
    pub piece: Piece,
    pub attacker_count: u32,
    pub defender_count: u32,
    /// One concrete attacking square, for the explanation text.
    pub attacker_square: Square,
}

/// The bare predicate: attacked with zero defenders, or outnumbered.
pub fn square_is_hanging(board: &Board, owner: Color, square: Square) -> bool {
    let attacker_bb = attackers(board, !owner, square);
    if attacker_bb.popcnt() == 0 {
        return false;
    }
    let defenders = attackers(board, owner, square).popcnt();
    defenders == 0 || attacker_bb.popcnt() > defenders
}

/// Find the single highest-value hanging mover piece after the move.
pub fn find(board_after: &Board, mover: Color) -> Option<HangingPiece> {
    let mut best: Option<HangingPiece> = None;
    let mut best_value = 0;

    for (square, piece, color) in piece_map(board_after) {
        if color != mover {
            continue;
        }
        let value = piece_value(piece);
        if value < MIN_VALUE {
            continue;
        }

        let attacker_bb = attackers(board_after, !mover, square);
        let attacker_count = attacker_bb.popcnt();
        if attacker_count == 0 {
            continue;
        }
        let defender_count = attackers(board_after, mover, square).popcnt();
        if defender_count != 0 && attacker_count <= defender_count {
            continue;
        }

        if value > best_value {
            best_value = value;
            best = Some(HangingPiece {
                square,
                piece,
                attacker_count,
                defender_count,
                attacker_square: attacker_bb.to_square(),
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{File, Rank};
    use std::str::FromStr;

    fn sq(file: File, rank: Rank) -> Square {
        Square::make_square(rank, file)
    }

    #[test]
    fn queen_attacked_twice_defended_once_fires() {
        // White queen on d5: attacked by the c6 pawn and the f6 knight,
        // defended only by the f3 bishop.
        let board =
            Board::from_str("rnb1kb1r/pp1p1ppp/2p2n2/3Q4/8/5B2/PPPP1PPP/RNB1K1NR b KQkq - 0 1")
                .unwrap();
        let d5 = sq(File::D, Rank::Fifth);
        assert_eq!(attackers(&board, Color::Black, d5).popcnt(), 2);
        assert_eq!(attackers(&board, Color::White, d5).popcnt(), 1);

        let hit = find(&board, Color::White).expect("queen should hang");
        assert_eq!(hit.square, d5);
        assert_eq!(hit.piece, Piece::Queen);
        assert_eq!(hit.attacker_count, 2);
        assert_eq!(hit.defender_count, 1);
    }

    #[test]
    fn queen_defended_twice_does_not_fire() {
        // Same shape but a second defender (knight on e3) covers d5.
        let board =
            Board::from_str("rnb1kb1r/pp1p1ppp/2p2n2/3Q4/8/4NB2/PPPP1PPP/RNB1K2R b KQkq - 0 1")
                .unwrap();
        let d5 = sq(File::D, Rank::Fifth);
        assert_eq!(attackers(&board, Color::Black, d5).popcnt(), 2);
        assert_eq!(attackers(&board, Color::White, d5).popcnt(), 2);
        assert!(find(&board, Color::White).is_none());
    }

    #[test]
    fn undefended_attacked_minor_fires_even_when_not_outnumbered() {
        // White bishop on b5 attacked once (a6 pawn), zero defenders.
        let board =
            Board::from_str("rnbqkbnr/1ppp1ppp/p7/1B2p3/4P3/8/PPPP1PPP/RNBQK1NR w KQkq - 0 3")
                .unwrap();
        let hit = find(&board, Color::White).expect("bishop is loose");
        assert_eq!(hit.square, sq(File::B, Rank::Fifth));
        assert_eq!(hit.defender_count, 0);
    }

    #[test]
    fn highest_value_piece_wins_the_tiebreak() {
        // Both a white knight (c3, attacked by b4 pawn... craft simpler:
        // queen d5 and knight e5 both hang; the queen must be reported.
        let board =
            Board::from_str("rnb1kb1r/pp1p1ppp/2p2n2/3QN3/1q6/8/PPPP1PPP/RNB1KB1R b KQkq - 0 1")
                .unwrap();
        let hit = find(&board, Color::White).expect("something hangs");
        assert_eq!(hit.piece, Piece::Queen);
    }

    #[test]
    fn pawns_never_reported() {
        // Lone white pawn en prise.
        let board =
            Board::from_str("rnbqkbnr/pppp1ppp/8/4p3/3P4/8/PPP1PPPP/RNBQKBNR b KQkq - 0 2")
                .unwrap();
        // d4 is attacked by e5 and defended by the queen: not hanging anyway,
        // but even an undefended pawn would be below the value floor.
        assert!(find(&board, Color::White).is_none());
    }
}
