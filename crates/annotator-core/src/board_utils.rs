//! Board helpers shared by the pattern detectors.
//!
//! The `chess` crate has no attackers() lookup, so the reverse-attack
//! bitboard queries live here.

use chess::{BitBoard, Board, ChessMove, Color, File, Piece, Rank, Square, EMPTY};

pub const PAWN_VALUE: i32 = 1;
pub const KNIGHT_VALUE: i32 = 3;
pub const BISHOP_VALUE: i32 = 3;
pub const ROOK_VALUE: i32 = 5;
pub const QUEEN_VALUE: i32 = 9;

/// Simple material value; kings are never counted.
pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN_VALUE,
        Piece::Knight => KNIGHT_VALUE,
        Piece::Bishop => BISHOP_VALUE,
        Piece::Rook => ROOK_VALUE,
        Piece::Queen => QUEEN_VALUE,
        Piece::King => 0,
    }
}

pub fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "pawn",
        Piece::Knight => "knight",
        Piece::Bishop => "bishop",
        Piece::Rook => "rook",
        Piece::Queen => "queen",
        Piece::King => "king",
    }
}

/// Squares a pawn of `color` on `square` attacks (diagonals only, not pushes).
pub fn pawn_attacks(square: Square, color: Color) -> BitBoard {
    let file = square.get_file().to_index();
    let rank = square.get_rank().to_index();

    let mut result = EMPTY;
    let target_rank = match color {
        Color::White if rank < 7 => Some(rank + 1),
        Color::Black if rank > 0 => Some(rank - 1),
        _ => None,
    };

    if let Some(r) = target_rank {
        if file > 0 {
            result |= BitBoard::from_square(Square::make_square(
                Rank::from_index(r),
                File::from_index(file - 1),
            ));
        }
        if file < 7 {
            result |= BitBoard::from_square(Square::make_square(
                Rank::from_index(r),
                File::from_index(file + 1),
            ));
        }
    }

    result
}

/// Squares attacked by the piece on `square` (empty if the square is empty).
pub fn attacks(board: &Board, square: Square) -> BitBoard {
    let piece = match board.piece_on(square) {
        Some(p) => p,
        None => return EMPTY,
    };

    match piece {
        Piece::Pawn => {
            // A pawn square always has a color.
            let color = board.color_on(square).unwrap_or(Color::White);
            pawn_attacks(square, color)
        }
        Piece::Knight => chess::get_knight_moves(square),
        Piece::King => chess::get_king_moves(square),
        Piece::Bishop => chess::get_bishop_moves(square, *board.combined()),
        Piece::Rook => chess::get_rook_moves(square, *board.combined()),
        Piece::Queen => {
            chess::get_bishop_moves(square, *board.combined())
                | chess::get_rook_moves(square, *board.combined())
        }
    }
}

/// All pieces of `color` attacking `square` (python-chess `board.attackers`).
///
/// Pawns need a reverse lookup: pawn attacks FROM the target square with the
/// opposite color, intersected with the actual pawns.
pub fn attackers(board: &Board, color: Color, square: Square) -> BitBoard {
    let occupied = *board.combined();
    let color_pieces = *board.color_combined(color);

    let mut result = EMPTY;

    result |= pawn_attacks(square, !color) & *board.pieces(Piece::Pawn) & color_pieces;
    result |= chess::get_knight_moves(square) & *board.pieces(Piece::Knight) & color_pieces;
    result |= chess::get_king_moves(square) & *board.pieces(Piece::King) & color_pieces;

    let bishop_atk = chess::get_bishop_moves(square, occupied);
    result |=
        bishop_atk & (*board.pieces(Piece::Bishop) | *board.pieces(Piece::Queen)) & color_pieces;

    let rook_atk = chess::get_rook_moves(square, occupied);
    result |= rook_atk & (*board.pieces(Piece::Rook) | *board.pieces(Piece::Queen)) & color_pieces;

    result
}

/// Number of `color` pieces attacking `square`.
pub fn attacker_count(board: &Board, color: Color, square: Square) -> u32 {
    attackers(board, color, square).popcnt()
}

/// All (square, piece, color) tuples on the board.
pub fn piece_map(board: &Board) -> Vec<(Square, Piece, Color)> {
    let mut result = Vec::new();
    for sq in *board.combined() {
        if let (Some(piece), Some(color)) = (board.piece_on(sq), board.color_on(sq)) {
            result.push((sq, piece, color));
        }
    }
    result
}

/// Material for one side.
pub fn material_count(board: &Board, color: Color) -> i32 {
    let color_bb = *board.color_combined(color);
    let count = |piece: Piece, value: i32| (*board.pieces(piece) & color_bb).popcnt() as i32 * value;

    count(Piece::Pawn, PAWN_VALUE)
        + count(Piece::Knight, KNIGHT_VALUE)
        + count(Piece::Bishop, BISHOP_VALUE)
        + count(Piece::Rook, ROOK_VALUE)
        + count(Piece::Queen, QUEEN_VALUE)
}

/// White material minus black material.
pub fn material_white_minus_black(board: &Board) -> i32 {
    material_count(board, Color::White) - material_count(board, Color::Black)
}

/// Material swing for the mover between two boards. Positive = mover gained.
pub fn material_delta_for_mover(start: &Board, end: &Board, mover: Color) -> i32 {
    let delta_white = material_white_minus_black(end) - material_white_minus_black(start);
    match mover {
        Color::White => delta_white,
        Color::Black => -delta_white,
    }
}

pub fn king_square(board: &Board, color: Color) -> Square {
    let king_bb = *board.pieces(Piece::King) & *board.color_combined(color);
    debug_assert_eq!(king_bb.popcnt(), 1);
    king_bb.to_square()
}

pub fn is_en_passant(board: &Board, m: ChessMove) -> bool {
    if board.piece_on(m.get_source()) == Some(Piece::Pawn) {
        if let Some(ep_sq) = board.en_passant() {
            return m.get_dest() == ep_sq;
        }
    }
    false
}

pub fn is_capture(board: &Board, m: ChessMove) -> bool {
    board.piece_on(m.get_dest()).is_some() || is_en_passant(board, m)
}

pub fn gives_check(board: &Board, m: ChessMove) -> bool {
    if !board.legal(m) {
        return false;
    }
    let after = board.make_move_new(m);
    *after.checkers() != EMPTY
}

pub fn in_check(board: &Board) -> bool {
    *board.checkers() != EMPTY
}

pub fn is_castling_move(board: &Board, m: ChessMove) -> bool {
    if board.piece_on(m.get_source()) == Some(Piece::King) {
        let from_file = m.get_source().get_file().to_index() as i32;
        let to_file = m.get_dest().get_file().to_index() as i32;
        return (from_file - to_file).abs() > 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn material_starting_position() {
        let board = Board::default();
        // 8 pawns + 2N + 2B + 2R + Q = 8 + 6 + 6 + 10 + 9 = 39
        assert_eq!(material_count(&board, Color::White), 39);
        assert_eq!(material_white_minus_black(&board), 0);
    }

    #[test]
    fn attackers_reverse_pawn_lookup() {
        // White knight on f3 and white pawn on d4 both cover e5.
        let board =
            Board::from_str("rnbqkbnr/ppp1pppp/8/3p4/3P4/5N2/PPP1PPPP/RNBQKB1R b KQkq - 0 2")
                .unwrap();
        let e5 = Square::make_square(Rank::Fifth, File::E);
        assert_eq!(attacker_count(&board, Color::White, e5), 2);
        // Black pawn on d5 does not defend e5 (it attacks e4 and c4).
        let e4 = Square::make_square(Rank::Fourth, File::E);
        assert_eq!(attacker_count(&board, Color::Black, e4), 1);
    }

    #[test]
    fn material_delta_after_capture() {
        let before =
            Board::from_str("rnbqkbnr/pppp1ppp/8/4p3/3P4/8/PPP1PPPP/RNBQKBNR b KQkq - 0 2")
                .unwrap();
        // 2...exd4: black wins a pawn.
        let m = ChessMove::new(
            Square::make_square(Rank::Fifth, File::E),
            Square::make_square(Rank::Fourth, File::D),
            None,
        );
        let after = before.make_move_new(m);
        assert_eq!(material_delta_for_mover(&before, &after, Color::Black), 1);
        assert_eq!(material_delta_for_mover(&before, &after, Color::White), -1);
    }

    #[test]
    fn en_passant_counts_as_capture() {
        let board =
            Board::from_str("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        let m = ChessMove::new(
            Square::make_square(Rank::Fifth, File::E),
            Square::make_square(Rank::Sixth, File::F),
            None,
        );
        assert!(is_en_passant(&board, m));
        assert!(is_capture(&board, m));
    }

    #[test]
    fn castling_detected_from_king_jump() {
        let board =
            Board::from_str("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N1B/PPPP1PPP/RNBQK2R w KQkq - 4 4")
                .unwrap();
        let m = ChessMove::new(
            Square::make_square(Rank::First, File::E),
            Square::make_square(Rank::First, File::G),
            None,
        );
        assert!(is_castling_move(&board, m));
    }
}
