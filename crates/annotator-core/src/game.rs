//! Imported game record: positions, moves and metadata, built atomically
//! from a PGN string and immutable afterward.

use chess::{Board, ChessMove};
use serde::Serialize;

use crate::error::CoreError;
use crate::pgn;
use crate::san;

/// An imported game. `fens[i+1]` is always the result of applying
/// `moves[i]` to `fens[i]`; the constructor enforces this by replaying
/// the PGN from the start position.
#[derive(Debug, Clone, Serialize)]
pub struct GameRecord {
    /// n+1 positions; index 0 is the start position.
    pub fens: Vec<String>,
    /// n played moves in UCI form.
    pub moves_uci: Vec<String>,
    pub white_name: String,
    pub black_name: String,
    pub result: String,
    pub winner: String,
    #[serde(skip)]
    moves: Vec<ChessMove>,
    #[serde(skip)]
    boards: Vec<Board>,
}

impl GameRecord {
    /// Parse PGN text into a record. Fails as a whole if any move is
    /// unresolvable; no partially-imported games.
    pub fn from_pgn(pgn_text: &str) -> Result<Self, CoreError> {
        let headers = pgn::parse_headers(pgn_text);
        let san_moves = pgn::extract_moves(pgn_text);

        // A headers-only PGN is a real game with zero moves and one
        // position; text with neither tags nor moves is not a PGN.
        if san_moves.is_empty() && !pgn::has_headers(pgn_text) {
            return Err(CoreError::PgnParse("no moves found".to_string()));
        }

        let mut board = Board::default();
        let mut boards = vec![board];
        let mut fens = vec![board.to_string()];
        let mut moves = Vec::with_capacity(san_moves.len());
        let mut moves_uci = Vec::with_capacity(san_moves.len());

        for san_str in &san_moves {
            let m = san::parse_san(&board, san_str)?;
            moves.push(m);
            moves_uci.push(san::to_uci(m));
            board = board.make_move_new(m);
            boards.push(board);
            fens.push(board.to_string());
        }

        let winner = pgn::winner_from_result(&headers.result).to_string();

        Ok(Self {
            fens,
            moves_uci,
            white_name: headers.white,
            black_name: headers.black,
            result: headers.result,
            winner,
            moves,
            boards,
        })
    }

    /// Number of plies (half-moves) in the game.
    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    /// Board before the given ply (1-based ply, as in the API).
    pub fn board_before(&self, ply: usize) -> Option<&Board> {
        if ply == 0 {
            return None;
        }
        self.boards.get(ply - 1)
    }

    /// Board after the given ply.
    pub fn board_after(&self, ply: usize) -> Option<&Board> {
        if ply == 0 {
            return None;
        }
        self.boards.get(ply)
    }

    /// The move played at the given ply.
    pub fn move_at(&self, ply: usize) -> Option<ChessMove> {
        if ply == 0 {
            return None;
        }
        self.moves.get(ply - 1).copied()
    }

    /// All boards, index i = before move i (0-based), last = final position.
    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    /// All parsed moves, 0-based.
    pub fn moves(&self) -> &[ChessMove] {
        &self.moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::Color;

    #[test]
    fn two_move_game_builds_three_positions() {
        let game = GameRecord::from_pgn("1. e4 e5").unwrap();
        assert_eq!(game.ply_count(), 2);
        assert_eq!(game.fens.len(), 3);
        assert_eq!(game.moves_uci, vec!["e2e4", "e7e5"]);
        assert_eq!(game.winner, "Unknown");

        // Replay invariant: fens[i+1] = fens[i] + moves[i].
        for i in 0..game.ply_count() {
            let before = game.boards()[i];
            let after = before.make_move_new(game.moves()[i]);
            assert_eq!(after.to_string(), game.fens[i + 1]);
        }
    }

    #[test]
    fn ply_accessors_are_one_based() {
        let game = GameRecord::from_pgn("1. e4 e5 2. Nf3").unwrap();
        assert!(game.board_before(0).is_none());
        assert_eq!(
            game.board_before(1).unwrap().side_to_move(),
            Color::White
        );
        assert_eq!(game.board_after(1).unwrap().side_to_move(), Color::Black);
        assert_eq!(san::to_uci(game.move_at(3).unwrap()), "g1f3");
        assert!(game.move_at(4).is_none());
    }

    #[test]
    fn headers_only_pgn_imports_as_empty_game() {
        let pgn = "[White \"Ann\"]\n[Black \"Ben\"]\n[Result \"*\"]\n\n*";
        let game = GameRecord::from_pgn(pgn).unwrap();
        assert_eq!(game.ply_count(), 0);
        assert_eq!(game.fens, vec![Board::default().to_string()]);
        assert_eq!(game.white_name, "Ann");
    }

    #[test]
    fn broken_pgn_rejected_whole() {
        assert!(GameRecord::from_pgn("1. e5").is_err());
        assert!(GameRecord::from_pgn("no moves here at all").is_err());
    }

    #[test]
    fn headers_flow_through() {
        let pgn = "[White \"Ann\"]\n[Black \"Ben\"]\n[Result \"0-1\"]\n\n1. f3 e5 2. g4 Qh4# 0-1";
        let game = GameRecord::from_pgn(pgn).unwrap();
        assert_eq!(game.white_name, "Ann");
        assert_eq!(game.black_name, "Ben");
        assert_eq!(game.winner, "Black");
        assert_eq!(game.ply_count(), 4);
    }
}
