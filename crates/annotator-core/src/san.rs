//! Move notation: UCI parsing/formatting, SAN parsing and rendering.

use chess::{Board, ChessMove, File, MoveGen, Piece, Rank, Square, EMPTY};

use crate::board_utils::is_capture;
use crate::error::CoreError;

/// Parse a UCI move string ("e2e4", "e7e8q"). Returns None on malformed
/// input; legality is the caller's concern.
pub fn parse_uci(uci: &str) -> Option<ChessMove> {
    let bytes = uci.as_bytes();
    if bytes.len() < 4 {
        return None;
    }
    if !bytes[..4].iter().enumerate().all(|(i, &b)| {
        if i % 2 == 0 {
            (b'a'..=b'h').contains(&b)
        } else {
            (b'1'..=b'8').contains(&b)
        }
    }) {
        return None;
    }

    let square_at = |file: u8, rank: u8| {
        Square::make_square(
            Rank::from_index((rank - b'1') as usize),
            File::from_index((file - b'a') as usize),
        )
    };
    let from = square_at(bytes[0], bytes[1]);
    let to = square_at(bytes[2], bytes[3]);

    let promotion = match bytes.get(4) {
        Some(b'q') | Some(b'Q') => Some(Piece::Queen),
        Some(b'r') | Some(b'R') => Some(Piece::Rook),
        Some(b'b') | Some(b'B') => Some(Piece::Bishop),
        Some(b'n') | Some(b'N') => Some(Piece::Knight),
        Some(_) => return None,
        None => None,
    };

    Some(ChessMove::new(from, to, promotion))
}

/// Format a move as UCI.
pub fn to_uci(m: ChessMove) -> String {
    let promo = m
        .get_promotion()
        .map(|p| match p {
            Piece::Queen => "q",
            Piece::Rook => "r",
            Piece::Bishop => "b",
            Piece::Knight => "n",
            _ => "",
        })
        .unwrap_or("");
    format!("{}{}{}", m.get_source(), m.get_dest(), promo)
}

/// Resolve a SAN move string against a position.
pub fn parse_san(board: &Board, san: &str) -> Result<ChessMove, CoreError> {
    let clean = san.trim_end_matches(|c: char| matches!(c, '+' | '#' | '!' | '?'));
    let legal_moves: Vec<ChessMove> = MoveGen::new_legal(board).collect();

    if clean == "O-O" || clean == "0-0" {
        return find_castling(board, &legal_moves, true)
            .ok_or_else(|| CoreError::SanParse(san.to_string()));
    }
    if clean == "O-O-O" || clean == "0-0-0" {
        return find_castling(board, &legal_moves, false)
            .ok_or_else(|| CoreError::SanParse(san.to_string()));
    }

    let bytes = clean.as_bytes();
    if bytes.is_empty() {
        return Err(CoreError::SanParse(san.to_string()));
    }

    let (piece, rest) = if bytes[0].is_ascii_uppercase() {
        let p = match bytes[0] {
            b'K' => Piece::King,
            b'Q' => Piece::Queen,
            b'R' => Piece::Rook,
            b'B' => Piece::Bishop,
            b'N' => Piece::Knight,
            _ => return Err(CoreError::SanParse(san.to_string())),
        };
        (p, &clean[1..])
    } else {
        (Piece::Pawn, clean)
    };

    let (rest, promotion) = match rest.find('=') {
        Some(eq) => {
            let promo = match rest.as_bytes().get(eq + 1) {
                Some(b'Q') => Some(Piece::Queen),
                Some(b'R') => Some(Piece::Rook),
                Some(b'B') => Some(Piece::Bishop),
                Some(b'N') => Some(Piece::Knight),
                _ => None,
            };
            (&rest[..eq], promo)
        }
        None => (rest, None),
    };

    let rest = rest.replace('x', "");
    let rest_bytes = rest.as_bytes();
    if rest_bytes.len() < 2 {
        return Err(CoreError::SanParse(san.to_string()));
    }

    let dest_file = rest_bytes[rest_bytes.len() - 2];
    let dest_rank = rest_bytes[rest_bytes.len() - 1];
    if !(b'a'..=b'h').contains(&dest_file) || !(b'1'..=b'8').contains(&dest_rank) {
        return Err(CoreError::SanParse(san.to_string()));
    }
    let dest = Square::make_square(
        Rank::from_index((dest_rank - b'1') as usize),
        File::from_index((dest_file - b'a') as usize),
    );

    let disambig = &rest[..rest.len() - 2];

    let mut candidates: Vec<ChessMove> = legal_moves
        .into_iter()
        .filter(|m| {
            m.get_dest() == dest
                && board.piece_on(m.get_source()) == Some(piece)
                && m.get_promotion() == promotion
        })
        .collect();

    // Applied even with a single candidate, so a contradictory
    // disambiguator like "Nbd2" against a lone f3-knight is rejected.
    if !disambig.is_empty() {
        let disambig_bytes = disambig.as_bytes();
        candidates.retain(|m| {
            let src = m.get_source();
            disambig_bytes.iter().all(|&b| {
                if (b'a'..=b'h').contains(&b) {
                    src.get_file().to_index() == (b - b'a') as usize
                } else if (b'1'..=b'8').contains(&b) {
                    src.get_rank().to_index() == (b - b'1') as usize
                } else {
                    true
                }
            })
        });
    }

    match candidates.len() {
        1 => Ok(candidates[0]),
        _ => Err(CoreError::SanParse(san.to_string())),
    }
}

fn find_castling(board: &Board, legal_moves: &[ChessMove], kingside: bool) -> Option<ChessMove> {
    legal_moves.iter().copied().find(|m| {
        if board.piece_on(m.get_source()) != Some(Piece::King) {
            return false;
        }
        let src_file = m.get_source().get_file().to_index() as i32;
        let dst_file = m.get_dest().get_file().to_index() as i32;
        if kingside {
            dst_file - src_file == 2
        } else {
            src_file - dst_file == 2
        }
    })
}

/// Render a legal move in standard algebraic notation. Falls back to the
/// UCI string for moves that are not legal in `board`.
pub fn to_san(board: &Board, m: ChessMove) -> String {
    if !board.legal(m) {
        return to_uci(m);
    }

    let piece = match board.piece_on(m.get_source()) {
        Some(p) => p,
        None => return to_uci(m),
    };

    let after = board.make_move_new(m);
    let suffix = if *after.checkers() != EMPTY {
        if MoveGen::new_legal(&after).len() == 0 {
            "#"
        } else {
            "+"
        }
    } else {
        ""
    };

    if crate::board_utils::is_castling_move(board, m) {
        let kingside = m.get_dest().get_file().to_index() > m.get_source().get_file().to_index();
        let base = if kingside { "O-O" } else { "O-O-O" };
        return format!("{base}{suffix}");
    }

    let capture = is_capture(board, m);
    let dest = m.get_dest().to_string();
    let promo = m
        .get_promotion()
        .map(|p| {
            format!(
                "={}",
                match p {
                    Piece::Queen => "Q",
                    Piece::Rook => "R",
                    Piece::Bishop => "B",
                    Piece::Knight => "N",
                    _ => "",
                }
            )
        })
        .unwrap_or_default();

    if piece == Piece::Pawn {
        let prefix = if capture {
            let file = (b'a' + m.get_source().get_file().to_index() as u8) as char;
            format!("{file}x")
        } else {
            String::new()
        };
        return format!("{prefix}{dest}{promo}{suffix}");
    }

    let letter = match piece {
        Piece::King => "K",
        Piece::Queen => "Q",
        Piece::Rook => "R",
        Piece::Bishop => "B",
        Piece::Knight => "N",
        Piece::Pawn => "",
    };

    // Disambiguate against other same-type pieces that can reach the square.
    let others: Vec<Square> = MoveGen::new_legal(board)
        .filter(|o| {
            o.get_dest() == m.get_dest()
                && o.get_source() != m.get_source()
                && board.piece_on(o.get_source()) == Some(piece)
        })
        .map(|o| o.get_source())
        .collect();

    let disambig = if others.is_empty() {
        String::new()
    } else {
        let src = m.get_source();
        let file_unique = others
            .iter()
            .all(|s| s.get_file() != src.get_file());
        let rank_unique = others
            .iter()
            .all(|s| s.get_rank() != src.get_rank());
        if file_unique {
            format!("{}", (b'a' + src.get_file().to_index() as u8) as char)
        } else if rank_unique {
            format!("{}", (b'1' + src.get_rank().to_index() as u8) as char)
        } else {
            src.to_string()
        }
    };

    let cap = if capture { "x" } else { "" };
    format!("{letter}{disambig}{cap}{dest}{suffix}")
}

/// Render a principal variation (UCI strings) as SAN, applying each move in
/// turn. Stops at the first move that fails to apply.
pub fn pv_to_san(board: &Board, pv: &[String], limit: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = *board;
    for uci in pv.iter().take(limit) {
        let m = match parse_uci(uci) {
            Some(m) if current.legal(m) => m,
            _ => break,
        };
        out.push(to_san(&current, m));
        current = current.make_move_new(m);
    }
    out
}

/// Apply a PV prefix to a board, stopping at the first illegal move.
pub fn apply_pv(board: &Board, pv: &[String], limit: usize) -> Board {
    let mut current = *board;
    for uci in pv.iter().take(limit) {
        match parse_uci(uci) {
            Some(m) if current.legal(m) => current = current.make_move_new(m),
            _ => break,
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parse_uci_basic_and_promotion() {
        let m = parse_uci("e2e4").unwrap();
        assert_eq!(m.get_source().to_string(), "e2");
        assert_eq!(m.get_dest().to_string(), "e4");
        assert_eq!(m.get_promotion(), None);

        let p = parse_uci("e7e8q").unwrap();
        assert_eq!(p.get_promotion(), Some(Piece::Queen));

        assert!(parse_uci("e9e4").is_none());
        assert!(parse_uci("e2").is_none());
    }

    #[test]
    fn san_round_trip_opening_moves() {
        let board = Board::default();
        let e4 = parse_san(&board, "e4").unwrap();
        assert_eq!(to_uci(e4), "e2e4");
        assert_eq!(to_san(&board, e4), "e4");

        let nf3 = parse_san(&board, "Nf3").unwrap();
        assert_eq!(to_uci(nf3), "g1f3");
        assert_eq!(to_san(&board, nf3), "Nf3");
    }

    #[test]
    fn san_disambiguation_by_file() {
        // Two knights (b1, f3) can both reach d2.
        let board =
            Board::from_str("rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 0 3")
                .unwrap();
        let m = parse_san(&board, "Nbd2").unwrap();
        assert_eq!(to_uci(m), "b1d2");
        assert_eq!(to_san(&board, m), "Nbd2");
    }

    #[test]
    fn san_wrong_disambiguator_is_rejected() {
        // Only the f3 knight can reach d2, so "Nbd2" names a piece that
        // is not there.
        let board = Board::from_str("4k3/8/8/8/8/5N2/8/4K3 w - - 0 1").unwrap();
        assert_eq!(to_uci(parse_san(&board, "Nfd2").unwrap()), "f3d2");
        assert!(parse_san(&board, "Nbd2").is_err());
        assert!(parse_san(&board, "N1d2").is_err());
    }

    #[test]
    fn san_capture_and_check_suffix() {
        // Scholar's mate position one move before the end.
        let board = Board::from_str(
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5Q2/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
        )
        .unwrap();
        let m = parse_san(&board, "Qxf7#").unwrap();
        assert_eq!(to_uci(m), "f3f7");
        assert_eq!(to_san(&board, m), "Qxf7#");
    }

    #[test]
    fn san_castling() {
        let board =
            Board::from_str("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N1B/PPPP1PPP/RNBQK2R w KQkq - 4 4")
                .unwrap();
        let m = parse_san(&board, "O-O").unwrap();
        assert_eq!(to_uci(m), "e1g1");
        assert_eq!(to_san(&board, m), "O-O");
    }

    #[test]
    fn pv_to_san_stops_at_illegal() {
        let board = Board::default();
        let pv = vec![
            "e2e4".to_string(),
            "e7e5".to_string(),
            "e4e5".to_string(), // illegal: own pawn blocked
        ];
        let san = pv_to_san(&board, &pv, 6);
        assert_eq!(san, vec!["e4", "e5"]);
    }
}
