//! Overworked defender: one piece that is the sole defense of two
//! attacked pieces at once.

use chess::{BitBoard, Board, Color, Piece, Square};

use crate::board_utils::{attackers, piece_map, piece_value};

const MIN_VALUE: i32 = 3;

#[derive(Debug, Clone)]
pub struct Dependent {
    pub square: Square,
    pub piece: Piece,
    /// Attacked more than once; would fall even with the defender in place.
    pub unstable: bool,
}

#[derive(Debug, Clone)]
pub struct OverworkedDefender {
    pub square: Square,
    pub piece: Piece,
    /// Top two dependents, ranked by value.
    pub dependents: Vec<Dependent>,
    /// Bonus weight: at least one dependent is unstable.
    pub weighted: bool,
}

/// Find a mover piece that is the only defender of at least two attacked
/// mover pieces of minor value or higher. A dependent with a second
/// defender does not count; deflecting the candidate would lose nothing
/// there.
pub fn find(board: &Board, mover: Color) -> Option<OverworkedDefender> {
    let own_pieces: Vec<(Square, Piece)> = piece_map(board)
        .into_iter()
        .filter(|(_, piece, color)| *color == mover && piece_value(*piece) >= MIN_VALUE)
        .map(|(square, piece, _)| (square, piece))
        .collect();

    let mut best: Option<OverworkedDefender> = None;
    let mut best_rank = (0usize, 0i32);

    for &(defender_sq, defender_piece) in &own_pieces {
        let mut dependents = Vec::new();

        for &(square, piece) in &own_pieces {
            if square == defender_sq {
                continue;
            }
            let attacker_bb = attackers(board, !mover, square);
            if attacker_bb.popcnt() == 0 {
                continue;
            }
            let defender_bb = attackers(board, mover, square);
            if defender_bb != BitBoard::from_square(defender_sq) {
                continue;
            }
            dependents.push(Dependent {
                square,
                piece,
                unstable: attacker_bb.popcnt() > 1,
            });
        }

        if dependents.len() < 2 {
            continue;
        }

        dependents.sort_by_key(|d| -piece_value(d.piece));
        dependents.truncate(2);

        let rank = (
            dependents.len(),
            dependents.iter().map(|d| piece_value(d.piece)).sum::<i32>(),
        );
        if best.is_none() || rank > best_rank {
            best_rank = rank;
            let weighted = dependents.iter().any(|d| d.unstable);
            best = Some(OverworkedDefender {
                square: defender_sq,
                piece: defender_piece,
                dependents,
                weighted,
            });
        }
    }

    best
}
