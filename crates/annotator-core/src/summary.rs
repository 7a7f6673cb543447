//! Whole-game tallies: the classifier run over every ply, no detectors.

use chess::{ChessMove, Color};

use crate::eval::impact;
use crate::game::GameRecord;
use crate::quality::{classify, QualityCounts};

/// Classify every ply of a game from per-position White-POV evals and
/// per-position engine best moves, tallying per side.
///
/// `evals_white[i]` is the eval of position i (so `evals_white.len()` is
/// `ply_count + 1`); `best_moves[i]` is the engine top move from position
/// i when known. Both endpoints use this same classifier, so the per-move
/// and whole-game labels cannot drift apart.
pub fn tally(
    game: &GameRecord,
    evals_white: &[f64],
    best_moves: &[Option<ChessMove>],
) -> (QualityCounts, QualityCounts) {
    let mut white = QualityCounts::default();
    let mut black = QualityCounts::default();

    for (i, m) in game.moves().iter().enumerate() {
        let (before, after) = match (evals_white.get(i), evals_white.get(i + 1)) {
            (Some(b), Some(a)) => (*b, *a),
            _ => break,
        };
        let mover_is_white = game.boards()[i].side_to_move() == Color::White;
        let swing = impact(before, after, mover_is_white);
        let is_engine_best = best_moves
            .get(i)
            .copied()
            .flatten()
            .map(|b| b == *m)
            .unwrap_or(false);

        let quality = classify(swing, is_engine_best);
        if mover_is_white {
            white.bump(quality);
        } else {
            black.bump(quality);
        }
    }

    (white, black)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameRecord;
    use crate::quality::Quality;

    #[test]
    fn two_move_game_tallies_one_per_side() {
        let game = GameRecord::from_pgn("1. e4 e5").unwrap();
        let evals = vec![0.3, 0.2, 0.25];
        let best = vec![None, None, None];
        let (white, black) = tally(&game, &evals, &best);
        assert_eq!(white.total(), 1);
        assert_eq!(black.total(), 1);
        // White: 0.2 - 0.3 = -0.1 → okay. Black: -(0.25 - 0.2) = -0.05 → okay.
        assert_eq!(white.okay, 1);
        assert_eq!(black.okay, 1);
    }

    #[test]
    fn blunder_and_best_override_land_in_the_right_buckets() {
        let game = GameRecord::from_pgn("1. f3 e5 2. g4 Qh4#").unwrap();
        // White-POV evals: start equal, f3 slightly bad, e5 fine,
        // g4 loses everything, Qh4# is mate for Black.
        let evals = vec![0.2, -0.3, -0.4, -3.0, -100.0];
        let best = vec![
            None,
            None,
            None,
            Some(game.moves()[3]), // Qh4# matches the engine
            None,
        ];
        let (white, black) = tally(&game, &evals, &best);
        assert_eq!(white.total(), 2);
        assert_eq!(black.total(), 2);

        // 2. g4: impact -2.6 → blunder.
        assert_eq!(white.blunder, 1);
        // Qh4#: impact +97 → perfect by band, not demoted by the override.
        assert_eq!(black.perfect, 1);
        assert_eq!(white.okay, 1);
        assert_eq!(black.okay, 1);
    }

    #[test]
    fn engine_agreement_promotes_to_best() {
        let game = GameRecord::from_pgn("1. e4 e5").unwrap();
        let evals = vec![0.3, 0.25, 0.3];
        let best = vec![Some(game.moves()[0]), Some(game.moves()[1]), None];
        let (white, black) = tally(&game, &evals, &best);
        assert_eq!(white.best, 1);
        assert_eq!(black.best, 1);
        assert_eq!(white.total() + black.total(), 2);
    }

    #[test]
    fn quality_ordering_is_monotone() {
        assert!(Quality::Blunder < Quality::Bad);
        assert!(Quality::Best < Quality::Perfect);
    }
}
