//! Score normalization: raw engine output to White-POV pawns and
//! mover-POV impact.

/// A raw engine score as reported over UCI, from the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawScore {
    Centipawns(i32),
    /// Forced mate in N moves; positive means the side to move mates.
    MateIn(i32),
}

/// Mate scores collapse to this sentinel. The sign encodes who mates whom;
/// the magnitude carries no mate-distance information.
pub const MATE_SENTINEL: f64 = 100.0;

/// Normalize a raw score to pawns from White's point of view.
/// An absent score (engine fault, no info line) is neutral.
pub fn pawn_score_white(score: Option<RawScore>, white_to_move: bool) -> f64 {
    let mover_pov = match score {
        Some(RawScore::MateIn(n)) => {
            if n > 0 {
                MATE_SENTINEL
            } else {
                -MATE_SENTINEL
            }
        }
        Some(RawScore::Centipawns(cp)) => f64::from(cp) / 100.0,
        None => 0.0,
    };

    if white_to_move {
        mover_pov
    } else {
        -mover_pov
    }
}

/// Evaluation swing attributed to one move, signed from the mover's
/// perspective: positive is good for whoever just moved.
pub fn impact(before: f64, after: f64, mover_is_white: bool) -> f64 {
    if mover_is_white {
        after - before
    } else {
        before - after
    }
}

/// Flip a White-POV score to a given side's point of view.
pub fn pov(white_score: f64, for_white: bool) -> f64 {
    if for_white {
        white_score
    } else {
        -white_score
    }
}
