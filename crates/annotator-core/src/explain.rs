//! Explanation composer: orders detector output into bullet text,
//! resolves conflicts between overlapping detectors, and attaches the
//! supporting facts.

use chess::{Board, ChessMove};
use serde::Serialize;

use crate::board_utils::{
    gives_check, is_capture, material_delta_for_mover, piece_name, piece_value,
};
use crate::detectors::Findings;
use crate::quality::Quality;
use crate::san;

/// Gains below this are not worth a sentence.
const GAIN_MENTION: f64 = 0.5;
/// Losses below this are not worth a sentence.
const LOSS_MENTION: f64 = -0.75;
/// How much of the opponent's punishing line to show.
const REPLY_LINE_PLIES: usize = 4;

/// A composed per-ply explanation.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub quality: Quality,
    pub impact: f64,
    pub bullets: Vec<String>,
    /// Stable machine-readable tags naming which reasons fired.
    pub reason_tags: Vec<String>,
}

pub struct ComposeInput<'a> {
    pub board_before: &'a Board,
    pub board_after: &'a Board,
    pub played: ChessMove,
    pub best: Option<ChessMove>,
    /// White-POV evals around the move.
    pub eval_before: f64,
    pub eval_after: f64,
    /// Mover-POV swing.
    pub impact: f64,
    pub quality: Quality,
    /// Engine PV from the position after the move (opponent to move).
    pub opponent_pv: &'a [String],
    pub findings: &'a Findings,
}

pub fn compose(input: &ComposeInput) -> Explanation {
    let mut bullets = Vec::new();
    let mut tags = Vec::new();

    let played_san = san::to_san(input.board_before, input.played);

    bullets.push(format!(
        "Evaluation changed from {:+.2} to {:+.2}.",
        input.eval_before, input.eval_after
    ));

    if let Some(brilliancy) = &input.findings.brilliancy {
        let kind = if brilliancy.quiet {
            "A quiet sacrifice"
        } else {
            "A true sacrifice"
        };
        bullets.push(format!(
            "{kind}: gives up about {} points of material, and the engine approves.",
            brilliancy.sacrificed
        ));
        tags.push("brilliancy".to_string());
        if brilliancy.quiet {
            tags.push("quiet_sacrifice".to_string());
        }
    }

    if let Some(hanging) = &input.findings.hanging {
        let name = piece_name(hanging.piece);
        if hanging.defender_count == 0 {
            bullets.push(format!(
                "Leaves your {name} on {} hanging (attacked from {} and undefended).",
                hanging.square, hanging.attacker_square
            ));
        } else {
            bullets.push(format!(
                "Leaves your {name} on {} under-defended ({} attackers vs {} defenders).",
                hanging.square, hanging.attacker_count, hanging.defender_count
            ));
        }
        tags.push("hanging_piece".to_string());
    }

    if let Some(overworked) = &input.findings.overworked {
        if let [first, second] = &overworked.dependents[..] {
            bullets.push(format!(
                "Your {} on {} is overworked: it is the glue holding both the {} on {} and the {} on {}.",
                piece_name(overworked.piece),
                overworked.square,
                piece_name(first.piece),
                first.square,
                piece_name(second.piece),
                second.square
            ));
            tags.push(if overworked.weighted {
                "overworked_defender_unstable".to_string()
            } else {
                "overworked_defender".to_string()
            });
        }
    }

    if let Some(opens) = &input.findings.opens_king {
        let mut text = format!(
            "The pawn push to {} loosens the shield in front of your king",
            opens.square
        );
        if opens.hole_creating {
            text.push_str(" and leaves a permanent hole");
        }
        text.push('.');
        bullets.push(text);
        tags.push("opens_king".to_string());
    }

    if matches!(input.quality, Quality::Bad | Quality::Blunder) {
        push_reply_bullets(input, &played_san, &mut bullets, &mut tags);
    }

    // A hanging piece is the dominant, more actionable explanation; the
    // tempo complaint would only muddy it.
    if input.findings.lost_tempo && input.findings.hanging.is_none() {
        bullets.push(format!(
            "{played_san} retraces this piece's steps without gaining anything — a lost tempo."
        ));
        tags.push("lost_tempo".to_string());
    }

    match input.best {
        Some(best) if best == input.played => {
            bullets.push("This matches the engine's best move.".to_string());
        }
        Some(best) => {
            let best_san = san::to_san(input.board_before, best);
            bullets.push(format!(
                "Engine preferred {best_san} instead of {played_san}."
            ));
        }
        None => {
            bullets.push("Engine best move not available for this position.".to_string());
        }
    }

    if input.impact <= LOSS_MENTION {
        bullets.push(format!("This costs about {:.2} pawns.", input.impact.abs()));
    } else if input.impact >= GAIN_MENTION {
        bullets.push(format!("This gains about {:.2} pawns.", input.impact));
    }

    Explanation {
        quality: input.quality,
        impact: input.impact,
        bullets,
        reason_tags: tags,
    }
}

/// Opponent's punishment, shown only for bad moves and blunders.
fn push_reply_bullets(
    input: &ComposeInput,
    played_san: &str,
    bullets: &mut Vec<String>,
    tags: &mut Vec<String>,
) {
    let reply = match input
        .opponent_pv
        .first()
        .and_then(|uci| san::parse_uci(uci))
        .filter(|m| input.board_after.legal(*m))
    {
        Some(m) => m,
        None => return,
    };

    let reply_san = san::to_san(input.board_after, reply);
    let capture_phrase = capture_phrase(input.board_after, reply, input.opponent_pv);
    let checks = gives_check(input.board_after, reply);

    match (capture_phrase, checks) {
        (Some(phrase), true) => bullets.push(format!(
            "After {played_san}, opponent can play {reply_san} — it {} and gives check.",
            phrase.trim_end_matches('.')
        )),
        (Some(phrase), false) => bullets.push(format!(
            "After {played_san}, opponent can play {reply_san} — it {phrase}"
        )),
        (None, true) => bullets.push(format!(
            "After {played_san}, opponent can play {reply_san} — it gives check."
        )),
        (None, false) => bullets.push(format!(
            "After {played_san}, opponent's best reply is {reply_san}."
        )),
    }
    tags.push("punished_by_reply".to_string());

    let line = san::pv_to_san(input.board_after, input.opponent_pv, REPLY_LINE_PLIES);
    if !line.is_empty() {
        bullets.push(format!("Main line: {}", line.join(" ")));
    }

    let end_board = san::apply_pv(input.board_after, input.opponent_pv, REPLY_LINE_PLIES);
    let mover = input.board_before.side_to_move();
    let delta = material_delta_for_mover(input.board_after, &end_board, mover);
    if delta != 0 {
        bullets.push(format!("Material change over this line: {delta:+}."));
    }
}

/// Describe the PV's first capture precisely: a recapture in the line is a
/// trade, otherwise material simply falls.
fn capture_phrase(board_after: &Board, reply: ChessMove, pv: &[String]) -> Option<String> {
    if !is_capture(board_after, reply) {
        return None;
    }

    let captured = match board_after.piece_on(reply.get_dest()) {
        Some(p) => p,
        None => return Some("captures material.".to_string()),
    };

    let name = piece_name(captured);
    let value = piece_value(captured);

    let next = board_after.make_move_new(reply);
    let recaptures = pv
        .get(1)
        .and_then(|uci| san::parse_uci(uci))
        .filter(|m| next.legal(*m))
        .map(|m| is_capture(&next, m))
        .unwrap_or(false);

    if recaptures {
        Some(format!("recaptures your {name} (trade)."))
    } else if value >= 3 {
        Some(format!("wins your {name}."))
    } else {
        Some(format!("wins a {name}."))
    }
}

/// Differential mode: which complaints apply to one branch but not the
/// other. Identical findings produce no bullets at all.
pub fn differential(
    played_findings: &Findings,
    best_findings: &Findings,
    played_san: &str,
    best_san: &str,
) -> Vec<String> {
    let mut bullets = Vec::new();

    let mut asym = |played_fired: bool, best_fired: bool, subject: &str| {
        if played_fired && !best_fired {
            bullets.push(format!(
                "Your move {played_san} {subject}; the engine's {best_san} does not."
            ));
        } else if best_fired && !played_fired {
            bullets.push(format!(
                "The engine's {best_san} {subject}, but your {played_san} avoids that."
            ));
        }
    };

    asym(
        played_findings.hanging.is_some(),
        best_findings.hanging.is_some(),
        "leaves a piece hanging",
    );
    asym(
        played_findings.overworked.is_some(),
        best_findings.overworked.is_some(),
        "leaves a defender overworked",
    );
    asym(
        played_findings.opens_king.is_some(),
        best_findings.opens_king.is_some(),
        "loosens the pawn shield in front of your king",
    );
    asym(
        played_findings.lost_tempo,
        best_findings.lost_tempo,
        "loses a tempo",
    );
    asym(
        played_findings.brilliancy.is_some(),
        best_findings.brilliancy.is_some(),
        "is a genuine sacrifice",
    );

    bullets
}
