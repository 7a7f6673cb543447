//! Move-quality labels and the impact classifier.

use serde::{Deserialize, Serialize};

/// Classification thresholds (pawns, mover POV)
const BLUNDER_AT: f64 = -2.0;
const BAD_AT: f64 = -0.75;
const PERFECT_AT: f64 = 3.0;
const BEST_AT: f64 = 1.5;
const GOOD_AT: f64 = 0.5;

/// Ordered quality labels, worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Blunder,
    Bad,
    Okay,
    Good,
    Best,
    Perfect,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Blunder => "blunder",
            Quality::Bad => "bad",
            Quality::Okay => "okay",
            Quality::Good => "good",
            Quality::Best => "best",
            Quality::Perfect => "perfect",
        }
    }
}

/// Impact band alone, without overrides.
pub fn classify_impact(impact: f64) -> Quality {
    if impact <= BLUNDER_AT {
        Quality::Blunder
    } else if impact <= BAD_AT {
        Quality::Bad
    } else if impact >= PERFECT_AT {
        Quality::Perfect
    } else if impact >= BEST_AT {
        Quality::Best
    } else if impact >= GOOD_AT {
        Quality::Good
    } else {
        Quality::Okay
    }
}

/// The canonical classifier: impact band, then the engine-agreement
/// override. Playing the engine's own top move is ground truth for "best",
/// so it wins over any band result below it. The further promotion to
/// `Perfect` is the brilliancy detector's call, applied by the caller.
pub fn classify(impact: f64, played_is_engine_best: bool) -> Quality {
    let band = classify_impact(impact);
    if played_is_engine_best && band < Quality::Best {
        Quality::Best
    } else {
        band
    }
}

/// Per-side tally. One field per label so an invalid key is a type error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityCounts {
    pub perfect: u32,
    pub best: u32,
    pub good: u32,
    pub okay: u32,
    pub bad: u32,
    pub blunder: u32,
}

impl QualityCounts {
    pub fn bump(&mut self, quality: Quality) {
        match quality {
            Quality::Perfect => self.perfect += 1,
            Quality::Best => self.best += 1,
            Quality::Good => self.good += 1,
            Quality::Okay => self.okay += 1,
            Quality::Bad => self.bad += 1,
            Quality::Blunder => self.blunder += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.perfect + self.best + self.good + self.okay + self.bad + self.blunder
    }
}
