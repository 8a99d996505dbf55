use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{CandidateId, Lineup, Position};

/// Captain pick for a lineup. The captain's score counts twice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptainChoice {
    pub captain_id: CandidateId,
    pub captain_score: f64,
    /// Lineup score plus the captain's score once more.
    pub total_score: f64,
}

/// Highest scorer among eligible positions; first in lineup order on ties.
///
/// `None` if no lineup member plays an eligible position.
pub fn score_with_captain(lineup: &Lineup, eligible: &BTreeSet<Position>) -> Option<CaptainChoice> {
    let mut best: Option<(CandidateId, f64)> = None;
    for c in lineup.members() {
        if !eligible.contains(&c.position) {
            continue;
        }
        if best.map_or(true, |(_, score)| c.score > score) {
            best = Some((c.id, c.score));
        }
    }

    best.map(|(captain_id, captain_score)| CaptainChoice {
        captain_id,
        captain_score,
        total_score: lineup.score() + captain_score,
    })
}
