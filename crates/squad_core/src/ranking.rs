//! Result ranking and deduplication.
//!
//! Results are ordered by total score (desc), then total price (asc), then
//! squad member ids (lexicographic asc). Two results with the same squad
//! membership are the same result; only the first one seen is kept.

use std::cmp::Ordering;

use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::captain::CaptainChoice;
use crate::models::{CandidateId, Lineup, Squad};

/// One evaluated squad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Sorted ascending; the deduplication key.
    pub squad_member_ids: Vec<CandidateId>,
    /// Lineup order (by position, then score desc).
    pub lineup_member_ids: Vec<CandidateId>,
    pub captain_id: CandidateId,
    /// Lineup score with the captain counted twice.
    pub total_score: f64,
    pub lineup_score: f64,
    pub total_price: f64,
    pub formation: String,
    /// Best bench member first.
    pub bench_ids: Vec<CandidateId>,
    /// Unspent budget.
    pub price_margin: f64,
}

impl RankedResult {
    pub fn new(squad: &Squad, lineup: &Lineup, captain: &CaptainChoice, budget: f64) -> Self {
        Self {
            squad_member_ids: squad.member_ids(),
            lineup_member_ids: lineup.member_ids(),
            captain_id: captain.captain_id,
            total_score: captain.total_score,
            lineup_score: lineup.score(),
            total_price: squad.total_price(),
            formation: lineup.formation_code(),
            bench_ids: lineup.bench(squad).iter().map(|c| c.id).collect(),
            price_margin: budget - squad.total_price(),
        }
    }
}

/// Total order used for every ranked list.
pub fn rank_order(a: &RankedResult, b: &RankedResult) -> Ordering {
    b.total_score
        .total_cmp(&a.total_score)
        .then_with(|| a.total_price.total_cmp(&b.total_price))
        .then_with(|| a.squad_member_ids.cmp(&b.squad_member_ids))
}

/// Deduplicate, sort and keep the best `k`.
pub fn top_k(results: Vec<RankedResult>, k: usize) -> Vec<RankedResult> {
    let mut acc = TopK::new(k);
    acc.extend(results);
    acc.into_sorted_vec()
}

/// Bounded best-`k` accumulator.
///
/// Workers each fill their own `TopK` and the partial lists are merged at the
/// end, so no lock is ever taken.
#[derive(Debug, Clone)]
pub struct TopK {
    k: usize,
    items: Vec<RankedResult>,
    seen: FxHashSet<Vec<CandidateId>>,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self { k, items: Vec::new(), seen: FxHashSet::default() }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.items.len().min(self.k)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns false when a squad with the same membership was already seen.
    /// `squad_member_ids` is stored sorted, whatever order it arrives in.
    pub fn push(&mut self, mut result: RankedResult) -> bool {
        result.squad_member_ids.sort_unstable();
        if self.k == 0 || !self.seen.insert(result.squad_member_ids.clone()) {
            return false;
        }
        self.items.push(result);
        // amortized compaction
        if self.items.len() >= self.k.saturating_mul(2).max(64) {
            self.compact();
        }
        true
    }

    pub fn extend<I: IntoIterator<Item = RankedResult>>(&mut self, results: I) {
        for result in results {
            self.push(result);
        }
    }

    /// Fold another accumulator into this one.
    pub fn merge(mut self, other: TopK) -> TopK {
        self.extend(other.items);
        self
    }

    pub fn into_sorted_vec(mut self) -> Vec<RankedResult> {
        self.compact();
        self.items
    }

    fn compact(&mut self) {
        self.items.sort_by(rank_order);
        self.items.truncate(self.k);
    }
}
