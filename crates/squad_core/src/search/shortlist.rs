//! Per-position shortlisting.
//!
//! The search never enumerates combinations of a whole position; it takes a
//! bounded shortlist instead. This trades optimality for speed: a squad that
//! needs a candidate outside every shortlist cannot be found.

use crate::models::pool::by_score_desc;
use crate::models::CandidatePool;

/// Picks the candidates of one position that combination generation may use.
pub trait ShortlistStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `ranked` holds pool indices of one position, best score first.
    /// `needed` is how many the position still has to supply; `rotation` is the
    /// diversity pass number.
    ///
    /// Returned indices must be a subset of `ranked`, ordered best score first,
    /// and contain at least `needed` entries whenever `ranked` does.
    fn shortlist(
        &self,
        pool: &CandidatePool,
        ranked: &[usize],
        needed: usize,
        rotation: usize,
    ) -> Vec<usize>;
}

/// Top `score_depth` by score ∪ top `efficiency_depth` by score/price.
///
/// `rotation * stride` entries at the top of the score ranking are skipped so
/// repeated passes explore different squads. The efficiency half is never
/// rotated, which keeps cheap enablers available in every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreEfficiencyShortlist {
    pub score_depth: usize,
    pub efficiency_depth: usize,
    pub stride: usize,
}

impl ScoreEfficiencyShortlist {
    pub fn new(score_depth: usize, efficiency_depth: usize, stride: usize) -> Self {
        Self { score_depth, efficiency_depth, stride }
    }
}

impl ShortlistStrategy for ScoreEfficiencyShortlist {
    fn name(&self) -> &'static str {
        "score_efficiency"
    }

    fn shortlist(
        &self,
        pool: &CandidatePool,
        ranked: &[usize],
        needed: usize,
        rotation: usize,
    ) -> Vec<usize> {
        let depth = self.score_depth.max(needed);
        if ranked.len() <= depth {
            return ranked.to_vec();
        }

        // never rotate past the point where `depth` entries remain
        let offset = (rotation * self.stride).min(ranked.len() - depth);
        let mut picked: Vec<usize> = ranked[offset..offset + depth].to_vec();

        if self.efficiency_depth > 0 {
            let candidates = pool.candidates();
            let mut by_efficiency = ranked.to_vec();
            by_efficiency.sort_by(|&a, &b| {
                candidates[b]
                    .efficiency()
                    .total_cmp(&candidates[a].efficiency())
                    .then_with(|| by_score_desc(candidates, a, b))
            });
            for idx in by_efficiency.into_iter().take(self.efficiency_depth) {
                if !picked.contains(&idx) {
                    picked.push(idx);
                }
            }
        }

        picked.sort_by(|&a, &b| by_score_desc(pool.candidates(), a, b));
        picked
    }
}

/// Every available candidate. Only practical for small pools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExhaustiveShortlist;

impl ShortlistStrategy for ExhaustiveShortlist {
    fn name(&self) -> &'static str {
        "exhaustive"
    }

    fn shortlist(
        &self,
        _pool: &CandidatePool,
        ranked: &[usize],
        _needed: usize,
        _rotation: usize,
    ) -> Vec<usize> {
        ranked.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, Position};

    /// 10 midfielders: score 10..1 descending, one cheap bargain at the bottom.
    fn pool() -> CandidatePool {
        let mut candidates: Vec<Candidate> = (0..10)
            .map(|i| Candidate::new(i, 10.0 - i as f64, 10.0, Position::MID))
            .collect();
        candidates[9].price = 0.5; // score 1.0 / 0.5 = best efficiency
        CandidatePool::new(candidates).unwrap()
    }

    fn ids(pool: &CandidatePool, idx: &[usize]) -> Vec<u32> {
        idx.iter().map(|&i| pool.get(i).id).collect()
    }

    #[test]
    fn test_union_of_score_and_efficiency() {
        let pool = pool();
        let ranked = pool.position_indices(Position::MID).to_vec();
        let strategy = ScoreEfficiencyShortlist::new(3, 1, 2);
        let picked = strategy.shortlist(&pool, &ranked, 2, 0);
        assert_eq!(ids(&pool, &picked), vec![0, 1, 2, 9]);
    }

    #[test]
    fn test_rotation_skips_top_scorers() {
        let pool = pool();
        let ranked = pool.position_indices(Position::MID).to_vec();
        let strategy = ScoreEfficiencyShortlist::new(3, 0, 2);
        assert_eq!(ids(&pool, &strategy.shortlist(&pool, &ranked, 2, 1)), vec![2, 3, 4]);
        // clamped so that `depth` entries remain
        assert_eq!(ids(&pool, &strategy.shortlist(&pool, &ranked, 2, 50)), vec![7, 8, 9]);
    }

    #[test]
    fn test_small_positions_use_everything() {
        let pool = pool();
        let ranked = pool.position_indices(Position::MID).to_vec();
        let strategy = ScoreEfficiencyShortlist::new(15, 10, 2);
        assert_eq!(strategy.shortlist(&pool, &ranked, 5, 3), ranked);
        assert_eq!(ExhaustiveShortlist.shortlist(&pool, &ranked, 5, 0), ranked);
    }

    #[test]
    fn test_depth_never_below_needed() {
        let pool = pool();
        let ranked = pool.position_indices(Position::MID).to_vec();
        let strategy = ScoreEfficiencyShortlist::new(1, 0, 0);
        assert_eq!(strategy.shortlist(&pool, &ranked, 4, 0).len(), 4);
    }
}
