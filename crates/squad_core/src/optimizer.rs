//! End-to-end optimization: search passes, lineup/captain evaluation, ranking.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::captain::score_with_captain;
use crate::config::OptimizerConfig;
use crate::error::{Result, SquadError};
use crate::lineup::best_lineup;
use crate::models::{Candidate, CandidatePool, Position, Squad};
use crate::ranking::{RankedResult, TopK};
use crate::search::{SearchBudget, SearchOutcome, SearchStats, SquadSearch};

/// Output of [`optimize`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct OptimizationReport {
    /// Best `top_k` distinct squads, best first.
    pub results: Vec<RankedResult>,
    /// Counters summed over every pass.
    pub stats: SearchStats,
    pub passes: usize,
    /// Squads handed to lineup/captain evaluation (before dedup).
    pub squads_evaluated: usize,
    /// At least one pass hit the deadline. Results come from the passes that
    /// finished.
    pub timed_out: bool,
}

/// Lineup and captain for one squad, as a ranked result.
///
/// `None` when the squad has no valid lineup or no eligible captain.
pub fn evaluate_squad(squad: &Squad, config: &OptimizerConfig) -> Option<RankedResult> {
    let (lineup, _) = best_lineup(squad, &config.formation)?;
    let captain = score_with_captain(&lineup, &config.captain_eligible_positions)?;
    Some(RankedResult::new(squad, &lineup, &captain, config.budget))
}

/// Pool indices of the locked ids, checked against the quotas.
fn resolve_locked(pool: &CandidatePool, config: &OptimizerConfig) -> Result<Vec<usize>> {
    let mut locked = Vec::with_capacity(config.locked_ids.len());
    for &id in &config.locked_ids {
        let idx = pool.index_of(id).ok_or(SquadError::UnknownCandidate(id))?;
        if !locked.contains(&idx) {
            locked.push(idx);
        }
    }

    for pos in Position::ALL {
        let n = locked.iter().filter(|&&idx| pool.get(idx).position == pos).count();
        if n > config.quota(pos) {
            return Err(SquadError::InvalidConfig(format!(
                "{n} locked {pos} candidates exceed the quota of {}",
                config.quota(pos)
            )));
        }
    }
    Ok(locked)
}

/// Run the full pipeline over `candidates`.
///
/// Configuration problems fail before any search. An infeasible pool is not an
/// error: the report simply has no results.
pub fn optimize(candidates: Vec<Candidate>, config: &OptimizerConfig) -> Result<OptimizationReport> {
    config.validate()?;
    let pool = CandidatePool::with_exclusions(candidates, &config.excluded_ids)?;
    let locked = resolve_locked(&pool, config)?;

    info!(
        candidates = pool.len(),
        budget = config.budget,
        beam_width = config.beam_width,
        passes = config.diversity_runs,
        "optimization started"
    );

    // one shared start time: every pass sees the same deadline
    let budget = SearchBudget::new(config.time_limit_ms, None);
    let outcomes: Vec<SearchOutcome> = (0..config.diversity_runs)
        .into_par_iter()
        .map(|rotation| -> Result<SearchOutcome> {
            let search = SquadSearch::from_config(&pool, config)?
                .with_rotation(rotation)
                .with_locked(locked.clone())?;
            Ok(search.run(&mut budget.clone()))
        })
        .collect::<Result<_>>()?;

    let report = merge_passes(outcomes, config);
    info!(
        results = report.results.len(),
        evaluated = report.squads_evaluated,
        best = ?report.results.first().map(|r| r.total_score),
        elapsed_ms = report.stats.elapsed_ms,
        "optimization finished"
    );

    Ok(report)
}

/// Fold finished (or timed-out) passes into one ranked report.
pub(crate) fn merge_passes(outcomes: Vec<SearchOutcome>, config: &OptimizerConfig) -> OptimizationReport {
    let mut report = OptimizationReport { passes: outcomes.len(), ..Default::default() };
    let mut squads: Vec<Squad> = Vec::new();
    for (rotation, outcome) in outcomes.into_iter().enumerate() {
        debug!(rotation, squads = outcome.squads.len(), timed_out = outcome.timed_out, "pass done");
        report.stats.merge(&outcome.stats);
        report.timed_out |= outcome.timed_out;
        squads.extend(outcome.squads.into_iter().map(|(squad, _)| squad));
    }
    report.squads_evaluated = squads.len();

    let k = config.top_k;
    report.results = squads
        .par_iter()
        .fold(
            || TopK::new(k),
            |mut acc, squad| {
                if let Some(result) = evaluate_squad(squad, config) {
                    acc.push(result);
                }
                acc
            },
        )
        .reduce(|| TopK::new(k), TopK::merge)
        .into_sorted_vec();

    if report.timed_out {
        warn!(
            limit_ms = ?config.time_limit_ms,
            results = report.results.len(),
            "deadline reached before every pass finished"
        );
    }
    report
}
