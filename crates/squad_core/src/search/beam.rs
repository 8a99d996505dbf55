//! Beam search over squads.
//!
//! Positions are filled one stage at a time (GK → DEF → MID → FWD). Each
//! frontier state is extended with every shortlist combination of the stage's
//! quota that keeps the group cap and the budget (including a lower bound on
//! the cheapest completion). The next frontier is cut to `beam_width` states by
//! mean member score, so results are a good approximate top set and not a
//! certified optimum.

use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

use super::combinations::Combinations;
use super::deadline::SearchBudget;
use super::shortlist::{ScoreEfficiencyShortlist, ShortlistStrategy};
use crate::config::OptimizerConfig;
use crate::error::{Result, SquadError};
use crate::models::{Candidate, CandidatePool, Position, Squad};

/// Absolute tolerance for price-vs-budget comparisons.
pub const PRICE_EPSILON: f64 = 1e-9;

#[inline]
pub(crate) fn within_budget(cost: f64, budget: f64) -> bool {
    cost <= budget + PRICE_EPSILON
}

/// Knobs for one search pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub budget: f64,
    pub quotas: [usize; Position::COUNT],
    pub max_per_group: usize,
    pub beam_width: usize,
    pub max_results: usize,
    /// Diversity pass number handed to the shortlist strategy.
    pub rotation: usize,
    /// Pool indices that every squad must contain.
    pub locked: Vec<usize>,
}

impl SearchParams {
    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self {
            budget: config.budget,
            quotas: config.quota_table(),
            max_per_group: config.max_per_group,
            beam_width: config.beam_width,
            max_results: config.max_results,
            rotation: 0,
            locked: Vec::new(),
        }
    }

    /// Reject knobs the search cannot run with, and locked indices that are
    /// not in a pool of `pool_len` candidates.
    pub fn validate(&self, pool_len: usize) -> Result<()> {
        let invalid = |msg: String| Err(SquadError::InvalidConfig(msg));

        if !self.budget.is_finite() || self.budget < 0.0 {
            return invalid(format!("budget must be a finite non-negative number, got {}", self.budget));
        }
        for (name, value) in [
            ("beam_width", self.beam_width),
            ("max_results", self.max_results),
            ("max_per_group", self.max_per_group),
        ] {
            if value == 0 {
                return invalid(format!("{name} must be positive"));
            }
        }
        let mut seen = Vec::with_capacity(self.locked.len());
        for &idx in &self.locked {
            if idx >= pool_len {
                return invalid(format!("locked index {idx} outside pool of {pool_len}"));
            }
            if seen.contains(&idx) {
                return invalid(format!("locked index {idx} listed twice"));
            }
            seen.push(idx);
        }
        Ok(())
    }
}

/// Counters for one search pass (summed over passes by the optimizer).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchStats {
    pub states_expanded: u64,
    pub combinations_tried: u64,
    pub pruned_group: u64,
    pub pruned_budget: u64,
    pub pruned_bound: u64,
    /// Frontier size after each completed stage.
    pub frontier_sizes: Vec<usize>,
    pub invalid_states: u64,
    pub elapsed_ms: u64,
}

impl SearchStats {
    pub fn merge(&mut self, other: &SearchStats) {
        self.states_expanded += other.states_expanded;
        self.combinations_tried += other.combinations_tried;
        self.pruned_group += other.pruned_group;
        self.pruned_budget += other.pruned_budget;
        self.pruned_bound += other.pruned_bound;
        self.invalid_states += other.invalid_states;
        self.elapsed_ms = self.elapsed_ms.max(other.elapsed_ms);
        if self.frontier_sizes.len() < other.frontier_sizes.len() {
            self.frontier_sizes.resize(other.frontier_sizes.len(), 0);
        }
        for (acc, size) in self.frontier_sizes.iter_mut().zip(&other.frontier_sizes) {
            *acc += size;
        }
    }
}

/// Result of one search pass.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Complete squads paired with their total price, best frontier rank first.
    pub squads: Vec<(Squad, f64)>,
    pub stats: SearchStats,
    /// The budget ran out between stages; `squads` is empty in that case.
    pub timed_out: bool,
}

/// Partial squad carried through the frontier.
#[derive(Debug, Clone)]
struct BeamState {
    cost: f64,
    score_sum: f64,
    members: Vec<usize>,
    fill: [usize; Position::COUNT],
    group_counts: Vec<u16>,
}

impl BeamState {
    fn empty(group_count: usize) -> Self {
        Self {
            cost: 0.0,
            score_sum: 0.0,
            members: Vec::new(),
            fill: [0; Position::COUNT],
            group_counts: vec![0; group_count],
        }
    }

    #[inline]
    fn mean_score(&self) -> f64 {
        if self.members.is_empty() {
            0.0
        } else {
            self.score_sum / self.members.len() as f64
        }
    }
}

/// Frontier ranking: mean score desc, cost asc, member indices asc.
fn frontier_order(a: &BeamState, b: &BeamState) -> Ordering {
    b.mean_score()
        .total_cmp(&a.mean_score())
        .then(a.cost.total_cmp(&b.cost))
        .then_with(|| a.members.cmp(&b.members))
}

/// One precomputed shortlist combination.
#[derive(Debug, Clone)]
struct Combo {
    members: Vec<usize>,
    price: f64,
    score: f64,
    /// (group, count) pairs, each group once.
    groups: Vec<(usize, u16)>,
}

#[derive(Debug)]
struct Stage {
    position: Position,
    combos: Vec<Combo>,
    /// Lower bound on the cost of every later stage.
    remaining_lower_bound: f64,
}

/// Candidate extension of one state, materialized only if it survives.
#[derive(Debug, Clone, Copy)]
struct Extension {
    combo: usize,
    cost: f64,
    score_sum: f64,
}

#[derive(Debug, Default)]
struct StageCounters {
    tried: u64,
    pruned_group: u64,
    pruned_budget: u64,
    pruned_bound: u64,
}

pub struct SquadSearch<'a, S: ShortlistStrategy = ScoreEfficiencyShortlist> {
    pool: &'a CandidatePool,
    strategy: S,
    params: SearchParams,
}

impl<'a> SquadSearch<'a, ScoreEfficiencyShortlist> {
    /// Search with the default shortlist built from `config`.
    pub fn from_config(pool: &'a CandidatePool, config: &OptimizerConfig) -> Result<Self> {
        let strategy = ScoreEfficiencyShortlist::new(
            config.shortlist_size,
            config.efficiency_shortlist_size,
            config.diversity_stride,
        );
        SquadSearch::new(pool, strategy, SearchParams::from_config(config))
    }
}

impl<'a, S: ShortlistStrategy> SquadSearch<'a, S> {
    /// Fails with `InvalidConfig` when `params` cannot drive a search.
    pub fn new(pool: &'a CandidatePool, strategy: S, params: SearchParams) -> Result<Self> {
        params.validate(pool.len())?;
        Ok(Self { pool, strategy, params })
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn with_rotation(mut self, rotation: usize) -> Self {
        self.params.rotation = rotation;
        self
    }

    pub fn with_locked(mut self, locked: Vec<usize>) -> Result<Self> {
        self.params.locked = locked;
        self.params.validate(self.pool.len())?;
        Ok(self)
    }

    fn locked_at(&self, position: Position) -> Vec<usize> {
        self.params
            .locked
            .iter()
            .copied()
            .filter(|&idx| self.pool.get(idx).position == position)
            .collect()
    }

    /// Precompute shortlist combinations for every stage.
    ///
    /// `None` when some position cannot be filled at all (infeasible pool or
    /// budget below the cheapest squad).
    fn build_stages(&self) -> Option<Vec<Stage>> {
        let p = &self.params;

        let mut min_cost = [0.0; Position::COUNT];
        for pos in Position::ALL {
            let locked = self.locked_at(pos);
            min_cost[pos.index()] = self.pool.cheapest_cost(pos, p.quotas[pos.index()], &locked)?;
        }
        let total_min: f64 = min_cost.iter().sum();
        if !within_budget(total_min, p.budget) {
            debug!(total_min, budget = p.budget, "cheapest possible squad exceeds budget");
            return None;
        }

        let mut stages = Vec::with_capacity(Position::COUNT);
        for (stage_idx, pos) in Position::ALL.into_iter().enumerate() {
            let quota = p.quotas[pos.index()];
            let locked = self.locked_at(pos);
            let needed = quota - locked.len();

            let ranked: Vec<usize> = self
                .pool
                .position_indices(pos)
                .iter()
                .copied()
                .filter(|idx| !locked.contains(idx))
                .collect();
            let shortlist = self.strategy.shortlist(self.pool, &ranked, needed, p.rotation);

            let others_min: f64 = total_min - min_cost[pos.index()];
            let combos: Vec<Combo> = Combinations::new(&shortlist, needed)
                .map(|free| {
                    let mut members = locked.clone();
                    members.extend(free);
                    self.make_combo(members)
                })
                // state-independent prunes: group cap alone, and price with
                // every other position at its cheapest
                .filter(|c| c.groups.iter().all(|&(_, n)| n as usize <= p.max_per_group))
                .filter(|c| within_budget(c.price + others_min, p.budget))
                .collect();

            let remaining_lower_bound = Position::ALL[stage_idx + 1..]
                .iter()
                .map(|later| min_cost[later.index()])
                .sum();

            debug!(
                position = %pos,
                shortlist = shortlist.len(),
                combos = combos.len(),
                strategy = self.strategy.name(),
                "stage prepared"
            );
            stages.push(Stage { position: pos, combos, remaining_lower_bound });
        }
        Some(stages)
    }

    fn make_combo(&self, members: Vec<usize>) -> Combo {
        let mut price = 0.0;
        let mut score = 0.0;
        let mut groups: Vec<(usize, u16)> = Vec::new();
        for &idx in &members {
            let c = self.pool.get(idx);
            price += c.price;
            score += c.score;
            if let Some(g) = self.pool.group_index(idx) {
                match groups.iter_mut().find(|(group, _)| *group == g) {
                    Some((_, n)) => *n += 1,
                    None => groups.push((g, 1)),
                }
            }
        }
        Combo { members, price, score, groups }
    }

    /// Extend one state with every admissible combo, keeping its local top
    /// `beam_width`. The union of local tops contains the global top.
    fn expand(&self, state: &BeamState, stage: &Stage) -> (Vec<BeamState>, StageCounters) {
        let p = &self.params;
        let mut counters = StageCounters::default();
        let mut extensions: Vec<Extension> = Vec::new();

        for (combo_idx, combo) in stage.combos.iter().enumerate() {
            counters.tried += 1;

            let over_cap = combo
                .groups
                .iter()
                .any(|&(g, n)| (state.group_counts[g] + n) as usize > p.max_per_group);
            if over_cap {
                counters.pruned_group += 1;
                continue;
            }

            let cost = state.cost + combo.price;
            if !within_budget(cost, p.budget) {
                counters.pruned_budget += 1;
                continue;
            }
            if !within_budget(cost + stage.remaining_lower_bound, p.budget) {
                counters.pruned_bound += 1;
                continue;
            }

            extensions.push(Extension { combo: combo_idx, cost, score_sum: state.score_sum + combo.score });
        }

        // every extension has the same member count, so sum order == mean order
        let order = |a: &Extension, b: &Extension| {
            b.score_sum
                .total_cmp(&a.score_sum)
                .then(a.cost.total_cmp(&b.cost))
                .then_with(|| stage.combos[a.combo].members.cmp(&stage.combos[b.combo].members))
        };
        if extensions.len() > p.beam_width {
            extensions.select_nth_unstable_by(p.beam_width - 1, order);
            extensions.truncate(p.beam_width);
        }

        let next = extensions
            .into_iter()
            .map(|ext| {
                let combo = &stage.combos[ext.combo];
                let mut members = Vec::with_capacity(state.members.len() + combo.members.len());
                members.extend_from_slice(&state.members);
                members.extend_from_slice(&combo.members);
                let mut group_counts = state.group_counts.clone();
                for &(g, n) in &combo.groups {
                    group_counts[g] += n;
                }
                let mut fill = state.fill;
                fill[stage.position.index()] += combo.members.len();
                BeamState { cost: ext.cost, score_sum: ext.score_sum, members, fill, group_counts }
            })
            .collect();

        (next, counters)
    }

    /// Run the search under `budget`.
    pub fn run(&self, budget: &mut SearchBudget) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();
        let p = &self.params;

        let Some(stages) = self.build_stages() else {
            debug!("pool cannot fill the quotas within budget; no squads");
            outcome.stats.elapsed_ms = budget.elapsed_ms();
            return outcome;
        };

        let mut frontier = vec![BeamState::empty(self.pool.group_count())];

        for stage in &stages {
            if budget.is_exceeded() {
                warn!(
                    position = %stage.position,
                    reason = %budget.get_exceeded_reason().unwrap_or_default(),
                    "search budget exceeded; abandoning pass"
                );
                outcome.timed_out = true;
                outcome.stats.elapsed_ms = budget.elapsed_ms();
                return outcome;
            }

            let expanded: Vec<(Vec<BeamState>, StageCounters)> =
                frontier.par_iter().map(|state| self.expand(state, stage)).collect();

            let mut tried = 0;
            let mut next: Vec<BeamState> = Vec::new();
            for (states, counters) in expanded {
                tried += counters.tried;
                outcome.stats.pruned_group += counters.pruned_group;
                outcome.stats.pruned_budget += counters.pruned_budget;
                outcome.stats.pruned_bound += counters.pruned_bound;
                next.extend(states);
            }
            outcome.stats.states_expanded += frontier.len() as u64;
            outcome.stats.combinations_tried += tried;

            if next.len() > p.beam_width {
                next.select_nth_unstable_by(p.beam_width - 1, frontier_order);
                next.truncate(p.beam_width);
            }
            next.sort_by(frontier_order);

            #[cfg(feature = "strict_contracts")]
            next.retain(|state| self.check_state(state, &mut outcome.stats));

            debug!(position = %stage.position, frontier = next.len(), tried, "stage done");
            outcome.stats.frontier_sizes.push(next.len());
            frontier = next;
            budget.tick_stage(tried);

            if frontier.is_empty() {
                break;
            }
        }

        for state in frontier.into_iter().take(p.max_results) {
            match self.finalize(&state) {
                Ok(squad) => {
                    let price = squad.total_price();
                    outcome.squads.push((squad, price));
                }
                Err(err) => {
                    error!(members = ?state.members, %err, "dropping invalid generated squad");
                    outcome.stats.invalid_states += 1;
                }
            }
        }

        outcome.stats.elapsed_ms = budget.elapsed_ms();
        outcome
    }

    fn finalize(&self, state: &BeamState) -> Result<Squad> {
        let p = &self.params;
        let broken = |msg: String| Err(SquadError::InvalidState(msg));
        if state.fill != p.quotas {
            return broken(format!("fill {:?} does not match quotas {:?}", state.fill, p.quotas));
        }
        if !within_budget(state.cost, p.budget) {
            return broken(format!("cost {} exceeds budget {}", state.cost, p.budget));
        }
        if state.group_counts.iter().any(|&n| n as usize > p.max_per_group) {
            return broken("group cap exceeded".to_string());
        }
        let members: Vec<Candidate> =
            state.members.iter().map(|&idx| self.pool.get(idx).clone()).collect();
        Squad::finalize(members, &p.quotas)
    }

    #[cfg(feature = "strict_contracts")]
    fn check_state(&self, state: &BeamState, stats: &mut SearchStats) -> bool {
        let mut seen = state.members.clone();
        seen.sort_unstable();
        seen.dedup();
        let ok = seen.len() == state.members.len()
            && state.group_counts.iter().all(|&n| n as usize <= self.params.max_per_group)
            && within_budget(state.cost, self.params.budget);
        if !ok {
            error!(members = ?state.members, "frontier state violates invariants");
            stats.invalid_states += 1;
        }
        ok
    }
}

/// Convenience entry point mirroring the engine contract:
/// `search(pool, budget, quotas, max_per_group, beam_width, shortlist_size, max_results)`.
///
/// Bad knobs fail with `InvalidConfig` before any work; an infeasible pool is
/// an empty list.
pub fn search(
    pool: &CandidatePool,
    budget: f64,
    quotas: &BTreeMap<Position, usize>,
    max_per_group: usize,
    beam_width: usize,
    shortlist_size: usize,
    max_results: usize,
) -> Result<Vec<(Squad, f64)>> {
    if shortlist_size == 0 {
        return Err(SquadError::InvalidConfig("shortlist_size must be positive".to_string()));
    }
    let mut table = [0; Position::COUNT];
    for (pos, &quota) in quotas {
        table[pos.index()] = quota;
    }
    let params = SearchParams {
        budget,
        quotas: table,
        max_per_group,
        beam_width,
        max_results,
        rotation: 0,
        locked: Vec::new(),
    };
    let strategy = ScoreEfficiencyShortlist::new(shortlist_size, shortlist_size, 0);
    Ok(SquadSearch::new(pool, strategy, params)?.run(&mut SearchBudget::unlimited()).squads)
}
