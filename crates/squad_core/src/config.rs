//! Optimizer configuration
//!
//! Defaults describe the reference fantasy-football domain:
//! 15-man squad (2 GK / 5 DEF / 5 MID / 3 FWD), 100.0 budget, max 3 per club,
//! 11-man lineup with exactly one GK, 3-5 DEF and at least one FWD.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::{env, fs};

use crate::error::{Result, SquadError};
use crate::models::{CandidateId, Position};

pub const CONFIG_PATH_ENV: &str = "SQUAD_CONFIG_PATH";

/// Inclusive `[min, max]` count bound for one position in a lineup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountBounds {
    pub min: usize,
    pub max: usize,
}

impl CountBounds {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, count: usize) -> bool {
        count >= self.min && count <= self.max
    }
}

/// Lineup (formation) rules applied when extracting the scoring subset of a squad.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FormationRules {
    pub lineup_size: usize,
    pub lineup_bounds: BTreeMap<Position, CountBounds>,
    /// Position with exactly one lineup slot (GK).
    pub single_slot_position: Position,
    /// Position that must appear at least `forward_min_count` times.
    pub forward_min_position: Position,
    pub forward_min_count: usize,
}

impl Default for FormationRules {
    fn default() -> Self {
        let lineup_bounds = BTreeMap::from([
            (Position::GK, CountBounds::new(1, 1)),
            (Position::DEF, CountBounds::new(3, 5)),
            (Position::MID, CountBounds::new(0, 5)),
            (Position::FWD, CountBounds::new(1, 3)),
        ]);
        Self {
            lineup_size: 11,
            lineup_bounds,
            single_slot_position: Position::GK,
            forward_min_position: Position::FWD,
            forward_min_count: 1,
        }
    }
}

impl FormationRules {
    /// Bounds after folding in the single-slot and forward-minimum rules.
    ///
    /// A position without explicit bounds may take `0..=lineup_size`.
    pub fn effective_bounds(&self, position: Position) -> CountBounds {
        if position == self.single_slot_position {
            return CountBounds::new(1, 1);
        }
        let mut bounds = self
            .lineup_bounds
            .get(&position)
            .copied()
            .unwrap_or(CountBounds::new(0, self.lineup_size));
        if position == self.forward_min_position {
            bounds.min = bounds.min.max(self.forward_min_count);
        }
        bounds
    }
}

/// Full optimizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    pub budget: f64,
    pub quotas: BTreeMap<Position, usize>,
    pub max_per_group: usize,

    #[serde(flatten)]
    pub formation: FormationRules,

    /// Frontier states kept after each position stage.
    pub beam_width: usize,
    /// Top-by-score candidates per position fed to combination generation.
    pub shortlist_size: usize,
    /// Top-by-efficiency candidates added to the shortlist (0 disables).
    pub efficiency_shortlist_size: usize,
    /// Complete squads returned by one search pass.
    pub max_results: usize,
    pub top_k: usize,
    pub captain_eligible_positions: BTreeSet<Position>,

    /// Number of search passes; pass `r` skips `r * diversity_stride` of the
    /// by-score shortlist ranking.
    pub diversity_runs: usize,
    pub diversity_stride: usize,

    /// Wall-clock limit per search pass (checked between position stages).
    pub time_limit_ms: Option<u64>,

    pub excluded_ids: Vec<CandidateId>,
    pub locked_ids: Vec<CandidateId>,

    /// Points deducted for a transfer beyond the free allowance.
    pub transfer_hit_cost: f64,
    pub free_transfers: u32,
    /// Largest transfer plan suggested (1 or 2 swaps).
    pub max_transfers: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        let quotas = BTreeMap::from([
            (Position::GK, 2),
            (Position::DEF, 5),
            (Position::MID, 5),
            (Position::FWD, 3),
        ]);
        Self {
            budget: 100.0,
            quotas,
            max_per_group: 3,
            formation: FormationRules::default(),
            beam_width: 1000,
            shortlist_size: 15,
            efficiency_shortlist_size: 10,
            max_results: 5000,
            top_k: 50,
            captain_eligible_positions: BTreeSet::from([Position::DEF, Position::MID, Position::FWD]),
            diversity_runs: 1,
            diversity_stride: 2,
            time_limit_ms: None,
            excluded_ids: Vec::new(),
            locked_ids: Vec::new(),
            transfer_hit_cost: 4.0,
            free_transfers: 1,
            max_transfers: 1,
        }
    }
}

impl OptimizerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SquadError::InvalidConfig(e.to_string()))
    }

    /// Load a config from the file named by `SQUAD_CONFIG_PATH`.
    ///
    /// Returns `Ok(None)` when the variable is unset or blank.
    pub fn from_env() -> Result<Option<Self>> {
        let Ok(path) = env::var(CONFIG_PATH_ENV) else {
            return Ok(None);
        };

        let path = path.trim();
        if path.is_empty() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|e| {
            SquadError::InvalidConfig(format!(
                "Failed to read config file from {CONFIG_PATH_ENV}='{path}': {e}"
            ))
        })?;

        let config = Self::from_json(&content).map_err(|e| {
            SquadError::InvalidConfig(format!(
                "Failed to parse config JSON from {CONFIG_PATH_ENV}='{path}': {e}"
            ))
        })?;

        config.validate()?;
        Ok(Some(config))
    }

    #[inline]
    pub fn quota(&self, position: Position) -> usize {
        self.quotas.get(&position).copied().unwrap_or(0)
    }

    /// Total squad size (sum of quotas).
    pub fn squad_size(&self) -> usize {
        self.quotas.values().sum()
    }

    /// Quotas as a dense per-position array.
    pub fn quota_table(&self) -> [usize; Position::COUNT] {
        let mut table = [0; Position::COUNT];
        for pos in Position::ALL {
            table[pos.index()] = self.quota(pos);
        }
        table
    }

    /// Fail-fast consistency check, run before any search starts.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SquadError::InvalidConfig(msg));

        if !self.budget.is_finite() || self.budget < 0.0 {
            return invalid(format!("budget must be a finite non-negative number, got {}", self.budget));
        }
        for (name, value) in [
            ("beam_width", self.beam_width),
            ("shortlist_size", self.shortlist_size),
            ("max_results", self.max_results),
            ("top_k", self.top_k),
            ("diversity_runs", self.diversity_runs),
            ("max_per_group", self.max_per_group),
        ] {
            if value == 0 {
                return invalid(format!("{name} must be positive"));
            }
        }
        if self.time_limit_ms == Some(0) {
            return invalid("time_limit_ms must be positive when set".to_string());
        }
        if !self.transfer_hit_cost.is_finite() || self.transfer_hit_cost < 0.0 {
            return invalid(format!("transfer_hit_cost must be non-negative, got {}", self.transfer_hit_cost));
        }
        if !(1..=2).contains(&self.max_transfers) {
            return invalid(format!("max_transfers must be 1 or 2, got {}", self.max_transfers));
        }

        let squad_size = self.squad_size();
        if squad_size == 0 {
            return invalid("quotas must request at least one squad member".to_string());
        }

        let rules = &self.formation;
        if rules.lineup_size == 0 || rules.lineup_size > squad_size {
            return invalid(format!(
                "lineup_size must be in 1..={squad_size}, got {}",
                rules.lineup_size
            ));
        }
        if let Some(bounds) = rules.lineup_bounds.get(&rules.single_slot_position) {
            if !bounds.contains(1) {
                return invalid(format!(
                    "single slot position {} must allow exactly one lineup member, bounds are {}..={}",
                    rules.single_slot_position, bounds.min, bounds.max
                ));
            }
        }
        if rules.forward_min_count > self.quota(rules.forward_min_position) {
            return invalid(format!(
                "forward_min_count {} exceeds quota {} for {}",
                rules.forward_min_count,
                self.quota(rules.forward_min_position),
                rules.forward_min_position
            ));
        }

        let mut min_total = 0;
        let mut max_total = 0;
        for pos in Position::ALL {
            let bounds = rules.effective_bounds(pos);
            let quota = self.quota(pos);
            if bounds.min > bounds.max {
                return invalid(format!("lineup bounds for {pos} are empty: {}..={}", bounds.min, bounds.max));
            }
            if bounds.min > quota {
                return invalid(format!(
                    "lineup needs at least {} {pos} but quota is {quota}",
                    bounds.min
                ));
            }
            min_total += bounds.min;
            max_total += bounds.max.min(quota);
        }
        if min_total > rules.lineup_size || max_total < rules.lineup_size {
            return invalid(format!(
                "lineup_size {} unreachable: bounds allow {min_total}..={max_total}",
                rules.lineup_size
            ));
        }

        if self.captain_eligible_positions.is_empty() {
            return invalid("captain_eligible_positions must not be empty".to_string());
        }
        if let Some(id) = self.locked_ids.iter().find(|id| self.excluded_ids.contains(id)) {
            return invalid(format!("candidate {id} is both locked and excluded"));
        }

        Ok(())
    }
}
