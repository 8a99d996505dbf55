//! Transfer planning for an existing squad: single swaps, and pairs of swaps
//! when `max_transfers` allows it.

use fxhash::FxHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::captain::score_with_captain;
use crate::config::OptimizerConfig;
use crate::error::{Result, SquadError};
use crate::lineup::best_lineup_from;
use crate::models::{Candidate, CandidateId, CandidatePool};
use crate::search::beam::within_budget;
use crate::validation::{validate_squad, ConstraintViolation};

/// Incoming targets per outgoing member tried when pairing two swaps.
const PAIR_TARGETS: usize = 5;

/// One swap inside a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub out_id: CandidateId,
    pub in_id: CandidateId,
    /// Price of the incoming candidate minus the outgoing one.
    pub price_delta: f64,
}

/// A transfer plan and what it does to the squad's captained score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSuggestion {
    /// Swaps in squad order.
    pub transfers: Vec<Transfer>,
    /// Summed over `transfers`; never above the bank.
    pub price_delta: f64,
    pub new_score: f64,
    /// Points charged for swaps beyond `free_transfers`.
    pub hit_cost: f64,
    /// New score minus current score minus `hit_cost`.
    pub gain: f64,
    pub captain_id: CandidateId,
    pub formation: String,
}

/// Captained lineup score of a member list, if it has a valid lineup.
fn evaluate(members: &[Candidate], config: &OptimizerConfig) -> Option<(f64, CandidateId, String)> {
    let (lineup, _) = best_lineup_from(members, &config.formation)?;
    let captain = score_with_captain(&lineup, &config.captain_eligible_positions)?;
    Some((captain.total_score, captain.captain_id, lineup.formation_code()))
}

/// Hit for a plan of `swaps` transfers.
pub fn hit_cost(swaps: usize, config: &OptimizerConfig) -> f64 {
    swaps.saturating_sub(config.free_transfers as usize) as f64 * config.transfer_hit_cost
}

fn group_cap_holds(members: &[Candidate], max_per_group: usize) -> bool {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    members.iter().filter_map(|c| c.group.as_deref()).all(|group| {
        let n = counts.entry(group).or_insert(0);
        *n += 1;
        *n <= max_per_group
    })
}

/// Best transfer plans for `squad_ids`, at most `limit`, best gain first.
///
/// `bank` is the unspent budget: the summed price delta of a plan may not
/// exceed it. The group cap is checked on the squad after every swap of the
/// plan. Locked members are never sold and excluded candidates are never
/// bought, though an excluded member may be sold.
pub fn suggest_transfers(
    pool: &CandidatePool,
    squad_ids: &[CandidateId],
    bank: f64,
    config: &OptimizerConfig,
    limit: usize,
) -> Result<Vec<TransferSuggestion>> {
    let members: Vec<Candidate> = squad_ids
        .iter()
        .map(|&id| pool.by_id(id).cloned().ok_or(SquadError::UnknownCandidate(id)))
        .collect::<Result<_>>()?;

    // total price is bounded by the bank here, not by `config.budget`
    let violations: Vec<String> = validate_squad(&members, config)
        .into_iter()
        .filter(|v| !matches!(v, ConstraintViolation::OverBudget { .. }))
        .map(|v| v.to_string())
        .collect();
    if !violations.is_empty() {
        return Err(SquadError::InvalidSquad(violations.join("; ")));
    }

    let (current_score, _, _) = evaluate(&members, config)
        .ok_or_else(|| SquadError::InvalidSquad("squad has no valid lineup".to_string()))?;

    // per squad slot: buyable pool indices of the same position, best first
    let targets: Vec<Vec<usize>> = members
        .iter()
        .map(|out| {
            if config.locked_ids.contains(&out.id) {
                return Vec::new();
            }
            pool.position_indices(out.position)
                .iter()
                .copied()
                .filter(|&idx| {
                    let id = pool.get(idx).id;
                    !squad_ids.contains(&id) && !config.excluded_ids.contains(&id)
                })
                .collect()
        })
        .collect();

    let mut plans: Vec<Vec<(usize, usize)>> = Vec::new();
    for (slot, slot_targets) in targets.iter().enumerate() {
        plans.extend(slot_targets.iter().map(|&idx| vec![(slot, idx)]));
    }
    if config.max_transfers >= 2 {
        for a in 0..members.len() {
            for b in a + 1..members.len() {
                for &in_a in targets[a].iter().take(PAIR_TARGETS) {
                    for &in_b in targets[b].iter().take(PAIR_TARGETS) {
                        if in_a != in_b {
                            plans.push(vec![(a, in_a), (b, in_b)]);
                        }
                    }
                }
            }
        }
    }
    debug!(
        squad = members.len(),
        plans = plans.len(),
        max_transfers = config.max_transfers,
        "evaluating transfers"
    );

    let mut suggestions: Vec<TransferSuggestion> = plans
        .par_iter()
        .filter_map(|plan| {
            let transfers: Vec<Transfer> = plan
                .iter()
                .map(|&(slot, idx)| Transfer {
                    out_id: members[slot].id,
                    in_id: pool.get(idx).id,
                    price_delta: pool.get(idx).price - members[slot].price,
                })
                .collect();
            let price_delta: f64 = transfers.iter().map(|t| t.price_delta).sum();
            if !within_budget(price_delta, bank) {
                return None;
            }

            let mut next = members.clone();
            for &(slot, idx) in plan {
                next[slot] = pool.get(idx).clone();
            }
            if !group_cap_holds(&next, config.max_per_group) {
                return None;
            }

            let (new_score, captain_id, formation) = evaluate(&next, config)?;
            let hit = hit_cost(transfers.len(), config);
            Some(TransferSuggestion {
                transfers,
                price_delta,
                new_score,
                hit_cost: hit,
                gain: new_score - current_score - hit,
                captain_id,
                formation,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| {
        b.gain
            .total_cmp(&a.gain)
            .then_with(|| a.price_delta.total_cmp(&b.price_delta))
            .then_with(|| a.transfers.len().cmp(&b.transfers.len()))
            .then_with(|| {
                let ids = |s: &TransferSuggestion| -> Vec<(CandidateId, CandidateId)> {
                    s.transfers.iter().map(|t| (t.out_id, t.in_id)).collect()
                };
                ids(a).cmp(&ids(b))
            })
    });
    suggestions.truncate(limit);
    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    /// Minimal format: squad 1 GK, 1 DEF, 1 FWD; lineup of 3 (GK + DEF + FWD).
    fn config() -> OptimizerConfig {
        let mut config: OptimizerConfig = OptimizerConfig::from_json(
            r#"{
                "quotas": {"GK": 1, "DEF": 1, "MID": 0, "FWD": 1},
                "lineup_size": 3,
                "lineup_bounds": {"GK": {"min": 1, "max": 1}, "DEF": {"min": 1, "max": 1},
                                  "MID": {"min": 0, "max": 0}, "FWD": {"min": 1, "max": 1}},
                "max_per_group": 1
            }"#,
        )
        .unwrap();
        config.budget = 20.0;
        config
    }

    fn pool() -> CandidatePool {
        CandidatePool::new(vec![
            Candidate::new(1, 3.0, 5.0, Position::GK).with_group("A"),
            Candidate::new(2, 4.0, 5.0, Position::DEF).with_group("B"),
            Candidate::new(3, 5.0, 6.0, Position::FWD).with_group("C"),
            // upgrades
            Candidate::new(4, 9.0, 7.0, Position::FWD).with_group("D"),
            Candidate::new(5, 20.0, 30.0, Position::FWD).with_group("E"),
            Candidate::new(6, 8.0, 5.0, Position::DEF).with_group("A"),
            Candidate::new(7, 6.0, 5.5, Position::DEF).with_group("F"),
        ])
        .unwrap()
    }

    fn pairs(suggestion: &TransferSuggestion) -> Vec<(CandidateId, CandidateId)> {
        suggestion.transfers.iter().map(|t| (t.out_id, t.in_id)).collect()
    }

    #[test]
    fn test_best_affordable_swap_first() {
        let config = config();
        let suggestions = suggest_transfers(&pool(), &[1, 2, 3], 1.0, &config, 10).unwrap();
        let swaps: Vec<_> = suggestions.iter().map(pairs).collect();
        // 5 is too expensive, 6 breaks group A
        assert_eq!(swaps, vec![vec![(3, 4)], vec![(2, 7)]]);

        // current: 3 + 4 + 5 + captain 5 = 17; with 4: 3 + 4 + 9 + 9 = 25
        assert!((suggestions[0].gain - 8.0).abs() < 1e-9);
        assert_eq!(suggestions[0].hit_cost, 0.0);
        assert_eq!(suggestions[0].captain_id, 4);
    }

    #[test]
    fn test_hit_cost_without_free_transfer() {
        let mut config = config();
        config.free_transfers = 0;
        let suggestions = suggest_transfers(&pool(), &[1, 2, 3], 1.0, &config, 1).unwrap();
        assert_eq!(suggestions.len(), 1);
        assert!((suggestions[0].gain - 4.0).abs() < 1e-9);
        assert_eq!(suggestions[0].hit_cost, 4.0);
    }

    #[test]
    fn test_hit_cost_counts_swaps_beyond_free() {
        let mut config = config();
        assert_eq!(hit_cost(1, &config), 0.0);
        assert_eq!(hit_cost(2, &config), 4.0);
        config.free_transfers = 0;
        assert_eq!(hit_cost(2, &config), 8.0);
        config.free_transfers = 2;
        assert_eq!(hit_cost(2, &config), 0.0);
    }

    #[test]
    fn test_two_transfer_plan() {
        let mut config = config();
        config.max_transfers = 2;
        config.free_transfers = 2;
        let suggestions = suggest_transfers(&pool(), &[1, 2, 3], 2.0, &config, 10).unwrap();

        // 3 -> 4 and 2 -> 7 together cost 1.5: 3 + 6 + 9 + 9 = 27, gain 10
        assert_eq!(pairs(&suggestions[0]), vec![(2, 7), (3, 4)]);
        assert!((suggestions[0].price_delta - 1.5).abs() < 1e-9);
        assert!((suggestions[0].gain - 10.0).abs() < 1e-9);
        assert_eq!(suggestions[0].hit_cost, 0.0);
        // 2 -> 6 clashes with member 1 in group A, alone or paired
        assert!(suggestions.iter().all(|s| s.transfers.iter().all(|t| t.in_id != 6)));
    }

    #[test]
    fn test_second_transfer_pays_hit() {
        let mut config = config();
        config.max_transfers = 2;
        let suggestions = suggest_transfers(&pool(), &[1, 2, 3], 2.0, &config, 10).unwrap();

        // one free transfer: the pair nets 10 - 4 = 6 and falls behind the single swap
        assert_eq!(pairs(&suggestions[0]), vec![(3, 4)]);
        let pair = suggestions.iter().find(|s| s.transfers.len() == 2).unwrap();
        assert!((pair.gain - 6.0).abs() < 1e-9);
        assert_eq!(pair.hit_cost, 4.0);
    }

    #[test]
    fn test_bank_applies_to_whole_plan() {
        let mut config = config();
        config.max_transfers = 2;
        config.free_transfers = 2;
        // each swap fits on its own, together they cost 1.5
        let suggestions = suggest_transfers(&pool(), &[1, 2, 3], 1.0, &config, 10).unwrap();
        assert!(suggestions.iter().all(|s| s.transfers.len() == 1));
    }

    #[test]
    fn test_excluded_never_bought_but_may_be_sold() {
        let mut config = config();
        config.excluded_ids = vec![3, 4];
        let suggestions = suggest_transfers(&pool(), &[1, 2, 3], 1.0, &config, 10).unwrap();
        let swaps: Vec<_> = suggestions.iter().map(pairs).collect();
        assert_eq!(swaps, vec![vec![(2, 7)]]);

        config.excluded_ids = vec![3];
        let suggestions = suggest_transfers(&pool(), &[1, 2, 3], 1.0, &config, 10).unwrap();
        assert_eq!(pairs(&suggestions[0]), vec![(3, 4)]);
    }

    #[test]
    fn test_locked_member_is_kept() {
        let mut config = config();
        config.locked_ids = vec![3];
        config.max_transfers = 2;
        let suggestions = suggest_transfers(&pool(), &[1, 2, 3], 2.0, &config, 10).unwrap();
        assert!(!suggestions.is_empty());
        assert!(suggestions.iter().all(|s| s.transfers.iter().all(|t| t.out_id != 3)));
    }

    #[test]
    fn test_errors() {
        let config = config();
        assert_eq!(
            suggest_transfers(&pool(), &[1, 2, 42], 1.0, &config, 10),
            Err(SquadError::UnknownCandidate(42))
        );
        assert!(matches!(
            suggest_transfers(&pool(), &[1, 2, 6], 1.0, &config, 10),
            Err(SquadError::InvalidSquad(_))
        ));
    }
}
