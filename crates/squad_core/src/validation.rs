//! Post-hoc constraint checks for squads and lineups.
//!
//! Unlike the search, which never builds an invalid squad, these functions take
//! arbitrary member lists (user squads, transfer targets, test fixtures) and
//! report every broken rule instead of stopping at the first.

use fxhash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::config::{FormationRules, OptimizerConfig};
use crate::models::{Candidate, CandidateId, Position};
use crate::search::beam::within_budget;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintViolation {
    #[error("expected {expected} members, found {actual}")]
    WrongSize { expected: usize, actual: usize },

    #[error("{position}: expected {expected}, found {actual}")]
    QuotaMismatch { position: Position, expected: usize, actual: usize },

    #[error("candidate {0} appears more than once")]
    DuplicateMember(CandidateId),

    #[error("total price {total:.2} exceeds budget {budget:.2}")]
    OverBudget { total: f64, budget: f64 },

    #[error("group {group} has {count} members (max {max})")]
    GroupCap { group: String, count: usize, max: usize },

    #[error("{position} count {actual} outside {min}..={max}")]
    LineupBound { position: Position, actual: usize, min: usize, max: usize },

    #[error("{position} must have exactly one starter, found {actual}")]
    SingleSlot { position: Position, actual: usize },

    #[error("{position} needs at least {min} starters, found {actual}")]
    ForwardMinimum { position: Position, actual: usize, min: usize },

    #[error("lineup member {0} is not in the squad")]
    NotInSquad(CandidateId),
}

fn duplicates(members: &[Candidate]) -> Vec<CandidateId> {
    let mut seen = FxHashSet::default();
    let mut dups = Vec::new();
    for c in members {
        if !seen.insert(c.id) && !dups.contains(&c.id) {
            dups.push(c.id);
        }
    }
    dups
}

fn position_counts(members: &[Candidate]) -> [usize; Position::COUNT] {
    let mut counts = [0; Position::COUNT];
    for c in members {
        counts[c.position.index()] += 1;
    }
    counts
}

/// Every squad rule `members` breaks under `config`. Empty means valid.
pub fn validate_squad(members: &[Candidate], config: &OptimizerConfig) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();

    let expected = config.squad_size();
    if members.len() != expected {
        violations.push(ConstraintViolation::WrongSize { expected, actual: members.len() });
    }

    let counts = position_counts(members);
    for pos in Position::ALL {
        let quota = config.quota(pos);
        if counts[pos.index()] != quota {
            violations.push(ConstraintViolation::QuotaMismatch {
                position: pos,
                expected: quota,
                actual: counts[pos.index()],
            });
        }
    }

    violations.extend(duplicates(members).into_iter().map(ConstraintViolation::DuplicateMember));

    let total: f64 = members.iter().map(|c| c.price).sum();
    if !within_budget(total, config.budget) {
        violations.push(ConstraintViolation::OverBudget { total, budget: config.budget });
    }

    let mut groups: FxHashMap<&str, usize> = FxHashMap::default();
    for group in members.iter().filter_map(|c| c.group.as_deref()) {
        *groups.entry(group).or_insert(0) += 1;
    }
    let mut over: Vec<(&str, usize)> =
        groups.into_iter().filter(|&(_, n)| n > config.max_per_group).collect();
    over.sort();
    violations.extend(over.into_iter().map(|(group, count)| ConstraintViolation::GroupCap {
        group: group.to_string(),
        count,
        max: config.max_per_group,
    }));

    violations
}

/// Every lineup rule broken by `lineup_members`, a subset of `squad_members`.
pub fn validate_lineup(
    lineup_members: &[Candidate],
    squad_members: &[Candidate],
    rules: &FormationRules,
) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();

    if lineup_members.len() != rules.lineup_size {
        violations.push(ConstraintViolation::WrongSize {
            expected: rules.lineup_size,
            actual: lineup_members.len(),
        });
    }

    violations
        .extend(duplicates(lineup_members).into_iter().map(ConstraintViolation::DuplicateMember));

    let squad_ids: FxHashSet<CandidateId> = squad_members.iter().map(|c| c.id).collect();
    for c in lineup_members {
        if !squad_ids.contains(&c.id) {
            violations.push(ConstraintViolation::NotInSquad(c.id));
        }
    }

    let counts = position_counts(lineup_members);
    for pos in Position::ALL {
        let actual = counts[pos.index()];
        if pos == rules.single_slot_position {
            if actual != 1 {
                violations.push(ConstraintViolation::SingleSlot { position: pos, actual });
            }
            continue;
        }
        if pos == rules.forward_min_position && actual < rules.forward_min_count {
            violations.push(ConstraintViolation::ForwardMinimum {
                position: pos,
                actual,
                min: rules.forward_min_count,
            });
            continue;
        }
        let bounds = rules.effective_bounds(pos);
        if !bounds.contains(actual) {
            violations.push(ConstraintViolation::LineupBound {
                position: pos,
                actual,
                min: bounds.min,
                max: bounds.max,
            });
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squad() -> Vec<Candidate> {
        let mut members = Vec::new();
        let mut id = 0;
        for (pos, n) in [(Position::GK, 2), (Position::DEF, 5), (Position::MID, 5), (Position::FWD, 3)] {
            for _ in 0..n {
                id += 1;
                let group = format!("T{}", id % 8);
                members.push(Candidate::new(id, id as f64, 6.0, pos).with_group(group));
            }
        }
        members
    }

    #[test]
    fn test_valid_squad_and_lineup() {
        let config = OptimizerConfig::default();
        let members = squad();
        assert!(validate_squad(&members, &config).is_empty());

        // 1 GK, 4 DEF, 4 MID, 2 FWD
        let lineup: Vec<Candidate> = members
            .iter()
            .filter(|c| matches!(c.id, 1 | 3..=6 | 8..=11 | 13 | 14))
            .cloned()
            .collect();
        assert!(validate_lineup(&lineup, &members, &config.formation).is_empty());
    }

    #[test]
    fn test_reports_every_squad_violation() {
        let mut config = OptimizerConfig::default();
        config.budget = 50.0;
        config.max_per_group = 1;
        let mut members = squad();
        members[14] = members[13].clone();

        let violations = validate_squad(&members, &config);
        assert!(violations.contains(&ConstraintViolation::DuplicateMember(14)));
        assert!(violations.iter().any(|v| matches!(v, ConstraintViolation::OverBudget { .. })));
        assert!(violations.iter().any(|v| matches!(v, ConstraintViolation::GroupCap { .. })));
        assert!(!violations.iter().any(|v| matches!(v, ConstraintViolation::QuotaMismatch { .. })));
    }

    #[test]
    fn test_budget_boundary_uses_tolerance() {
        let mut config = OptimizerConfig::default();
        config.budget = 90.0; // 15 * 6.0
        assert!(validate_squad(&squad(), &config).is_empty());
        config.budget = 89.99;
        assert_eq!(validate_squad(&squad(), &config).len(), 1);
    }

    #[test]
    fn test_lineup_violations() {
        let config = OptimizerConfig::default();
        let members = squad();
        // both keepers, no forwards, plus an outsider
        let mut lineup: Vec<Candidate> = members.iter().take(11).cloned().collect();
        lineup.push(Candidate::new(99, 1.0, 1.0, Position::MID));

        let violations = validate_lineup(&lineup, &members, &config.formation);
        assert!(violations.contains(&ConstraintViolation::WrongSize { expected: 11, actual: 12 }));
        assert!(violations.contains(&ConstraintViolation::NotInSquad(99)));
        assert!(violations
            .contains(&ConstraintViolation::SingleSlot { position: Position::GK, actual: 2 }));
        assert!(violations.contains(&ConstraintViolation::ForwardMinimum {
            position: Position::FWD,
            actual: 0,
            min: 1,
        }));
    }
}
