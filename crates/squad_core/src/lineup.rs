//! Lineup selection: best formation-valid subset of a squad.
//!
//! Exact. For a fixed count per position the best pick is the top-`count`
//! scorers of that position (scores are additive and otherwise unconstrained),
//! so enumerating every admissible count tuple and taking the maximum is
//! optimal. The single-slot position always takes its top scorer.

use crate::config::FormationRules;
use crate::models::{Candidate, Lineup, Position, Squad};

/// Squad members grouped by position, each group best score first
/// (input order on ties).
fn group_by_position(members: &[Candidate]) -> [Vec<&Candidate>; Position::COUNT] {
    let mut groups: [Vec<&Candidate>; Position::COUNT] = Default::default();
    for c in members {
        groups[c.position.index()].push(c);
    }
    for group in &mut groups {
        // stable: equal scores keep input order
        group.sort_by(|a, b| b.score.total_cmp(&a.score));
    }
    groups
}

/// Every admissible per-position count tuple for the given availability.
///
/// Tuples are produced in lexicographic order (GK, DEF, MID, FWD).
pub fn formation_shapes(
    available: &[usize; Position::COUNT],
    rules: &FormationRules,
) -> Vec<[usize; Position::COUNT]> {
    let mut shapes = Vec::new();
    if available[rules.single_slot_position.index()] == 0 {
        return shapes;
    }

    let mut counts = [0; Position::COUNT];
    fill_shapes(0, 0, available, rules, &mut counts, &mut shapes);
    shapes
}

fn fill_shapes(
    depth: usize,
    used: usize,
    available: &[usize; Position::COUNT],
    rules: &FormationRules,
    counts: &mut [usize; Position::COUNT],
    out: &mut Vec<[usize; Position::COUNT]>,
) {
    if depth == Position::COUNT {
        if used == rules.lineup_size {
            out.push(*counts);
        }
        return;
    }
    let pos = Position::ALL[depth];
    let bounds = rules.effective_bounds(pos);
    let upper = bounds.max.min(available[pos.index()]);
    for n in bounds.min..=upper {
        if used + n > rules.lineup_size {
            break;
        }
        counts[depth] = n;
        fill_shapes(depth + 1, used + n, available, rules, counts, out);
    }
    counts[depth] = 0;
}

/// Best lineup from an arbitrary member list.
///
/// `None` when the single-slot position is empty or no shape is admissible.
pub fn best_lineup_from(members: &[Candidate], rules: &FormationRules) -> Option<(Lineup, f64)> {
    let groups = group_by_position(members);
    let available = [groups[0].len(), groups[1].len(), groups[2].len(), groups[3].len()];

    // prefix sums: top-n score per position
    let prefix: Vec<Vec<f64>> = groups
        .iter()
        .map(|group| {
            let mut acc = Vec::with_capacity(group.len() + 1);
            acc.push(0.0);
            for c in group {
                acc.push(acc[acc.len() - 1] + c.score);
            }
            acc
        })
        .collect();

    let mut best: Option<([usize; Position::COUNT], f64)> = None;
    for shape in formation_shapes(&available, rules) {
        let score: f64 = (0..Position::COUNT).map(|i| prefix[i][shape[i]]).sum();
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((shape, score));
        }
    }

    let (shape, score) = best?;
    let picked: Vec<Candidate> = groups
        .iter()
        .zip(shape)
        .flat_map(|(group, n)| group.iter().take(n).map(|c| (*c).clone()))
        .collect();
    Some((Lineup::from_members(picked), score))
}

/// Best lineup of a squad.
pub fn best_lineup(squad: &Squad, rules: &FormationRules) -> Option<(Lineup, f64)> {
    best_lineup_from(squad.members(), rules)
}

/// Whether `lineup_members` form a valid lineup under `rules`
/// (size, single slot, bounds, forward minimum).
pub fn is_valid_lineup(lineup_members: &[Candidate], rules: &FormationRules) -> bool {
    if lineup_members.len() != rules.lineup_size {
        return false;
    }
    let mut counts = [0; Position::COUNT];
    for c in lineup_members {
        counts[c.position.index()] += 1;
    }
    Position::ALL.iter().all(|&pos| rules.effective_bounds(pos).contains(counts[pos.index()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CountBounds;
    use crate::search::Combinations;

    /// 15-man squad with hand-picked scores (2 GK / 5 DEF / 5 MID / 3 FWD).
    fn squad_members() -> Vec<Candidate> {
        let rows: [(u32, f64, Position); 15] = [
            (1, 5.1, Position::GK),
            (2, 0.2, Position::GK),
            (3, 6.0, Position::DEF),
            (4, 5.5, Position::DEF),
            (5, 4.2, Position::DEF),
            (6, 3.9, Position::DEF),
            (7, 1.0, Position::DEF),
            (8, 9.8, Position::MID),
            (9, 7.1, Position::MID),
            (10, 6.6, Position::MID),
            (11, 4.0, Position::MID),
            (12, 2.5, Position::MID),
            (13, 8.3, Position::FWD),
            (14, 4.1, Position::FWD),
            (15, 4.0, Position::FWD),
        ];
        rows.iter().map(|&(id, score, pos)| Candidate::new(id, score, 5.0, pos)).collect()
    }

    fn brute_force(members: &[Candidate], rules: &FormationRules) -> Option<f64> {
        let idx: Vec<usize> = (0..members.len()).collect();
        Combinations::new(&idx, rules.lineup_size)
            .map(|pick| pick.iter().map(|&i| members[i].clone()).collect::<Vec<_>>())
            .filter(|lineup| is_valid_lineup(lineup, rules))
            .map(|lineup| lineup.iter().map(|c| c.score).sum::<f64>())
            .max_by(|a, b| a.total_cmp(b))
    }

    #[test]
    fn test_matches_brute_force_on_reference_squad() {
        let members = squad_members();
        let rules = FormationRules::default();
        let (lineup, score) = best_lineup_from(&members, &rules).unwrap();
        let expected = brute_force(&members, &rules).unwrap();
        assert!((score - expected).abs() < 1e-9, "{score} vs {expected}");
        assert!(is_valid_lineup(lineup.members(), &rules));
        assert!((lineup.score() - score).abs() < 1e-9);
    }

    #[test]
    fn test_hand_computed_lineup() {
        let members = squad_members();
        let (lineup, score) = best_lineup_from(&members, &FormationRules::default()).unwrap();
        // GK 5.1; DEF 6.0+5.5+4.2; MID 9.8+7.1+6.6+4.0; FWD 8.3+4.1+4.0
        assert_eq!(lineup.formation_code(), "3-4-3");
        assert!((score - 64.7).abs() < 1e-9);
        assert!(lineup.contains(1) && !lineup.contains(2));
    }

    #[test]
    fn test_matches_brute_force_with_custom_bounds() {
        let members = squad_members();
        let mut rules = FormationRules::default();
        rules.lineup_bounds.insert(Position::MID, CountBounds::new(2, 5));
        rules.lineup_bounds.insert(Position::FWD, CountBounds::new(0, 1));
        let (lineup, score) = best_lineup_from(&members, &rules).unwrap();
        let expected = brute_force(&members, &rules).unwrap();
        assert!((score - expected).abs() < 1e-9);
        assert_eq!(lineup.shape().2, 1);
    }

    #[test]
    fn test_shapes_are_few_and_valid() {
        let rules = FormationRules::default();
        let shapes = formation_shapes(&[2, 5, 5, 3], &rules);
        // 3-5-2, 3-4-3, 4-5-1, 4-4-2, 4-3-3, 5-4-1, 5-3-2, 5-2-3
        assert_eq!(shapes.len(), 8);
        for shape in &shapes {
            assert_eq!(shape.iter().sum::<usize>(), 11);
            assert_eq!(shape[0], 1);
            assert!(shape[3] >= 1);
        }
    }

    #[test]
    fn test_no_single_slot_member_fails() {
        let members: Vec<Candidate> =
            squad_members().into_iter().filter(|c| c.position != Position::GK).collect();
        assert!(best_lineup_from(&members, &FormationRules::default()).is_none());
    }

    #[test]
    fn test_no_admissible_shape_fails() {
        // two defenders only: DEF min is 3
        let members: Vec<Candidate> = squad_members()
            .into_iter()
            .filter(|c| c.position != Position::DEF || c.id <= 4)
            .collect();
        assert!(best_lineup_from(&members, &FormationRules::default()).is_none());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let mut members = squad_members();
        for c in members.iter_mut().filter(|c| c.position == Position::GK) {
            c.score = 3.0;
        }
        let (lineup, _) = best_lineup_from(&members, &FormationRules::default()).unwrap();
        assert!(lineup.contains(1));
        assert!(!lineup.contains(2));
    }
}
