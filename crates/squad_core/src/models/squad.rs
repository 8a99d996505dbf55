use serde::{Deserialize, Serialize};

use super::candidate::{Candidate, CandidateId, Position};
use crate::error::{Result, SquadError};

/// A complete roster. Immutable once finalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Squad {
    /// Members ordered by position (GK → FWD), then score desc.
    members: Vec<Candidate>,
    total_price: f64,
}

impl Squad {
    /// Finalize a squad, asserting per-position counts and uniqueness.
    ///
    /// A failure here means the generator produced a broken squad; the error
    /// is `InvalidState`, not a user-facing validation error.
    pub fn finalize(mut members: Vec<Candidate>, quotas: &[usize; Position::COUNT]) -> Result<Self> {
        let mut ids: Vec<CandidateId> = members.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(SquadError::InvalidState(format!("duplicate squad member {}", pair[0])));
        }

        let counts = count_by_position(&members);
        if &counts != quotas {
            return Err(SquadError::InvalidState(format!(
                "position counts {:?} do not match quotas {:?}",
                counts, quotas
            )));
        }

        members.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then(b.score.total_cmp(&a.score))
                .then(a.id.cmp(&b.id))
        });
        let total_price = members.iter().map(|c| c.price).sum();
        Ok(Self { members, total_price })
    }

    pub fn members(&self) -> &[Candidate] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    /// Member ids in ascending order (the deduplication key).
    pub fn member_ids(&self) -> Vec<CandidateId> {
        let mut ids: Vec<CandidateId> = self.members.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids
    }

    pub fn contains(&self, id: CandidateId) -> bool {
        self.members.iter().any(|c| c.id == id)
    }

    pub fn members_at(&self, position: Position) -> impl Iterator<Item = &Candidate> {
        self.members.iter().filter(move |c| c.position == position)
    }
}

pub(crate) fn count_by_position<'a>(
    members: impl IntoIterator<Item = &'a Candidate>,
) -> [usize; Position::COUNT] {
    let mut counts = [0; Position::COUNT];
    for c in members {
        counts[c.position.index()] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members() -> Vec<Candidate> {
        vec![
            Candidate::new(3, 5.0, 5.5, Position::FWD),
            Candidate::new(1, 4.0, 4.0, Position::GK),
            Candidate::new(2, 6.0, 4.5, Position::DEF),
            Candidate::new(4, 7.0, 5.0, Position::DEF),
        ]
    }

    #[test]
    fn test_finalize_orders_and_prices() {
        let squad = Squad::finalize(members(), &[1, 2, 0, 1]).unwrap();
        let ids: Vec<_> = squad.members().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 4, 2, 3]);
        assert!((squad.total_price() - 19.0).abs() < 1e-9);
        assert_eq!(squad.member_ids(), vec![1, 2, 3, 4]);
        assert_eq!(squad.members_at(Position::DEF).count(), 2);
    }

    #[test]
    fn test_finalize_rejects_quota_mismatch() {
        let err = Squad::finalize(members(), &[1, 1, 0, 2]).unwrap_err();
        assert!(matches!(err, SquadError::InvalidState(_)));
    }

    #[test]
    fn test_finalize_rejects_duplicates() {
        let mut m = members();
        m[3] = Candidate::new(2, 6.0, 4.5, Position::DEF);
        let err = Squad::finalize(m, &[1, 2, 0, 1]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
