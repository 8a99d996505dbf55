use serde::{Deserialize, Serialize};

use super::candidate::{Candidate, CandidateId, Position};
use super::squad::{count_by_position, Squad};

/// Formation-valid scoring subset of a squad.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lineup {
    /// Members ordered by position (GK → FWD), then score desc.
    members: Vec<Candidate>,
    score: f64,
}

impl Lineup {
    pub(crate) fn from_members(members: Vec<Candidate>) -> Self {
        let score = members.iter().map(|c| c.score).sum();
        Self { members, score }
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

    /// Sum of member scores (captain not doubled).
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn member_ids(&self) -> Vec<CandidateId> {
        self.members.iter().map(|c| c.id).collect()
    }

    pub fn contains(&self, id: CandidateId) -> bool {
        self.members.iter().any(|c| c.id == id)
    }

    pub fn counts(&self) -> [usize; Position::COUNT] {
        count_by_position(&self.members)
    }

    /// Returns (defenders, midfielders, forwards).
    pub fn shape(&self) -> (usize, usize, usize) {
        let counts = self.counts();
        (
            counts[Position::DEF.index()],
            counts[Position::MID.index()],
            counts[Position::FWD.index()],
        )
    }

    /// Canonical formation code string (e.g., "3-4-3").
    pub fn formation_code(&self) -> String {
        let (d, m, f) = self.shape();
        format!("{}-{}-{}", d, m, f)
    }

    /// Squad members left out of the lineup, best score first.
    pub fn bench<'a>(&self, squad: &'a Squad) -> Vec<&'a Candidate> {
        let mut bench: Vec<&Candidate> =
            squad.members().iter().filter(|c| !self.contains(c.id)).collect();
        bench.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
        bench
    }
}
