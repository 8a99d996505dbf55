//! Candidate pool: the immutable universe for one optimization run,
//! partitioned by position for fast access.

use fxhash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;

use super::candidate::{Candidate, CandidateId, Position};
use crate::error::{Result, SquadError};

#[derive(Debug, Clone)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
    /// Per position: pool indices sorted by score desc (input order on ties).
    by_position: [Vec<usize>; Position::COUNT],
    /// Interned group per candidate (dense index into `group_names`).
    group_of: Vec<Option<usize>>,
    group_names: Vec<String>,
    index_of: FxHashMap<CandidateId, usize>,
}

/// Score-descending comparator with a stable tie-break on pool index.
pub(crate) fn by_score_desc(pool: &[Candidate], a: usize, b: usize) -> Ordering {
    pool[b].score.total_cmp(&pool[a].score).then(a.cmp(&b))
}

impl CandidatePool {
    /// Build a pool, rejecting duplicate ids and non-finite or negative values.
    pub fn new(candidates: Vec<Candidate>) -> Result<Self> {
        Self::with_exclusions(candidates, &[])
    }

    /// Build a pool without the candidates listed in `excluded`.
    ///
    /// Unknown excluded ids are ignored (the candidate may simply not be listed).
    pub fn with_exclusions(candidates: Vec<Candidate>, excluded: &[CandidateId]) -> Result<Self> {
        let mut seen: FxHashSet<CandidateId> = FxHashSet::default();
        for c in &candidates {
            if !seen.insert(c.id) {
                return Err(SquadError::DuplicateCandidate(c.id));
            }
            if !c.score.is_finite() {
                return Err(SquadError::InvalidCandidate {
                    id: c.id,
                    reason: format!("score must be finite, got {}", c.score),
                });
            }
            if !c.price.is_finite() || c.price < 0.0 {
                return Err(SquadError::InvalidCandidate {
                    id: c.id,
                    reason: format!("price must be finite and non-negative, got {}", c.price),
                });
            }
        }

        let candidates: Vec<Candidate> =
            candidates.into_iter().filter(|c| !excluded.contains(&c.id)).collect();

        let mut group_names: Vec<String> = Vec::new();
        let mut group_lookup: FxHashMap<String, usize> = FxHashMap::default();
        let mut group_of = Vec::with_capacity(candidates.len());
        let mut index_of = FxHashMap::default();
        let mut by_position: [Vec<usize>; Position::COUNT] = Default::default();

        for (idx, c) in candidates.iter().enumerate() {
            index_of.insert(c.id, idx);
            by_position[c.position.index()].push(idx);
            let group = c.group.as_ref().map(|name| {
                *group_lookup.entry(name.clone()).or_insert_with(|| {
                    group_names.push(name.clone());
                    group_names.len() - 1
                })
            });
            group_of.push(group);
        }

        for list in &mut by_position {
            list.sort_by(|&a, &b| by_score_desc(&candidates, a, b));
        }

        Ok(Self { candidates, by_position, group_of, group_names, index_of })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> &Candidate {
        &self.candidates[idx]
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn index_of(&self, id: CandidateId) -> Option<usize> {
        self.index_of.get(&id).copied()
    }

    pub fn by_id(&self, id: CandidateId) -> Option<&Candidate> {
        self.index_of(id).map(|idx| &self.candidates[idx])
    }

    /// Pool indices of one position, best score first.
    pub fn position_indices(&self, position: Position) -> &[usize] {
        &self.by_position[position.index()]
    }

    pub fn position_len(&self, position: Position) -> usize {
        self.by_position[position.index()].len()
    }

    #[inline]
    pub fn group_index(&self, idx: usize) -> Option<usize> {
        self.group_of[idx]
    }

    pub fn group_count(&self) -> usize {
        self.group_names.len()
    }

    pub fn group_name(&self, group: usize) -> &str {
        &self.group_names[group]
    }

    /// Lower bound on the price of `count` members of `position` that must
    /// include the pool indices in `locked`.
    ///
    /// `None` when the position cannot supply `count` members.
    pub fn cheapest_cost(&self, position: Position, count: usize, locked: &[usize]) -> Option<f64> {
        if locked.len() > count {
            return None;
        }
        let mut free: Vec<f64> = self
            .position_indices(position)
            .iter()
            .filter(|idx| !locked.contains(idx))
            .map(|&idx| self.candidates[idx].price)
            .collect();
        let needed = count - locked.len();
        if free.len() < needed {
            return None;
        }
        free.sort_by(|a, b| a.total_cmp(b));
        let locked_cost: f64 = locked.iter().map(|&idx| self.candidates[idx].price).sum();
        Some(locked_cost + free[..needed].iter().sum::<f64>())
    }
}
