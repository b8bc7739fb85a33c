//! Redundancy objective (`sumsumwithin`).
//!
//! Penalizes picking near-duplicates by summing the similarity of every
//! ordered pair of distinct selected sequences:
//!
//! ```text
//! f(S) = - sum_{a in S} sum_{b in S, b != a} sim(a, b)
//! ```
//!
//! The value is never positive. Adding `c` to `S` costs the similarity of
//! every recorded edge between `c` and a selected sequence, in either
//! direction, which is exactly `f(S + c) - f(S)`.

use std::collections::{BTreeSet, HashSet};

use crate::identity::{Database, SequenceId, SimilarityFunction};

use super::Objective;

/// Redundancy objective.
#[derive(Debug, Clone, Copy, Default)]
pub struct Redundancy;

/// Running pairwise penalty among the selected sequences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedundancyState {
    total: f64,
    selected: BTreeSet<SequenceId>,
}

impl RedundancyState {
    /// Accumulated similarity among selected sequences. Never negative.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Sequences added so far.
    pub fn selected(&self) -> &BTreeSet<SequenceId> {
        &self.selected
    }

    /// Current objective value of the set this state summarizes.
    pub fn value(&self) -> f64 {
        -self.total
    }
}

impl Redundancy {
    pub fn new() -> Self {
        Self
    }

    /// Similarity of `candidate` to every member of `selected`, over both edge directions.
    fn penalty<F>(db: &Database, candidate: &str, sim: &dyn SimilarityFunction, is_selected: F) -> f64
    where
        F: Fn(&str) -> bool,
    {
        db.neighbors_of(candidate)
            .chain(db.in_neighbors_of(candidate))
            .filter(|(other, _)| other.as_str() != candidate && is_selected(other.as_str()))
            .map(|(_, record)| sim.score_record(record))
            .sum()
    }
}

impl Objective for Redundancy {
    type State = RedundancyState;

    fn name(&self) -> &str {
        "sumsumwithin"
    }

    fn evaluate(&self, db: &Database, ids: &[SequenceId], sim: &dyn SimilarityFunction) -> f64 {
        let selected: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let mut total = 0.0;
        for a in &selected {
            for (b, record) in db.neighbors_of(a) {
                if b.as_str() != *a && selected.contains(b.as_str()) {
                    total += sim.score_record(record);
                }
            }
        }

        -total
    }

    fn marginal_gain(
        &self,
        db: &Database,
        candidate: &str,
        sim: &dyn SimilarityFunction,
        state: &RedundancyState,
    ) -> f64 {
        if state.selected.is_empty() {
            return 0.0;
        }
        -Self::penalty(db, candidate, sim, |id| state.selected.contains(id))
    }

    fn initial_state(&self, _db: &Database, _sim: &dyn SimilarityFunction) -> RedundancyState {
        RedundancyState::default()
    }

    fn advance_state(
        &self,
        db: &Database,
        candidate: &str,
        sim: &dyn SimilarityFunction,
        state: &RedundancyState,
    ) -> RedundancyState {
        let mut next = state.clone();
        if next.selected.contains(candidate) {
            return next;
        }
        next.total += Self::penalty(db, candidate, sim, |id| state.selected.contains(id));
        next.selected.insert(candidate.to_string());
        next
    }
}
