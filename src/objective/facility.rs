//! Facility location objective (`summaxacross`).
//!
//! Rewards coverage: every sequence in the database contributes its best
//! similarity to any selected representative.
//!
//! ```text
//! f(S) = sum_q max_{r in S} sim(q, r)
//! ```
//!
//! A selected sequence covers itself with score 1.0. Sequences with no edge
//! to any representative contribute 0. The function is monotone submodular.

use std::collections::{BTreeMap, HashSet};

use crate::identity::{Database, SequenceId, SimilarityFunction};

use super::Objective;

/// Score assigned to a sequence that covers itself.
const SELF_SIMILARITY: f64 = 1.0;

/// Best similarity of a sequence before anything covers it.
const UNCOVERED: f64 = f64::NEG_INFINITY;

/// Facility location objective.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacilityLocation;

/// Best similarity to the selected set, per sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageState {
    best: BTreeMap<SequenceId, f64>,
}

impl CoverageState {
    /// Best similarity so far for `id`, or `None` if nothing covers it yet.
    pub fn best(&self, id: &str) -> Option<f64> {
        self.best
            .get(id)
            .copied()
            .filter(|score| *score > UNCOVERED)
    }

    /// Current objective value of the set this state summarizes.
    pub fn value(&self) -> f64 {
        self.best.values().map(|score| score.max(0.0)).sum()
    }

    fn current(&self, id: &str) -> f64 {
        self.best.get(id).copied().unwrap_or(UNCOVERED)
    }

    fn raise(&mut self, id: &str, score: f64) {
        match self.best.get_mut(id) {
            Some(best) if score > *best => *best = score,
            Some(_) => {}
            None => {
                self.best.insert(id.to_string(), score);
            }
        }
    }
}

impl FacilityLocation {
    pub fn new() -> Self {
        Self
    }

    /// Gain in `q`'s coverage if it were covered with `score`.
    fn improvement(score: f64, best: f64) -> f64 {
        if score > best {
            (score - best.max(0.0)).max(0.0)
        } else {
            0.0
        }
    }

    /// Candidate's similarity to every sequence it would cover, itself included.
    fn covered_by<'a>(
        db: &'a Database,
        candidate: &'a str,
        sim: &'a dyn SimilarityFunction,
    ) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        std::iter::once((candidate, SELF_SIMILARITY)).chain(
            db.in_neighbors_of(candidate)
                .filter(move |(query, _)| query.as_str() != candidate)
                .map(move |(query, record)| (query.as_str(), sim.score_record(record))),
        )
    }

    fn coverage_of(
        db: &Database,
        query: &str,
        selected: &HashSet<&str>,
        sim: &dyn SimilarityFunction,
    ) -> f64 {
        let own = if selected.contains(query) {
            SELF_SIMILARITY
        } else {
            UNCOVERED
        };

        db.neighbors_of(query)
            .filter(|(target, _)| target.as_str() != query && selected.contains(target.as_str()))
            .map(|(_, record)| sim.score_record(record))
            .fold(own, f64::max)
            .max(0.0)
    }
}

impl Objective for FacilityLocation {
    type State = CoverageState;

    fn name(&self) -> &str {
        "summaxacross"
    }

    fn evaluate(&self, db: &Database, ids: &[SequenceId], sim: &dyn SimilarityFunction) -> f64 {
        let selected: HashSet<&str> = ids.iter().map(String::as_str).collect();
        if selected.is_empty() {
            return 0.0;
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            let queries: Vec<&SequenceId> = db.ids().collect();
            queries
                .par_iter()
                .map(|query| Self::coverage_of(db, query, &selected, sim))
                .sum()
        }

        #[cfg(not(feature = "parallel"))]
        {
            db.ids()
                .map(|query| Self::coverage_of(db, query, &selected, sim))
                .sum()
        }
    }

    fn marginal_gain(
        &self,
        db: &Database,
        candidate: &str,
        sim: &dyn SimilarityFunction,
        state: &CoverageState,
    ) -> f64 {
        Self::covered_by(db, candidate, sim)
            .map(|(query, score)| Self::improvement(score, state.current(query)))
            .sum()
    }

    fn initial_state(&self, db: &Database, _sim: &dyn SimilarityFunction) -> CoverageState {
        #[cfg(feature = "parallel")]
        let best = {
            use rayon::prelude::*;
            let ids: Vec<&SequenceId> = db.ids().collect();
            ids.into_par_iter()
                .map(|id| (id.clone(), UNCOVERED))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let best = db.ids().map(|id| (id.clone(), UNCOVERED)).collect();

        CoverageState { best }
    }

    fn advance_state(
        &self,
        db: &Database,
        candidate: &str,
        sim: &dyn SimilarityFunction,
        state: &CoverageState,
    ) -> CoverageState {
        let mut next = state.clone();
        for (query, score) in Self::covered_by(db, candidate, sim) {
            next.raise(query, score);
        }
        next
    }
}
