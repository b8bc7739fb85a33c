//! Accelerated (lazy) greedy maximization of a mixture objective.
//!
//! Algorithm:
//! 1. Queue every sequence with an infinite upper bound.
//! 2. Pop the best-bounded candidate and compute its exact marginal gain `g`.
//! 3. Peek the best remaining bound `u` and compute
//!    `relative = (g - u) / (|g| + offset)`.
//! 4. If `relative >= min_relative_gain`, accept the candidate and advance
//!    every objective state. Otherwise requeue it keyed by `g`. When
//!    `relative` sits exactly on the threshold, the candidate is accepted only
//!    if its ID sorts before the next queued ID.
//! 5. When a single candidate remains it is accepted unconditionally.
//!
//! A candidate whose bound was already computed in the current round is the
//! true best remaining candidate when popped and is accepted without another
//! evaluation. This keeps runs with `approx_ratio > 1` from cycling.
//!
//! With `approx_ratio = 1.0` the result equals naive greedy selection with
//! ties broken by lexicographic ID order.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::error::SelectionError;
use crate::identity::{Database, SequenceId, SimilarityFunction};
use crate::objective::MixtureObjective;

use super::cancel::CancellationFlag;
use super::queue::LazyQueue;

/// Default approximation ratio (exact greedy).
pub const DEFAULT_APPROX_RATIO: f64 = 1.0;

/// Default offset added to `|g|` when computing relative gains.
pub const DEFAULT_GAIN_DENOMINATOR_OFFSET: f64 = 0.01;

/// Options controlling a selection run.
#[derive(Debug, Clone)]
pub struct SelectionOptions {
    /// Maximum number of representatives. `None` selects until exhausted.
    pub max_size: Option<usize>,

    /// Approximation ratio, at least 1.0. 1.0 is exact greedy.
    pub approx_ratio: f64,

    /// Minimum relative gain to accept a candidate.
    /// Defaults to `approx_ratio - 1.0` when unset.
    pub min_relative_gain: Option<f64>,

    /// Offset keeping the relative gain denominator away from zero.
    pub gain_denominator_offset: f64,

    /// Stop once this instant has passed.
    pub deadline: Option<Instant>,

    /// Stop once this flag is raised.
    pub cancellation: Option<CancellationFlag>,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            max_size: None,
            approx_ratio: DEFAULT_APPROX_RATIO,
            min_relative_gain: None,
            gain_denominator_offset: DEFAULT_GAIN_DENOMINATOR_OFFSET,
            deadline: None,
            cancellation: None,
        }
    }
}

impl SelectionOptions {
    /// Creates options for an exact, unbounded run.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn with_approx_ratio(mut self, ratio: f64) -> Self {
        self.approx_ratio = ratio;
        self
    }

    pub fn with_min_relative_gain(mut self, gain: f64) -> Self {
        self.min_relative_gain = Some(gain);
        self
    }

    pub fn with_gain_denominator_offset(mut self, offset: f64) -> Self {
        self.gain_denominator_offset = offset;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the deadline to `timeout` from now. A timeout past the clock's
    /// range leaves the run without a deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Threshold actually applied to relative gains.
    pub fn effective_min_relative_gain(&self) -> f64 {
        self.min_relative_gain
            .unwrap_or(self.approx_ratio - 1.0)
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::InvalidConfiguration` for a zero target size,
    /// an approximation ratio below 1.0, a non-positive offset or a
    /// non-finite threshold.
    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.max_size == Some(0) {
            return Err(SelectionError::InvalidConfiguration(
                "max_size must be greater than 0".to_string(),
            ));
        }

        if !self.approx_ratio.is_finite() || self.approx_ratio < 1.0 {
            return Err(SelectionError::InvalidConfiguration(format!(
                "approx_ratio must be at least 1.0, got {}",
                self.approx_ratio
            )));
        }

        if !self.gain_denominator_offset.is_finite() || self.gain_denominator_offset <= 0.0 {
            return Err(SelectionError::InvalidConfiguration(format!(
                "gain_denominator_offset must be positive, got {}",
                self.gain_denominator_offset
            )));
        }

        if let Some(gain) = self.min_relative_gain {
            if !gain.is_finite() {
                return Err(SelectionError::InvalidConfiguration(format!(
                    "min_relative_gain must be finite, got {}",
                    gain
                )));
            }
        }

        Ok(())
    }
}

/// Why a selection run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `max_size` representatives were selected.
    TargetReached,
    /// Every candidate was selected.
    Exhausted,
    /// The cancellation flag was raised.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

/// Outcome of a selection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionReport {
    /// Selected IDs in acceptance order.
    pub selected: Vec<SequenceId>,
    /// Name of the mixture objective.
    pub objective: String,
    /// Mixture value of the selection.
    pub objective_value: f64,
    /// Number of sequences in the database.
    pub database_size: usize,
    /// Exact marginal-gain evaluations performed.
    pub evaluations: usize,
    /// Candidates put back with a tightened bound.
    pub requeues: usize,
    pub stop_reason: StopReason,
    pub elapsed_ms: u64,
    pub generated_at: DateTime<Utc>,
}

/// Lazy greedy selector over a borrowed database and mixture.
///
/// Inputs are validated by [`GreedySelector::new`] before any selection work.
pub struct GreedySelector<'a> {
    db: &'a Database,
    objective: &'a MixtureObjective,
    sims: &'a [&'a dyn SimilarityFunction],
    options: SelectionOptions,
}

impl<'a> GreedySelector<'a> {
    /// Creates a selector after validating every input.
    ///
    /// # Errors
    ///
    /// - `SelectionError::InvalidState` if the database is empty
    /// - `SelectionError::InvalidConfiguration` if the similarity count does
    ///   not match the objective count or the options are invalid
    pub fn new(
        db: &'a Database,
        objective: &'a MixtureObjective,
        sims: &'a [&'a dyn SimilarityFunction],
        options: SelectionOptions,
    ) -> Result<Self, SelectionError> {
        if db.is_empty() {
            return Err(SelectionError::InvalidState(
                "empty sequence database".to_string(),
            ));
        }
        objective.check_similarities(sims)?;
        options.validate()?;

        Ok(Self {
            db,
            objective,
            sims,
            options,
        })
    }

    pub fn options(&self) -> &SelectionOptions {
        &self.options
    }

    /// Runs the selection.
    pub fn run(&self) -> Result<SelectionReport, SelectionError> {
        let started = Instant::now();
        let target = self.options.max_size.unwrap_or(usize::MAX);
        let min_relative_gain = self.options.effective_min_relative_gain();
        let offset = self.options.gain_denominator_offset;

        info!(
            objective = %self.objective.name(),
            sequences = self.db.len(),
            max_size = ?self.options.max_size,
            min_relative_gain,
            "Selecting representatives"
        );

        let mut queue = LazyQueue::seeded(self.db.ids().cloned());
        let mut state = self.objective.initial_state(self.db, self.sims)?;
        let mut selected: Vec<SequenceId> = Vec::new();
        let mut evaluations = 0usize;
        let mut requeues = 0usize;
        let mut interrupted = None;

        while selected.len() < target && queue.len() > 1 {
            if let Some(reason) = self.interruption() {
                interrupted = Some(reason);
                break;
            }

            let Some(candidate) = queue.pop() else {
                break;
            };
            let round = selected.len();

            let accept = if candidate.is_exact_for(round) {
                true
            } else {
                let gain = self
                    .objective
                    .marginal_gain(self.db, &candidate.id, self.sims, &state)?;
                evaluations += 1;

                let next = queue.peek();
                let next_bound = next.map_or(f64::NEG_INFINITY, |(bound, _)| bound);
                let relative = (gain - next_bound) / (gain.abs() + offset);

                // On an exact tie the smaller ID keeps priority.
                let wins_tie = next.map_or(true, |(_, id)| candidate.id.as_str() < id);
                if relative > min_relative_gain || (relative == min_relative_gain && wins_tie) {
                    true
                } else {
                    trace!(id = %candidate.id, gain, next_bound, "Tightened bound");
                    queue.requeue(candidate.id.clone(), gain, round);
                    requeues += 1;
                    false
                }
            };

            if accept {
                state = self
                    .objective
                    .advance_state(self.db, &candidate.id, self.sims, &state)?;
                debug!(
                    id = %candidate.id,
                    position = round + 1,
                    remaining = queue.len(),
                    "Accepted representative"
                );
                selected.push(candidate.id);
            }
        }

        if interrupted.is_none() && queue.len() == 1 && selected.len() < target {
            if let Some(last) = queue.pop() {
                debug!(id = %last.id, "Accepted last remaining candidate");
                selected.push(last.id);
            }
        }

        let stop_reason = match interrupted {
            Some(reason) => reason,
            None if queue.is_empty() => StopReason::Exhausted,
            None => StopReason::TargetReached,
        };

        let objective_value = self.objective.evaluate(self.db, &selected, self.sims)?;
        let elapsed = started.elapsed();

        info!(
            selected = selected.len(),
            evaluations,
            requeues,
            objective_value,
            stop_reason = ?stop_reason,
            elapsed_ms = elapsed.as_millis() as u64,
            "Selection finished"
        );

        Ok(SelectionReport {
            selected,
            objective: self.objective.name().to_string(),
            objective_value,
            database_size: self.db.len(),
            evaluations,
            requeues,
            stop_reason,
            elapsed_ms: elapsed.as_millis() as u64,
            generated_at: Utc::now(),
        })
    }

    fn interruption(&self) -> Option<StopReason> {
        if self
            .options
            .cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
        {
            return Some(StopReason::Cancelled);
        }
        if self
            .options
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
        {
            return Some(StopReason::DeadlineExceeded);
        }
        None
    }
}

/// Selects representatives and returns them in acceptance order.
///
/// A candidate whose relative gain equals the acceptance threshold exactly is
/// accepted only if its ID sorts before the next queued ID; otherwise it is
/// requeued. This keeps exact mode identical to naive greedy with a
/// smallest-ID tie-break.
///
/// # Errors
///
/// See [`GreedySelector::new`].
pub fn select(
    db: &Database,
    objective: &MixtureObjective,
    sims: &[&dyn SimilarityFunction],
    options: SelectionOptions,
) -> Result<Vec<SequenceId>, SelectionError> {
    Ok(GreedySelector::new(db, objective, sims, options)?
        .run()?
        .selected)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::identity::{IdentityRow, IdentityTableParser};
    use crate::objective::test_support::{identity_sims, sample_database};
    use crate::objective::{BuiltinObjective, FacilityLocation};

    fn mixture(weight: f64) -> MixtureObjective {
        BuiltinObjective::default_mixture(weight).expect("valid mixture")
    }

    fn three_sequence_database() -> Database {
        IdentityTableParser::new().build(vec![
            IdentityRow::new("seq1", "seq2", 100.0),
            IdentityRow::new("seq1", "seq3", 98.4),
            IdentityRow::new("seq2", "seq3", 98.4),
        ])
    }

    /// Plain greedy: evaluate every remaining candidate each round.
    fn naive_greedy(
        db: &Database,
        objective: &MixtureObjective,
        sims: &[&dyn SimilarityFunction],
        k: usize,
    ) -> Vec<SequenceId> {
        let mut state = objective.initial_state(db, sims).expect("state");
        let mut selected: Vec<SequenceId> = Vec::new();
        while selected.len() < k && selected.len() < db.len() {
            let mut best: Option<(f64, &SequenceId)> = None;
            for id in db.ids().filter(|id| !selected.contains(*id)) {
                let gain = objective
                    .marginal_gain(db, id, sims, &state)
                    .expect("gain");
                if best.map_or(true, |(g, _)| gain > g) {
                    best = Some((gain, id));
                }
            }
            let Some((_, id)) = best else { break };
            state = objective
                .advance_state(db, id, sims, &state)
                .expect("advance");
            selected.push(id.clone());
        }
        selected
    }

    #[test]
    fn test_three_sequence_scenario() {
        let db = three_sequence_database();
        let objective = mixture(0.5);
        let sims = identity_sims(2);

        let selected = select(&db, &objective, &sims, SelectionOptions::new().with_max_size(2))
            .expect("selection succeeds");

        assert_eq!(selected.len(), 2);
        let unique: HashSet<_> = selected.iter().collect();
        assert_eq!(unique.len(), 2);
        for id in &selected {
            assert!(["seq1", "seq2", "seq3"].contains(&id.as_str()));
        }
    }

    #[test]
    fn test_size_bounds_and_membership() {
        let db = sample_database();
        let sims = identity_sims(2);

        for weight in [0.0, 0.5, 1.0] {
            let objective = mixture(weight);
            for k in [1, 3, 5, 9, 10, 20] {
                let selected =
                    select(&db, &objective, &sims, SelectionOptions::new().with_max_size(k))
                        .expect("selection succeeds");

                assert!(selected.len() <= k);
                assert_eq!(selected.len(), k.min(db.len()));
                let unique: HashSet<_> = selected.iter().collect();
                assert_eq!(unique.len(), selected.len(), "no duplicates");
                assert!(selected.iter().all(|id| db.contains(id)));
            }
        }
    }

    #[test]
    fn test_unbounded_exhausts_database() {
        let db = sample_database();
        let objective = mixture(0.5);
        let sims = identity_sims(2);

        let report = GreedySelector::new(&db, &objective, &sims, SelectionOptions::new())
            .expect("valid inputs")
            .run()
            .expect("selection succeeds");

        assert_eq!(report.selected.len(), db.len());
        assert_eq!(report.stop_reason, StopReason::Exhausted);
    }

    #[test]
    fn test_exact_mode_matches_naive_greedy() {
        let db = sample_database();
        let sims = identity_sims(2);

        for weight in [0.3, 0.5, 0.8, 1.0] {
            let objective = mixture(weight);
            for k in [1, 2, 4, 6] {
                let lazy = select(&db, &objective, &sims, SelectionOptions::new().with_max_size(k))
                    .expect("selection succeeds");
                let naive = naive_greedy(&db, &objective, &sims, k);
                assert_eq!(lazy, naive, "weight {} k {}", weight, k);
            }
        }
    }

    #[test]
    fn test_exact_mode_is_deterministic() {
        let db = sample_database();
        let objective = mixture(0.5);
        let sims = identity_sims(2);
        let options = SelectionOptions::new().with_max_size(4);

        let first = select(&db, &objective, &sims, options.clone()).expect("first run");
        let second = select(&db, &objective, &sims, options).expect("second run");
        assert_eq!(first, second);
    }

    #[test]
    fn test_facility_location_picks_cluster_heads_first() {
        let db = sample_database();
        let objective = MixtureObjective::builder()
            .objective(FacilityLocation::new(), 1.0)
            .build()
            .expect("valid mixture");
        let sims = identity_sims(1);

        let selected = select(&db, &objective, &sims, SelectionOptions::new().with_max_size(1))
            .expect("selection succeeds");
        // seq1 and seq3 both cover four sequences; seq1 covers them best
        assert_eq!(selected, vec!["seq1".to_string()]);
    }

    #[test]
    fn test_lazy_evaluations_fewer_than_naive() {
        let db = sample_database();
        let objective = mixture(0.5);
        let sims = identity_sims(2);

        let report = GreedySelector::new(
            &db,
            &objective,
            &sims,
            SelectionOptions::new().with_max_size(5),
        )
        .expect("valid inputs")
        .run()
        .expect("selection succeeds");

        // naive greedy evaluates 10 + 9 + 8 + 7 + 6 candidates
        assert!(report.evaluations < 40, "evaluations: {}", report.evaluations);
        assert_eq!(report.stop_reason, StopReason::TargetReached);
    }

    #[test]
    fn test_approximate_mode_terminates_within_target() {
        let db = sample_database();
        let objective = mixture(0.5);
        let sims = identity_sims(2);

        for ratio in [1.05, 1.5, 3.0] {
            for k in [2, 5, 10] {
                let selected = select(
                    &db,
                    &objective,
                    &sims,
                    SelectionOptions::new()
                        .with_max_size(k)
                        .with_approx_ratio(ratio),
                )
                .expect("selection succeeds");
                assert_eq!(selected.len(), k.min(db.len()));
                let unique: HashSet<_> = selected.iter().collect();
                assert_eq!(unique.len(), selected.len());
            }
        }
    }

    #[test]
    fn test_approximate_mode_with_identical_gains_terminates() {
        // Four unrelated sequences all have the same gain every round.
        let mut db = Database::new();
        for id in ["a", "b", "c", "d"] {
            db.add_sequence(id);
        }
        let objective = mixture(1.0);
        let sims = identity_sims(2);

        let selected = select(
            &db,
            &objective,
            &sims,
            SelectionOptions::new().with_max_size(3).with_approx_ratio(1.5),
        )
        .expect("selection succeeds");
        assert_eq!(selected, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_single_sequence_database() {
        let mut db = Database::new();
        db.add_sequence("only");
        let objective = mixture(0.5);
        let sims = identity_sims(2);

        let selected = select(&db, &objective, &sims, SelectionOptions::new().with_max_size(3))
            .expect("selection succeeds");
        assert_eq!(selected, vec!["only"]);
    }

    #[test]
    fn test_empty_database_is_invalid_state() {
        let db = Database::new();
        let objective = mixture(0.5);
        let sims = identity_sims(2);

        let result = select(&db, &objective, &sims, SelectionOptions::new().with_max_size(3));
        assert!(matches!(result, Err(SelectionError::InvalidState(_))));
    }

    #[test]
    fn test_zero_target_is_invalid_configuration() {
        let db = sample_database();
        let objective = mixture(0.5);
        let sims = identity_sims(2);

        let result = select(&db, &objective, &sims, SelectionOptions::new().with_max_size(0));
        assert!(matches!(result, Err(SelectionError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_similarity_count_mismatch() {
        let db = sample_database();
        let objective = mixture(0.5);
        let sims = identity_sims(1);

        let result = select(&db, &objective, &sims, SelectionOptions::new().with_max_size(3));
        assert!(matches!(result, Err(SelectionError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_invalid_options_rejected() {
        assert!(SelectionOptions::new().with_approx_ratio(0.5).validate().is_err());
        assert!(SelectionOptions::new()
            .with_gain_denominator_offset(0.0)
            .validate()
            .is_err());
        assert!(SelectionOptions::new()
            .with_min_relative_gain(f64::NAN)
            .validate()
            .is_err());
        assert!(SelectionOptions::new().validate().is_ok());
    }

    #[test]
    fn test_min_relative_gain_defaults_from_ratio() {
        let options = SelectionOptions::new().with_approx_ratio(1.25);
        assert!((options.effective_min_relative_gain() - 0.25).abs() < 1e-12);

        let options = options.with_min_relative_gain(0.1);
        assert!((options.effective_min_relative_gain() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_cancelled_before_start_returns_empty() {
        let db = sample_database();
        let objective = mixture(0.5);
        let sims = identity_sims(2);
        let flag = CancellationFlag::new();
        flag.cancel();

        let report = GreedySelector::new(
            &db,
            &objective,
            &sims,
            SelectionOptions::new().with_cancellation(flag),
        )
        .expect("valid inputs")
        .run()
        .expect("run succeeds");

        assert!(report.selected.is_empty());
        assert_eq!(report.stop_reason, StopReason::Cancelled);
        assert_eq!(report.evaluations, 0);
    }

    #[test]
    fn test_expired_deadline_stops_run() {
        let db = sample_database();
        let objective = mixture(0.5);
        let sims = identity_sims(2);

        let report = GreedySelector::new(
            &db,
            &objective,
            &sims,
            SelectionOptions::new().with_deadline(Instant::now()),
        )
        .expect("valid inputs")
        .run()
        .expect("run succeeds");

        assert!(report.selected.is_empty());
        assert_eq!(report.stop_reason, StopReason::DeadlineExceeded);
    }

    #[test]
    fn test_huge_timeout_runs_without_deadline() {
        let db = sample_database();
        let objective = mixture(0.5);
        let sims = identity_sims(2);

        let options = SelectionOptions::new()
            .with_max_size(3)
            .with_timeout(Duration::from_secs(u64::MAX));
        assert!(options.deadline.is_none());

        let report = GreedySelector::new(&db, &objective, &sims, options)
            .expect("valid inputs")
            .run()
            .expect("run succeeds");
        assert_eq!(report.selected.len(), 3);
        assert_eq!(report.stop_reason, StopReason::TargetReached);
    }

    #[test]
    fn test_report_objective_value() {
        let db = sample_database();
        let objective = mixture(0.5);
        let sims = identity_sims(2);

        let report = GreedySelector::new(
            &db,
            &objective,
            &sims,
            SelectionOptions::new().with_max_size(3),
        )
        .expect("valid inputs")
        .run()
        .expect("run succeeds");

        let expected = objective
            .evaluate(&db, &report.selected, &sims)
            .expect("value");
        assert!((report.objective_value - expected).abs() < 1e-9);
        assert_eq!(report.database_size, 10);
        assert_eq!(report.objective, "mix-summaxacross(0.5)-sumsumwithin(0.5)");
    }
}
