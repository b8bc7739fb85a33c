//! Submodular set functions over a sequence [`Database`].
//!
//! Every objective implements the four-operation [`Objective`] contract:
//!
//! 1. **evaluate** - score of an explicit set of sequences
//! 2. **marginal_gain** - gain of adding one candidate to the set summarized by a state
//! 3. **initial_state** - state of the empty set
//! 4. **advance_state** - state after adding one candidate
//!
//! States are advanced functionally: `advance_state` borrows the current
//! state and returns a new one, so speculative evaluations never alias.
//!
//! Two objectives ship with the crate:
//!
//! - [`FacilityLocation`] (`summaxacross`) rewards coverage of the database
//! - [`Redundancy`] (`sumsumwithin`) penalizes near-duplicate picks
//!
//! They are combined through a [`MixtureObjective`]. Objectives with
//! different state types are stored behind [`DynObjective`], a type-erased
//! adapter; any caller type implementing [`Objective`] can join a mixture.
//!
//! # Usage
//!
//! ```rust,ignore
//! use seqpicker::objective::{FacilityLocation, MixtureObjective, Redundancy};
//!
//! let mixture = MixtureObjective::builder()
//!     .objective(FacilityLocation::new(), 0.5)
//!     .objective(Redundancy::new(), 0.5)
//!     .build()?;
//! assert_eq!(mixture.name(), "mix-summaxacross(0.5)-sumsumwithin(0.5)");
//! ```

pub mod facility;
pub mod mixture;
pub mod redundancy;
pub mod registry;

use std::any::Any;

use crate::error::SelectionError;
use crate::identity::{Database, SequenceId, SimilarityFunction};

pub use facility::{CoverageState, FacilityLocation};
pub use mixture::{MixtureBuilder, MixtureObjective, MixtureState};
pub use redundancy::{Redundancy, RedundancyState};
pub use registry::{BuiltinObjective, ObjectiveRegistry};

/// A submodular set function with an incremental state.
pub trait Objective: Send + Sync {
    /// Summary of the selected set that makes `marginal_gain` cheap.
    type State: Clone + Send + Sync + 'static;

    /// Short identifier used in mixture names and reports.
    fn name(&self) -> &str;

    /// Scores an explicit set of sequences.
    fn evaluate(&self, db: &Database, ids: &[SequenceId], sim: &dyn SimilarityFunction) -> f64;

    /// Gain of adding `candidate` to the set summarized by `state`.
    fn marginal_gain(
        &self,
        db: &Database,
        candidate: &str,
        sim: &dyn SimilarityFunction,
        state: &Self::State,
    ) -> f64;

    /// State of the empty set.
    fn initial_state(&self, db: &Database, sim: &dyn SimilarityFunction) -> Self::State;

    /// Returns the state after adding `candidate`. `state` is left untouched.
    fn advance_state(
        &self,
        db: &Database,
        candidate: &str,
        sim: &dyn SimilarityFunction,
        state: &Self::State,
    ) -> Self::State;

    /// State with every database member selected.
    fn full_state(&self, db: &Database, sim: &dyn SimilarityFunction) -> Self::State {
        db.ids().fold(self.initial_state(db, sim), |state, id| {
            self.advance_state(db, id, sim, &state)
        })
    }
}

/// Opaque per-objective state held by a mixture.
pub type ObjectiveState = Box<dyn Any + Send + Sync>;

/// Object-safe view of an [`Objective`] with its state type erased.
pub trait DynObjective: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, db: &Database, ids: &[SequenceId], sim: &dyn SimilarityFunction) -> f64;

    fn marginal_gain(
        &self,
        db: &Database,
        candidate: &str,
        sim: &dyn SimilarityFunction,
        state: &ObjectiveState,
    ) -> Result<f64, SelectionError>;

    fn initial_state(&self, db: &Database, sim: &dyn SimilarityFunction) -> ObjectiveState;

    fn advance_state(
        &self,
        db: &Database,
        candidate: &str,
        sim: &dyn SimilarityFunction,
        state: &ObjectiveState,
    ) -> Result<ObjectiveState, SelectionError>;
}

/// Adapter that erases the state type of an [`Objective`].
struct Erased<O>(O);

impl<O: Objective> Erased<O> {
    fn downcast<'s>(&self, state: &'s ObjectiveState) -> Result<&'s O::State, SelectionError> {
        state
            .downcast_ref::<O::State>()
            .ok_or_else(|| SelectionError::StateMismatch {
                objective: self.0.name().to_string(),
            })
    }
}

impl<O: Objective> DynObjective for Erased<O> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn evaluate(&self, db: &Database, ids: &[SequenceId], sim: &dyn SimilarityFunction) -> f64 {
        self.0.evaluate(db, ids, sim)
    }

    fn marginal_gain(
        &self,
        db: &Database,
        candidate: &str,
        sim: &dyn SimilarityFunction,
        state: &ObjectiveState,
    ) -> Result<f64, SelectionError> {
        let state = self.downcast(state)?;
        Ok(self.0.marginal_gain(db, candidate, sim, state))
    }

    fn initial_state(&self, db: &Database, sim: &dyn SimilarityFunction) -> ObjectiveState {
        Box::new(self.0.initial_state(db, sim))
    }

    fn advance_state(
        &self,
        db: &Database,
        candidate: &str,
        sim: &dyn SimilarityFunction,
        state: &ObjectiveState,
    ) -> Result<ObjectiveState, SelectionError> {
        let state = self.downcast(state)?;
        Ok(Box::new(self.0.advance_state(db, candidate, sim, state)))
    }
}

/// Boxes an objective for use in a [`MixtureObjective`].
pub fn boxed<O>(objective: O) -> Box<dyn DynObjective>
where
    O: Objective + 'static,
{
    Box::new(Erased(objective))
}
