//! Weighted composition of objectives.
//!
//! A mixture evaluates to `sum_i w_i * f_i(S)` and keeps one state per
//! component, advanced in lockstep. Weights are not required to sum to 1.

use tracing::debug;

use crate::error::SelectionError;
use crate::identity::{Database, SequenceId, SimilarityFunction};

use super::{boxed, DynObjective, Objective, ObjectiveState};

/// One weighted component of a mixture.
struct Component {
    objective: Box<dyn DynObjective>,
    weight: f64,
}

/// Weighted sum of objectives sharing the four-operation contract.
pub struct MixtureObjective {
    components: Vec<Component>,
    name: String,
}

/// Per-component states of a mixture, in component order.
pub struct MixtureState {
    states: Vec<ObjectiveState>,
}

impl MixtureState {
    /// Number of component states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// State of component `index`, downcast to its concrete type.
    pub fn component<S: 'static>(&self, index: usize) -> Option<&S> {
        self.states.get(index)?.downcast_ref::<S>()
    }
}

impl std::fmt::Debug for MixtureObjective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixtureObjective")
            .field("name", &self.name)
            .finish()
    }
}

impl std::fmt::Debug for MixtureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixtureState")
            .field("components", &self.states.len())
            .finish()
    }
}

impl MixtureObjective {
    /// Creates a mixture from parallel lists of objectives and weights.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::InvalidConfiguration` if the lists differ in
    /// length, are empty, or a weight is not finite.
    pub fn new(
        objectives: Vec<Box<dyn DynObjective>>,
        weights: Vec<f64>,
    ) -> Result<Self, SelectionError> {
        if objectives.len() != weights.len() {
            return Err(SelectionError::InvalidConfiguration(format!(
                "number of objectives ({}) must match number of weights ({})",
                objectives.len(),
                weights.len()
            )));
        }

        if objectives.is_empty() {
            return Err(SelectionError::InvalidConfiguration(
                "a mixture needs at least one objective".to_string(),
            ));
        }

        if let Some(weight) = weights.iter().find(|w| !w.is_finite()) {
            return Err(SelectionError::InvalidConfiguration(format!(
                "mixture weight {} is not finite",
                weight
            )));
        }

        let components: Vec<Component> = objectives
            .into_iter()
            .zip(weights)
            .map(|(objective, weight)| Component { objective, weight })
            .collect();

        let name = Self::generate_name(&components);
        debug!(%name, "Created mixture objective");

        Ok(Self { components, name })
    }

    /// Starts a builder.
    pub fn builder() -> MixtureBuilder {
        MixtureBuilder::default()
    }

    fn generate_name(components: &[Component]) -> String {
        let parts: Vec<String> = components
            .iter()
            .map(|c| format!("{}({:?})", c.objective.name(), c.weight))
            .collect();
        format!("mix-{}", parts.join("-"))
    }

    /// Descriptive name, e.g. `mix-summaxacross(0.5)-sumsumwithin(0.5)`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of component objectives.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component weights in order.
    pub fn weights(&self) -> Vec<f64> {
        self.components.iter().map(|c| c.weight).collect()
    }

    /// Component names in order.
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.objective.name()).collect()
    }

    /// Checks that one similarity function is supplied per component.
    pub fn check_similarities(
        &self,
        sims: &[&dyn SimilarityFunction],
    ) -> Result<(), SelectionError> {
        if sims.len() != self.components.len() {
            return Err(SelectionError::InvalidConfiguration(format!(
                "number of similarity functions ({}) must match number of objectives ({})",
                sims.len(),
                self.components.len()
            )));
        }
        Ok(())
    }

    /// Unweighted value of each component on `ids`, paired with its name.
    pub fn component_values(
        &self,
        db: &Database,
        ids: &[SequenceId],
        sims: &[&dyn SimilarityFunction],
    ) -> Result<Vec<(String, f64)>, SelectionError> {
        self.check_similarities(sims)?;
        Ok(self
            .components
            .iter()
            .zip(sims)
            .map(|(c, sim)| (c.objective.name().to_string(), c.objective.evaluate(db, ids, *sim)))
            .collect())
    }

    /// Weighted objective value of `ids`.
    pub fn evaluate(
        &self,
        db: &Database,
        ids: &[SequenceId],
        sims: &[&dyn SimilarityFunction],
    ) -> Result<f64, SelectionError> {
        self.check_similarities(sims)?;
        Ok(self
            .components
            .iter()
            .zip(sims)
            .map(|(c, sim)| c.weight * c.objective.evaluate(db, ids, *sim))
            .sum())
    }

    /// Weighted marginal gain of adding `candidate`.
    pub fn marginal_gain(
        &self,
        db: &Database,
        candidate: &str,
        sims: &[&dyn SimilarityFunction],
        state: &MixtureState,
    ) -> Result<f64, SelectionError> {
        self.check_similarities(sims)?;
        self.check_state(state)?;

        let mut total = 0.0;
        for ((c, sim), component_state) in self.components.iter().zip(sims).zip(&state.states) {
            total += c.weight * c.objective.marginal_gain(db, candidate, *sim, component_state)?;
        }
        Ok(total)
    }

    /// State of the empty set for every component.
    pub fn initial_state(
        &self,
        db: &Database,
        sims: &[&dyn SimilarityFunction],
    ) -> Result<MixtureState, SelectionError> {
        self.check_similarities(sims)?;
        let states = self
            .components
            .iter()
            .zip(sims)
            .map(|(c, sim)| c.objective.initial_state(db, *sim))
            .collect();
        Ok(MixtureState { states })
    }

    /// Advances every component state by `candidate`. `state` is left untouched.
    pub fn advance_state(
        &self,
        db: &Database,
        candidate: &str,
        sims: &[&dyn SimilarityFunction],
        state: &MixtureState,
    ) -> Result<MixtureState, SelectionError> {
        self.check_similarities(sims)?;
        self.check_state(state)?;

        let states = self
            .components
            .iter()
            .zip(sims)
            .zip(&state.states)
            .map(|((c, sim), component_state)| {
                c.objective.advance_state(db, candidate, *sim, component_state)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MixtureState { states })
    }

    fn check_state(&self, state: &MixtureState) -> Result<(), SelectionError> {
        if state.states.len() != self.components.len() {
            return Err(SelectionError::InvalidState(format!(
                "mixture state has {} components, objective has {}",
                state.states.len(),
                self.components.len()
            )));
        }
        Ok(())
    }
}

/// Builder for a [`MixtureObjective`].
#[derive(Default)]
pub struct MixtureBuilder {
    objectives: Vec<Box<dyn DynObjective>>,
    weights: Vec<f64>,
}

impl MixtureBuilder {
    /// Adds a concrete objective with its weight.
    pub fn objective<O>(self, objective: O, weight: f64) -> Self
    where
        O: Objective + 'static,
    {
        self.boxed(boxed(objective), weight)
    }

    /// Adds an already boxed objective with its weight.
    pub fn boxed(mut self, objective: Box<dyn DynObjective>, weight: f64) -> Self {
        self.objectives.push(objective);
        self.weights.push(weight);
        self
    }

    pub fn build(self) -> Result<MixtureObjective, SelectionError> {
        MixtureObjective::new(self.objectives, self.weights)
    }
}
