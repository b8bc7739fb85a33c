//! End-to-end selection runs.
//!
//! [`SelectionRunner`] ties the stages together: parse the identity table,
//! build the default mixture, run lazy greedy selection, and report.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{IdentityError, SelectionError};
use crate::identity::{fraction_identity, Database, IdentityTableParser, SequenceId, SimilarityFunction};
use crate::objective::{BuiltinObjective, MixtureObjective};
use crate::selection::{CancellationFlag, GreedySelector, SelectionReport, StopReason};

use super::config::{ConfigError, SelectionConfig};

/// Errors that can occur during a selection run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The identity table could not be read.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Objective construction or selection failed.
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    /// The run configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An ID to evaluate is not in the database.
    #[error("Unknown sequence ID: {0}")]
    UnknownSequence(SequenceId),
}

/// Score of an existing ID list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub objective: String,
    pub value: f64,
    /// Unweighted value of each component objective.
    pub components: Vec<ComponentValue>,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentValue {
    pub name: String,
    pub weight: f64,
    pub value: f64,
}

/// Runs selections with a fixed configuration.
#[derive(Debug, Clone)]
pub struct SelectionRunner {
    config: SelectionConfig,
    cancellation: Option<CancellationFlag>,
}

impl SelectionRunner {
    /// Creates a runner after validating `config`.
    pub fn new(config: SelectionConfig) -> Result<Self, RunError> {
        config.validate()?;
        Ok(Self {
            config,
            cancellation: None,
        })
    }

    /// Attaches a flag that stops the run early when raised.
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Parses an identity table according to the configured direction mode.
    pub fn load_database(&self, path: impl AsRef<Path>) -> Result<Database, RunError> {
        let parser = IdentityTableParser::new().symmetric(self.config.symmetric_identities);
        Ok(parser.parse_file(path)?)
    }

    /// Facility location weighted `w`, redundancy weighted `1 - w`.
    pub fn build_objective(&self) -> Result<MixtureObjective, RunError> {
        Ok(BuiltinObjective::default_mixture(self.config.mixture_weight)?)
    }

    /// Parses `path` and selects representatives from it.
    pub fn run(&self, path: impl AsRef<Path>) -> Result<SelectionReport, RunError> {
        let db = self.load_database(path)?;
        self.run_on(&db)
    }

    /// Selects representatives from an already loaded database.
    pub fn run_on(&self, db: &Database) -> Result<SelectionReport, RunError> {
        let objective = self.build_objective()?;
        let sims = similarity_functions(&objective);

        let mut options = self.config.to_options();
        if let Some(flag) = &self.cancellation {
            options = options.with_cancellation(flag.clone());
        }

        let report = GreedySelector::new(db, &objective, &sims, options)?.run()?;
        match report.stop_reason {
            StopReason::Cancelled | StopReason::DeadlineExceeded => warn!(
                selected = report.selected.len(),
                stop_reason = ?report.stop_reason,
                "Selection interrupted; returning partial result"
            ),
            StopReason::TargetReached | StopReason::Exhausted => {}
        }
        Ok(report)
    }

    /// Scores `ids` under the configured mixture and each of its components.
    ///
    /// # Errors
    ///
    /// Returns `RunError::UnknownSequence` for an ID missing from `db`.
    pub fn evaluate(&self, db: &Database, ids: &[SequenceId]) -> Result<Evaluation, RunError> {
        if let Some(unknown) = ids.iter().find(|id| !db.contains(id)) {
            return Err(RunError::UnknownSequence(unknown.clone()));
        }

        let objective = self.build_objective()?;
        let sims = similarity_functions(&objective);

        let value = objective.evaluate(db, ids, &sims)?;
        let components = objective
            .component_values(db, ids, &sims)?
            .into_iter()
            .zip(objective.weights())
            .map(|((name, value), weight)| ComponentValue {
                name,
                weight,
                value,
            })
            .collect();

        info!(objective = %objective.name(), size = ids.len(), value, "Evaluated selection");

        Ok(Evaluation {
            objective: objective.name().to_string(),
            value,
            components,
            size: ids.len(),
        })
    }
}

/// Fraction identity for every component of `objective`.
fn similarity_functions(objective: &MixtureObjective) -> Vec<&'static dyn SimilarityFunction> {
    let sim: &'static dyn SimilarityFunction = &fraction_identity;
    vec![sim; objective.len()]
}
