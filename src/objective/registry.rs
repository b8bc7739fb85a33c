//! Named constructors for objectives.
//!
//! The registry knows the built-in objectives and accepts caller-supplied
//! constructors for anything else implementing [`Objective`](super::Objective).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SelectionError;

use super::{boxed, DynObjective, FacilityLocation, MixtureObjective, Redundancy};

/// Objectives shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinObjective {
    /// Coverage reward (`summaxacross`).
    FacilityLocation,
    /// Near-duplicate penalty (`sumsumwithin`).
    Redundancy,
}

impl BuiltinObjective {
    /// All built-in objectives.
    pub fn all() -> &'static [BuiltinObjective] {
        &[BuiltinObjective::FacilityLocation, BuiltinObjective::Redundancy]
    }

    /// Canonical name, as reported by the objective itself.
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinObjective::FacilityLocation => "summaxacross",
            BuiltinObjective::Redundancy => "sumsumwithin",
        }
    }

    /// Creates a boxed instance.
    pub fn create(&self) -> Box<dyn DynObjective> {
        match self {
            BuiltinObjective::FacilityLocation => boxed(FacilityLocation::new()),
            BuiltinObjective::Redundancy => boxed(Redundancy::new()),
        }
    }

    /// Facility location weighted by `weight`, redundancy by `1 - weight`.
    pub fn default_mixture(weight: f64) -> Result<MixtureObjective, SelectionError> {
        MixtureObjective::new(
            vec![
                BuiltinObjective::FacilityLocation.create(),
                BuiltinObjective::Redundancy.create(),
            ],
            vec![weight, 1.0 - weight],
        )
    }
}

impl fmt::Display for BuiltinObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BuiltinObjective {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summaxacross" | "facility-location" | "facility_location" => {
                Ok(BuiltinObjective::FacilityLocation)
            }
            "sumsumwithin" | "redundancy" => Ok(BuiltinObjective::Redundancy),
            other => Err(SelectionError::InvalidConfiguration(format!(
                "unknown objective '{}'",
                other
            ))),
        }
    }
}

type Constructor = Box<dyn Fn() -> Box<dyn DynObjective> + Send + Sync>;

/// Name-indexed objective constructors.
pub struct ObjectiveRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl Default for ObjectiveRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ObjectiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectiveRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl ObjectiveRegistry {
    /// Creates a registry with no entries.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Creates a registry holding every [`BuiltinObjective`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for builtin in BuiltinObjective::all() {
            let builtin = *builtin;
            registry.register(builtin.name(), move || builtin.create());
        }
        registry
    }

    /// Registers (or replaces) a constructor under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn DynObjective> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
    }

    /// Creates the objective registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::InvalidConfiguration` for unknown names.
    pub fn create(&self, name: &str) -> Result<Box<dyn DynObjective>, SelectionError> {
        self.constructors
            .get(name)
            .map(|constructor| constructor())
            .ok_or_else(|| {
                SelectionError::InvalidConfiguration(format!(
                    "unknown objective '{}' (known: {})",
                    name,
                    self.names().join(", ")
                ))
            })
    }

    /// Builds a mixture from `(name, weight)` pairs.
    pub fn mixture(&self, parts: &[(&str, f64)]) -> Result<MixtureObjective, SelectionError> {
        let objectives = parts
            .iter()
            .map(|(name, _)| self.create(name))
            .collect::<Result<Vec<_>, _>>()?;
        let weights = parts.iter().map(|(_, weight)| *weight).collect();
        MixtureObjective::new(objectives, weights)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }
}
