//! seqpicker: representative sequence selection.
//!
//! This library picks an ordered subset of sequences that covers a
//! collection well while avoiding near-duplicates, by lazily maximizing a
//! weighted mixture of submodular objectives over pairwise identities.

pub mod cli;
pub mod error;
pub mod export;
pub mod identity;
pub mod objective;
pub mod pipeline;
pub mod selection;

// Re-export commonly used types
pub use error::{ExportError, IdentityError, SelectionError};
pub use identity::{Database, IdentityTableParser, SequenceId, SimilarityFunction};
pub use objective::{MixtureObjective, Objective};
pub use selection::{select, GreedySelector, SelectionOptions, SelectionReport, StopReason};
