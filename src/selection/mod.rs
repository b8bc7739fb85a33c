//! Representative selection.
//!
//! [`GreedySelector`] maximizes a [`MixtureObjective`](crate::objective::MixtureObjective)
//! with accelerated greedy selection over a [`LazyQueue`] of upper bounds.
//! Runs can be bounded by a target size, a deadline or a shared
//! [`CancellationFlag`]; interrupted runs return the partial selection.

pub mod cancel;
pub mod greedy;
pub mod queue;

pub use cancel::CancellationFlag;
pub use greedy::{
    select, GreedySelector, SelectionOptions, SelectionReport, StopReason,
    DEFAULT_APPROX_RATIO, DEFAULT_GAIN_DENOMINATOR_OFFSET,
};
pub use queue::{LazyQueue, QueuedCandidate, SENTINEL_KEY};
