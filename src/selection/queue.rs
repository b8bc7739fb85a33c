//! Lazy priority queue of candidate upper bounds.
//!
//! A min-heap of `(key, id)` where `key = -bound` and `bound` is an upper
//! bound on the candidate's current marginal gain. Under submodularity a
//! gain computed in an earlier round stays a valid upper bound, so entries
//! are only tightened when popped.
//!
//! Ties on key pop the lexicographically smallest ID first.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::identity::SequenceId;

/// Key given to every candidate before its first exact evaluation.
///
/// Negative infinity sorts ahead of any real key, which forces every
/// candidate's first pop to trigger an exact recomputation.
pub const SENTINEL_KEY: f64 = f64::NEG_INFINITY;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    key: OrderedFloat<f64>,
    id: SequenceId,
    // Acceptance round the bound was computed in. Not reached by ordering
    // since IDs are unique within the heap.
    round: Option<usize>,
}

/// A candidate removed from the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedCandidate {
    pub id: SequenceId,
    /// Upper bound on the candidate's gain. Infinite for unevaluated candidates.
    pub bound: f64,
    /// Round the bound was computed in, `None` if never evaluated.
    pub round: Option<usize>,
}

impl QueuedCandidate {
    /// True if the bound was computed against the state of `round`.
    pub fn is_exact_for(&self, round: usize) -> bool {
        self.round == Some(round)
    }
}

/// Min-heap of `(key, id)` pairs with a stale-bound guard.
#[derive(Debug, Clone, Default)]
pub struct LazyQueue {
    heap: BinaryHeap<Reverse<Entry>>,
}

impl LazyQueue {
    /// Creates a queue with every ID keyed by [`SENTINEL_KEY`].
    pub fn seeded<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = SequenceId>,
    {
        let heap = ids
            .into_iter()
            .map(|id| {
                Reverse(Entry {
                    key: OrderedFloat(SENTINEL_KEY),
                    id,
                    round: None,
                })
            })
            .collect();
        Self { heap }
    }

    /// Number of queued candidates.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Removes the candidate with the largest upper bound.
    pub fn pop(&mut self) -> Option<QueuedCandidate> {
        self.heap.pop().map(|Reverse(entry)| QueuedCandidate {
            bound: -entry.key.into_inner(),
            id: entry.id,
            round: entry.round,
        })
    }

    /// Largest upper bound among queued candidates.
    pub fn peek_bound(&self) -> Option<f64> {
        self.peek().map(|(bound, _)| bound)
    }

    /// Bound and ID of the candidate that would pop next.
    pub fn peek(&self) -> Option<(f64, &str)> {
        self.heap
            .peek()
            .map(|Reverse(entry)| (-entry.key.into_inner(), entry.id.as_str()))
    }

    /// Puts a candidate back with an exact gain computed in `round`.
    pub fn requeue(&mut self, id: SequenceId, gain: f64, round: usize) {
        self.heap.push(Reverse(Entry {
            key: OrderedFloat(-gain),
            id,
            round: Some(round),
        }));
    }
}
