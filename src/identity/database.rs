//! In-memory similarity database built from pairwise identity rows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::similarity::PLACEHOLDER_LOG10_E;

/// Opaque sequence identifier, unique key into a [`Database`].
pub type SequenceId = String;

/// A directed similarity edge from a query sequence to a target sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborRecord {
    /// Log10 e-value of the alignment. Identity tables store a placeholder.
    pub log10_e: f64,
    /// Percent identity, 0.0 to 100.0.
    pub pct_identity: f64,
}

impl NeighborRecord {
    /// Creates a record with the placeholder e-value.
    pub fn new(pct_identity: f64) -> Self {
        Self {
            log10_e: PLACEHOLDER_LOG10_E,
            pct_identity,
        }
    }
}

/// Outgoing and incoming edges of a single sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceEntry {
    /// Edges where this sequence is the query, keyed by target.
    pub neighbors: BTreeMap<SequenceId, NeighborRecord>,
    /// Edges where this sequence is the target, keyed by query.
    pub in_neighbors: BTreeMap<SequenceId, NeighborRecord>,
}

/// Mapping from sequence ID to its neighbor relations.
///
/// Every recorded edge `(a, b)` is stored twice: as `neighbors[a][b]` and as
/// `in_neighbors[b][a]`, both holding the same record. Every sequence that
/// appears in any edge is a key, even without a self-loop. Iteration is in
/// lexicographic ID order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    entries: BTreeMap<SequenceId, SequenceEntry>,
}

impl Database {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sequence with no edges. Existing entries are left untouched.
    pub fn add_sequence(&mut self, id: impl Into<SequenceId>) {
        self.entries.entry(id.into()).or_default();
    }

    /// Records a directed edge from `query` to `target`.
    pub fn insert_edge(&mut self, query: &str, target: &str, record: NeighborRecord) {
        self.add_sequence(query);
        self.add_sequence(target);

        if let Some(entry) = self.entries.get_mut(query) {
            entry.neighbors.insert(target.to_string(), record);
        }
        if let Some(entry) = self.entries.get_mut(target) {
            entry.in_neighbors.insert(query.to_string(), record);
        }
    }

    /// Records the edge in both directions with the same record.
    pub fn insert_symmetric(&mut self, a: &str, b: &str, record: NeighborRecord) {
        self.insert_edge(a, b, record);
        if a != b {
            self.insert_edge(b, a, record);
        }
    }

    /// Number of sequences.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the database holds no sequences.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `id` is a key.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Looks up the entry for `id`.
    pub fn get(&self, id: &str) -> Option<&SequenceEntry> {
        self.entries.get(id)
    }

    /// Iterates over all sequence IDs in lexicographic order.
    pub fn ids(&self) -> impl Iterator<Item = &SequenceId> {
        self.entries.keys()
    }

    /// Iterates over all entries in lexicographic ID order.
    pub fn iter(&self) -> impl Iterator<Item = (&SequenceId, &SequenceEntry)> {
        self.entries.iter()
    }

    /// The directed edge from `query` to `target`, if recorded.
    pub fn neighbor(&self, query: &str, target: &str) -> Option<&NeighborRecord> {
        self.entries.get(query)?.neighbors.get(target)
    }

    /// Edges where `id` is the query. Empty for unknown IDs.
    pub fn neighbors_of(&self, id: &str) -> impl Iterator<Item = (&SequenceId, &NeighborRecord)> {
        self.entries
            .get(id)
            .into_iter()
            .flat_map(|entry| entry.neighbors.iter())
    }

    /// Edges where `id` is the target. Empty for unknown IDs.
    pub fn in_neighbors_of(
        &self,
        id: &str,
    ) -> impl Iterator<Item = (&SequenceId, &NeighborRecord)> {
        self.entries
            .get(id)
            .into_iter()
            .flat_map(|entry| entry.in_neighbors.iter())
    }

    /// Total number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.entries.values().map(|e| e.neighbors.len()).sum()
    }
}
