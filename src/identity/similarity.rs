//! Similarity functions mapping a neighbor record to a score in `[0, 1]`.

use super::database::NeighborRecord;

/// E-value placeholder stored with every parsed identity record.
///
/// Identity tables carry no e-values, so records are tagged with this fixed
/// value and similarity functions are expected to ignore it.
pub const PLACEHOLDER_LOG10_E: f64 = -100.0;

/// Normalizes a raw `(log10 e-value, percent identity)` pair into a score.
///
/// Implemented for any `Fn(f64, f64) -> f64`, so plain functions such as
/// [`fraction_identity`] and closures can be passed wherever a similarity
/// function is expected.
pub trait SimilarityFunction: Send + Sync {
    /// Scores a raw pair. `log10_e` is carried for future use.
    fn score(&self, log10_e: f64, pct_identity: f64) -> f64;

    /// Scores a stored neighbor record.
    fn score_record(&self, record: &NeighborRecord) -> f64 {
        self.score(record.log10_e, record.pct_identity)
    }
}

impl<F> SimilarityFunction for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn score(&self, log10_e: f64, pct_identity: f64) -> f64 {
        self(log10_e, pct_identity)
    }
}

/// Fraction of identical residues: `pct_identity / 100`.
///
/// The e-value argument is ignored.
pub fn fraction_identity(_log10_e: f64, pct_identity: f64) -> f64 {
    pct_identity / 100.0
}
