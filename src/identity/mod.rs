//! Pairwise identity data consumed by the selection engine.
//!
//! An external alignment tool produces a table of pairwise percent
//! identities. This module turns that table into a [`Database`] of directed
//! neighbor records and provides the [`SimilarityFunction`] used by every
//! objective to normalize a record into a score in `[0, 1]`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use seqpicker::identity::{fraction_identity, IdentityTableParser};
//!
//! let db = IdentityTableParser::new().parse_file("identities.txt")?;
//! let record = db.neighbor("seq1", "seq2").unwrap();
//! assert_eq!(fraction_identity(record.log10_e, record.pct_identity), 1.0);
//! ```

pub mod database;
pub mod parser;
pub mod similarity;

pub use database::{Database, NeighborRecord, SequenceEntry, SequenceId};
pub use parser::{strip_coordinates, IdentityRow, IdentityTableParser};
pub use similarity::{fraction_identity, SimilarityFunction, PLACEHOLDER_LOG10_E};
