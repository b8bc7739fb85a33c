//! Parser for whitespace-separated pairwise identity tables.
//!
//! The expected layout matches `esl-alipid` output:
//!
//! ```text
//! # seqname1   seqname2   %id    nid  denomid  %match  nmatch  denommatch
//! seq1/1-62    seq2/1-62  100.0  62   62       100.0   62      62
//! ```
//!
//! Only the first three columns are used. Lines starting with `#` and blank
//! lines are skipped. Rows that cannot be parsed are logged and skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::IdentityError;

use super::database::{Database, NeighborRecord, SequenceId};

/// One usable row of an identity table.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityRow {
    pub seq1: SequenceId,
    pub seq2: SequenceId,
    pub pct_identity: f64,
}

impl IdentityRow {
    /// Creates a row, stripping coordinate suffixes from both names.
    pub fn new(seq1: &str, seq2: &str, pct_identity: f64) -> Self {
        Self {
            seq1: strip_coordinates(seq1).to_string(),
            seq2: strip_coordinates(seq2).to_string(),
            pct_identity,
        }
    }
}

/// Drops the `/start-end` suffix alignment tools append to sequence names.
pub fn strip_coordinates(name: &str) -> &str {
    name.split('/').next().unwrap_or(name)
}

/// Builds a [`Database`] from identity rows.
#[derive(Debug, Clone)]
pub struct IdentityTableParser {
    /// Record every row in both directions.
    symmetric: bool,
}

impl Default for IdentityTableParser {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityTableParser {
    /// Creates a parser that records rows symmetrically.
    pub fn new() -> Self {
        Self { symmetric: true }
    }

    /// Sets whether a row `(a, b)` also records the reverse edge `(b, a)`.
    ///
    /// Percent identity is symmetric and identity tables list each unordered
    /// pair once, so symmetric recording is the default.
    pub fn symmetric(mut self, symmetric: bool) -> Self {
        self.symmetric = symmetric;
        self
    }

    /// Returns whether rows are recorded in both directions.
    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// Builds a database from already parsed rows.
    pub fn build<I>(&self, rows: I) -> Database
    where
        I: IntoIterator<Item = IdentityRow>,
    {
        let mut db = Database::new();
        for row in rows {
            let record = NeighborRecord::new(row.pct_identity);
            if self.symmetric {
                db.insert_symmetric(&row.seq1, &row.seq2, record);
            } else {
                db.insert_edge(&row.seq1, &row.seq2, record);
            }
        }
        db
    }

    /// Parses an identity table from disk.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InputNotFound` if the file does not exist and
    /// `IdentityError::InputEmpty` if it contains no usable rows.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Database, IdentityError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Reading pairwise identity data");

        if !path.exists() {
            return Err(IdentityError::InputNotFound(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => IdentityError::InputNotFound(path.to_path_buf()),
            _ => IdentityError::Io(e),
        })?;

        self.parse_reader(BufReader::new(file), path)
    }

    /// Parses an identity table from any buffered reader.
    ///
    /// `source` is only used for error messages and logging.
    pub fn parse_reader<R: BufRead>(
        &self,
        reader: R,
        source: &Path,
    ) -> Result<Database, IdentityError> {
        let mut rows = Vec::new();
        let mut skipped = 0usize;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            match parse_line(&line) {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => {}
                Err(reason) => {
                    skipped += 1;
                    warn!(line = index + 1, %reason, "Skipping malformed identity row");
                }
            }
        }

        if rows.is_empty() {
            return Err(IdentityError::InputEmpty(source.to_path_buf()));
        }

        let row_count = rows.len();
        let db = self.build(rows);
        debug!(
            rows = row_count,
            skipped,
            sequences = db.len(),
            edges = db.edge_count(),
            "Built identity database"
        );
        Ok(db)
    }
}

/// Parses one table line. `Ok(None)` for blank and comment lines.
fn parse_line(line: &str) -> Result<Option<IdentityRow>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut columns = trimmed.split_whitespace();
    let (Some(seq1), Some(seq2), Some(pct)) = (columns.next(), columns.next(), columns.next())
    else {
        return Err(format!("expected at least 3 columns, got '{}'", trimmed));
    };

    let pct_identity: f64 = pct
        .parse()
        .map_err(|_| format!("percent identity '{}' is not a number", pct))?;

    if !(0.0..=100.0).contains(&pct_identity) {
        return Err(format!(
            "percent identity {} is outside 0-100",
            pct_identity
        ));
    }

    let row = IdentityRow::new(seq1, seq2, pct_identity);
    if row.seq1.is_empty() || row.seq2.is_empty() {
        return Err("empty sequence name".to_string());
    }

    Ok(Some(row))
}
