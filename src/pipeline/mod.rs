//! Selection pipeline.
//!
//! # Pipeline Flow
//!
//! 1. **Configuration**: [`SelectionConfig`] is loaded from YAML, environment
//!    variables and command-line flags, in that order of precedence
//! 2. **Parsing**: The identity table is read into a [`Database`](crate::identity::Database)
//! 3. **Objective**: The default mixture of facility location and redundancy is built
//! 4. **Selection**: Lazy greedy selection produces an ordered representative list
//! 5. **Reporting**: A [`SelectionReport`](crate::selection::SelectionReport) summarizes the run
//!
//! # Example
//!
//! ```rust,ignore
//! use seqpicker::pipeline::{SelectionConfig, SelectionRunner};
//!
//! let config = SelectionConfig::new().with_max_size(50).with_mixture_weight(0.8);
//! let runner = SelectionRunner::new(config)?;
//! let report = runner.run("identities.txt")?;
//! seqpicker::export::write_representatives(&report.selected, "reps.txt")?;
//! ```

pub mod config;
pub mod runner;

pub use config::{ConfigError, SelectionConfig, DEFAULT_MIXTURE_WEIGHT};
pub use runner::{ComponentValue, Evaluation, RunError, SelectionRunner};
